//! poly-guard: Risk gate and exit monitor for Polymarket paper trading
//!
//! This library provides the core components for:
//! - A paper-trading position ledger with JSON persistence
//! - Keyword-based narrative classification of markets
//! - Exposure aggregation by market and narrative
//! - A pre-trade risk gate with hard limits and advisory warnings
//! - Take-profit, stop-loss and trailing-stop exit monitoring
//! - Kelly criterion sizing advice
//! - Market prices via the Gamma API

pub mod cli;
pub mod config;
pub mod exit;
pub mod ledger;
pub mod market;
pub mod narrative;
pub mod risk;
pub mod store;
pub mod telemetry;
