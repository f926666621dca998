//! Market price lookup
//!
//! Current YES prices for open positions, fetched from Polymarket's Gamma API

mod gamma;

pub use gamma::{GammaClient, GammaConfig, GAMMA_API_URL};

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::Serialize;

/// Snapshot of a market as reported by Gamma
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MarketQuote {
    /// Market slug
    pub slug: String,
    /// Market question
    pub question: String,
    /// YES price as a percentage, if the market reports one
    pub yes_price: Option<Decimal>,
    pub active: bool,
    pub closed: bool,
}

/// Trait for current-price lookups
///
/// Implementations return `None` on any failure (timeout, unknown market,
/// malformed payload) so that callers can skip the market and carry on.
#[async_trait]
pub trait PriceSource: Send + Sync {
    /// Current YES price of `market` as a percentage
    async fn current_price(&self, market: &str) -> Option<Decimal>;
}
