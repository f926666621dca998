//! Exit conditions for open positions
//!
//! Take-profit, stop-loss and trailing-stop rules, their persistence, and the
//! monitor that evaluates them against current prices.

pub mod engine;
mod monitor;
mod targets;
mod types;

pub use engine::{check, exit_advisory};
pub use monitor::{close_triggered, ExitMonitor, PositionMark, ScanReport, SkippedPosition};
pub use targets::{ExitTargetBook, TargetStore};
pub use types::{ExitTarget, TriggerEvent, TriggerKind};
