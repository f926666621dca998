//! Exit target and trigger types

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Exit rules attached to one open position
///
/// All prices are YES-price percentages. The trailing stop is a distance in
/// percentage points below the highest price seen since the target was set.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExitTarget {
    #[serde(default)]
    pub take_profit: Option<Decimal>,
    #[serde(default)]
    pub stop_loss: Option<Decimal>,
    #[serde(default)]
    pub trailing_stop: Option<Decimal>,
    /// Highest observed price, tracked only while a trailing stop is set
    #[serde(default)]
    pub peak_price: Option<Decimal>,
    #[serde(default)]
    pub set_at: Option<DateTime<Utc>>,
}

impl ExitTarget {
    pub fn new(
        take_profit: Option<Decimal>,
        stop_loss: Option<Decimal>,
        trailing_stop: Option<Decimal>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            take_profit,
            stop_loss,
            trailing_stop,
            peak_price: None,
            set_at: Some(now),
        }
    }

    /// True when at least one rule is set
    pub fn is_armed(&self) -> bool {
        self.take_profit.is_some() || self.stop_loss.is_some() || self.trailing_stop.is_some()
    }

    /// Current trailing stop level, once a peak has been observed
    pub fn trailing_level(&self) -> Option<Decimal> {
        Some(self.peak_price? - self.trailing_stop?)
    }
}

/// Which exit rule fired
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TriggerKind {
    TrailingStop,
    TakeProfit,
    StopLoss,
}

impl TriggerKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TriggerKind::TrailingStop => "trailing_stop",
            TriggerKind::TakeProfit => "take_profit",
            TriggerKind::StopLoss => "stop_loss",
        }
    }
}

impl fmt::Display for TriggerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A fired exit rule
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TriggerEvent {
    pub position_id: u64,
    #[serde(rename = "type")]
    pub kind: TriggerKind,
    /// Level that was crossed
    pub trigger_price: Decimal,
    pub current_price: Decimal,
    /// Unrealized P&L at `current_price`
    pub pnl: Decimal,
}

impl fmt::Display for TriggerEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "#{} {} hit at {}% (level {}%, P&L ${})",
            self.position_id,
            self.kind,
            self.current_price.round_dp(1),
            self.trigger_price.round_dp(1),
            self.pnl.round_dp(2),
        )
    }
}
