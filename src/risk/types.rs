//! Risk management types

use crate::narrative::NarrativeTag;
use rust_decimal::Decimal;
use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// A trade submitted for admission
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProposedTrade {
    /// Market slug
    pub market: String,
    /// Market question, used for narrative classification
    pub title: String,
    /// Dollars to commit
    pub amount: Decimal,
    /// Entry price as a percentage
    pub entry_price: Decimal,
}

/// A hard limit the proposed trade breaks
#[derive(Debug, Clone, PartialEq, Error, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RiskViolation {
    /// Non-positive trade amount
    #[error("Invalid trade amount ${amount}: must be positive")]
    InvalidAmount { amount: Decimal },
    /// Single trade larger than allowed
    #[error("Amount ${amount} exceeds max position size ${max}")]
    PositionTooLarge { amount: Decimal, max: Decimal },
    /// Too many positions already open
    #[error("Already at max positions ({open}/{max})")]
    MaxPositionsReached { open: usize, max: usize },
    /// Absolute daily loss limit hit
    #[error("Daily loss limit reached (${pnl}, limit -${limit})")]
    DailyLossReached { pnl: Decimal, limit: Decimal },
    /// Market concentration limit
    #[error("Market exposure for {market} would be ${would_be} (current ${current}, max ${max})")]
    MarketExposure {
        market: String,
        current: Decimal,
        would_be: Decimal,
        max: Decimal,
    },
    /// Narrative concentration limit
    #[error("Narrative exposure for {narrative} would be ${would_be} (current ${current}, max ${max})")]
    NarrativeExposure {
        narrative: NarrativeTag,
        current: Decimal,
        would_be: Decimal,
        max: Decimal,
    },
    /// Daily loss relative to bankroll
    #[error("Daily loss is {loss_pct}% of bankroll (max {max_pct}%)")]
    DailyLossPct { loss_pct: Decimal, max_pct: Decimal },
    /// Bankroll is zero or negative
    #[error("Invalid bankroll ${bankroll}: cannot evaluate daily loss percentage")]
    InvalidBankroll { bankroll: Decimal },
    /// A limit could not be evaluated because the numbers are out of range
    #[error("Cannot evaluate {check}: amount out of range")]
    Overflow { check: &'static str },
}

/// Limited-upside warning for high entry prices
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AsymmetricRisk {
    pub entry_price: Decimal,
    /// Gain in percent of stake if the price goes to 100
    pub upside_pct: Decimal,
    /// Loss in percent of stake if the price goes to 0
    pub downside_pct: Decimal,
    /// `upside_pct / 100`
    pub reward_to_risk: Decimal,
}

impl fmt::Display for AsymmetricRisk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Asymmetric risk: entry at {}% gives max upside +{}% vs max downside -{}% (risk/reward 1:{})",
            self.entry_price,
            self.upside_pct.round_dp(1),
            self.downside_pct.round_dp(1),
            self.reward_to_risk.round_dp(2),
        )
    }
}

/// One line of a gate decision
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "level", content = "detail", rename_all = "snake_case")]
pub enum RiskMessage {
    /// Blocks the trade
    Violation(RiskViolation),
    /// Informational, never blocks
    Warning(AsymmetricRisk),
    /// Emitted alone when nothing else was reported
    AllChecksPassed,
}

impl fmt::Display for RiskMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RiskMessage::Violation(v) => write!(f, "BLOCKED: {v}"),
            RiskMessage::Warning(w) => write!(f, "WARNING: {w}"),
            RiskMessage::AllChecksPassed => f.write_str("OK: all risk checks passed"),
        }
    }
}

/// Outcome of the admission gate
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RiskDecision {
    pub admitted: bool,
    pub messages: Vec<RiskMessage>,
}

impl RiskDecision {
    pub fn violations(&self) -> impl Iterator<Item = &RiskViolation> {
        self.messages.iter().filter_map(|m| match m {
            RiskMessage::Violation(v) => Some(v),
            _ => None,
        })
    }

    pub fn warnings(&self) -> impl Iterator<Item = &AsymmetricRisk> {
        self.messages.iter().filter_map(|m| match m {
            RiskMessage::Warning(w) => Some(w),
            _ => None,
        })
    }

    /// Rendered messages, in check order
    pub fn lines(&self) -> Vec<String> {
        self.messages.iter().map(ToString::to_string).collect()
    }
}
