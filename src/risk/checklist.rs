//! Pre-trade checklist
//!
//! Behavioural advisories raised before a trade is opened. None of them
//! block; they are printed next to the gate decision.

use crate::ledger::{PortfolioStatus, Side};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Serialize;
use std::fmt;

/// Buying YES above this price follows the crowd
pub const CONSENSUS_YES_ABOVE: Decimal = dec!(80);
/// Buying NO below this YES price follows the crowd
pub const CONSENSUS_NO_BELOW: Decimal = dec!(20);
/// Trade size, in percent of the portfolio, that draws a warning
pub const MAX_TRADE_PCT: Decimal = dec!(10);
/// Trade size, in percent of the portfolio, that is critical
pub const CRITICAL_TRADE_PCT: Decimal = dec!(20);
pub const MIN_THESIS_WORDS: usize = 10;
/// Terminal trades needed before the win rate is judged
pub const MIN_TRADES_FOR_WIN_RATE: usize = 3;
pub const WIN_RATE_FLOOR: Decimal = dec!(40);

/// How loudly an advisory should be shown
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Warning,
    Critical,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Warning => f.write_str("WARNING"),
            Severity::Critical => f.write_str("CRITICAL"),
        }
    }
}

/// One checklist finding
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Advisory {
    /// Buying the side the market already favours
    ConfirmationBias { side: Side, entry_price: Decimal },
    /// Trade is a large share of the portfolio
    PositionSize {
        amount: Decimal,
        portfolio_value: Decimal,
        pct: Decimal,
        max_pct: Decimal,
        severity: Severity,
    },
    /// Thesis too short to state an edge
    ThesisClarity { words: usize, min_words: usize },
    /// Poor win rate over the settled trades
    RecentPerformance {
        win_rate: Decimal,
        trades: usize,
        severity: Severity,
    },
}

impl Advisory {
    pub fn severity(&self) -> Severity {
        match self {
            Advisory::PositionSize { severity, .. }
            | Advisory::RecentPerformance { severity, .. } => *severity,
            Advisory::ConfirmationBias { .. } | Advisory::ThesisClarity { .. } => {
                Severity::Warning
            }
        }
    }
}

impl fmt::Display for Advisory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Advisory::ConfirmationBias { side, entry_price } => write!(
                f,
                "Confirmation bias: buying {side} at {}% agrees with the market. What is the edge?",
                entry_price.round_dp(1)
            ),
            Advisory::PositionSize {
                amount,
                pct,
                max_pct,
                ..
            } => write!(
                f,
                "Position size: ${} is {}% of portfolio (recommended max {}%)",
                amount.round_dp(2),
                pct.round_dp(1),
                max_pct
            ),
            Advisory::ThesisClarity { words, min_words } => write!(
                f,
                "Thesis clarity: {words} word(s), state the edge in at least {min_words}"
            ),
            Advisory::RecentPerformance { win_rate, trades, .. } => write!(
                f,
                "Recent performance: win rate {}% over {trades} trades",
                win_rate.round_dp(1)
            ),
        }
    }
}

/// Everything the checklist looks at
#[derive(Debug, Clone, Copy)]
pub struct ChecklistInput<'a> {
    pub side: Side,
    /// YES price in percent
    pub entry_price: Decimal,
    pub amount: Decimal,
    pub portfolio_value: Decimal,
    pub thesis: &'a str,
    pub closed_trades: usize,
    /// Percent of settled trades that made money
    pub win_rate: Decimal,
}

impl<'a> ChecklistInput<'a> {
    /// Portfolio value and track record taken from the ledger status
    pub fn with_status(
        side: Side,
        entry_price: Decimal,
        amount: Decimal,
        thesis: &'a str,
        status: &PortfolioStatus,
    ) -> Self {
        Self {
            side,
            entry_price,
            amount,
            portfolio_value: status.current_balance,
            thesis,
            closed_trades: status.closed_trades,
            win_rate: status.win_rate,
        }
    }
}

/// Run every check, in a fixed order
pub fn run_checklist(input: &ChecklistInput<'_>) -> Vec<Advisory> {
    [
        confirmation_bias(input),
        position_size(input),
        thesis_clarity(input),
        recent_performance(input),
    ]
    .into_iter()
    .flatten()
    .collect()
}

fn confirmation_bias(input: &ChecklistInput<'_>) -> Option<Advisory> {
    let crowded = match input.side {
        Side::Yes => input.entry_price > CONSENSUS_YES_ABOVE,
        Side::No => input.entry_price < CONSENSUS_NO_BELOW,
    };
    crowded.then_some(Advisory::ConfirmationBias {
        side: input.side,
        entry_price: input.entry_price,
    })
}

fn position_size(input: &ChecklistInput<'_>) -> Option<Advisory> {
    // nothing to compare against; the gate reports a bad bankroll
    if input.portfolio_value <= Decimal::ZERO || input.amount <= Decimal::ZERO {
        return None;
    }
    let pct = input
        .amount
        .checked_div(input.portfolio_value)?
        .checked_mul(Decimal::ONE_HUNDRED)?;
    if pct <= MAX_TRADE_PCT {
        return None;
    }
    let severity = if pct >= CRITICAL_TRADE_PCT {
        Severity::Critical
    } else {
        Severity::Warning
    };
    Some(Advisory::PositionSize {
        amount: input.amount,
        portfolio_value: input.portfolio_value,
        pct,
        max_pct: MAX_TRADE_PCT,
        severity,
    })
}

fn thesis_clarity(input: &ChecklistInput<'_>) -> Option<Advisory> {
    let words = input.thesis.split_whitespace().count();
    (words < MIN_THESIS_WORDS).then_some(Advisory::ThesisClarity {
        words,
        min_words: MIN_THESIS_WORDS,
    })
}

fn recent_performance(input: &ChecklistInput<'_>) -> Option<Advisory> {
    if input.closed_trades < MIN_TRADES_FOR_WIN_RATE {
        return None;
    }
    let severity = if input.win_rate.is_zero() {
        Severity::Critical
    } else if input.win_rate < WIN_RATE_FLOOR {
        Severity::Warning
    } else {
        return None;
    };
    Some(Advisory::RecentPerformance {
        win_rate: input.win_rate,
        trades: input.closed_trades,
        severity,
    })
}
