//! Position records and the ledger that owns them

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Outcome held by a position
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    /// Profits when the YES price rises
    Yes,
    /// Profits when the YES price falls
    No,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Yes => f.write_str("Yes"),
            Side::No => f.write_str("No"),
        }
    }
}

impl FromStr for Side {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "yes" | "y" => Ok(Side::Yes),
            "no" | "n" => Ok(Side::No),
            other => Err(format!("invalid side `{other}`, expected yes or no")),
        }
    }
}

/// Lifecycle state of a position
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PositionStatus {
    Open,
    Closed,
    Resolved,
}

impl PositionStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, PositionStatus::Open)
    }
}

impl fmt::Display for PositionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            PositionStatus::Open => "open",
            PositionStatus::Closed => "closed",
            PositionStatus::Resolved => "resolved",
        };
        f.write_str(s)
    }
}

/// One paper trade
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Position {
    /// Ledger-assigned identifier, never reused
    pub id: u64,
    /// Market slug
    pub market: String,
    /// Market question as displayed
    pub title: String,
    pub side: Side,
    /// Dollars committed
    pub amount: Decimal,
    /// Cost basis as a percentage
    pub entry_price: Decimal,
    /// `amount / entry_price * 100`, fixed at creation
    pub shares: Decimal,
    pub status: PositionStatus,
    /// Trade thesis
    #[serde(default)]
    pub reason: String,
    pub opened_at: DateTime<Utc>,
    #[serde(default)]
    pub exit_price: Option<Decimal>,
    #[serde(default)]
    pub pnl: Option<Decimal>,
    #[serde(default)]
    pub pnl_pct: Option<Decimal>,
    #[serde(default)]
    pub closed_at: Option<DateTime<Utc>>,
    /// Set when the market resolved
    #[serde(default)]
    pub won: Option<bool>,
}

impl Position {
    pub fn is_open(&self) -> bool {
        self.status == PositionStatus::Open
    }

    /// P&L if the YES price were `price`
    ///
    /// Yes positions gain as the price rises, No positions as it falls.
    pub fn pnl_at(&self, price: Decimal) -> Decimal {
        let move_pts = match self.side {
            Side::Yes => price - self.entry_price,
            Side::No => self.entry_price - price,
        };
        move_pts * self.shares / Decimal::ONE_HUNDRED
    }

    /// P&L as a percentage of the committed amount
    pub fn pnl_pct_of(&self, pnl: Decimal) -> Decimal {
        if self.amount.is_zero() {
            return Decimal::ZERO;
        }
        pnl / self.amount * Decimal::ONE_HUNDRED
    }
}

/// Ledger errors
#[derive(Debug, Error, PartialEq)]
pub enum LedgerError {
    #[error("position #{0} not found")]
    NotFound(u64),
    #[error("position #{id} is already {status}")]
    NotOpen { id: u64, status: PositionStatus },
    #[error("amount must be positive, got {0}")]
    InvalidAmount(Decimal),
    #[error("price must be within (0, 100], got {0}")]
    InvalidEntryPrice(Decimal),
    #[error("exit price must be within [0, 100], got {0}")]
    InvalidExitPrice(Decimal),
    #[error("market identifier is empty")]
    EmptyMarket,
}

/// A validated request to open a position
#[derive(Debug, Clone)]
pub struct OpenRequest {
    pub market: String,
    pub title: String,
    pub side: Side,
    pub amount: Decimal,
    pub entry_price: Decimal,
    pub reason: String,
}

impl OpenRequest {
    fn validate(&self) -> Result<(), LedgerError> {
        if self.market.trim().is_empty() {
            return Err(LedgerError::EmptyMarket);
        }
        if self.amount <= Decimal::ZERO {
            return Err(LedgerError::InvalidAmount(self.amount));
        }
        if self.entry_price <= Decimal::ZERO || self.entry_price > Decimal::ONE_HUNDRED {
            return Err(LedgerError::InvalidEntryPrice(self.entry_price));
        }
        // shares, and P&L over a full 100-point move, must stay representable
        let fits = self
            .amount
            .checked_div(self.entry_price)
            .and_then(|s| s.checked_mul(dec!(10000)))
            .is_some();
        if !fits {
            return Err(LedgerError::InvalidAmount(self.amount));
        }
        Ok(())
    }
}

/// YES price a market settles at when `side` won or lost
fn settlement_price(side: Side, won: bool) -> Decimal {
    let yes_won = match side {
        Side::Yes => won,
        Side::No => !won,
    };
    if yes_won {
        Decimal::ONE_HUNDRED
    } else {
        Decimal::ZERO
    }
}

/// Ordered collection of every paper trade
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Ledger {
    /// Next id to hand out; persisted so ids survive removals
    #[serde(default)]
    next_id: u64,
    #[serde(default)]
    positions: Vec<Position>,
}

impl Ledger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a new open position
    pub fn open(
        &mut self,
        request: OpenRequest,
        now: DateTime<Utc>,
    ) -> Result<&Position, LedgerError> {
        request.validate()?;

        let max_seen = self.positions.iter().map(|p| p.id).max().unwrap_or(0);
        let id = self.next_id.max(max_seen + 1);
        self.next_id = id + 1;

        let shares = request.amount / request.entry_price * Decimal::ONE_HUNDRED;
        let title = if request.title.trim().is_empty() {
            request.market.clone()
        } else {
            request.title
        };

        self.positions.push(Position {
            id,
            market: request.market,
            title,
            side: request.side,
            amount: request.amount,
            entry_price: request.entry_price,
            shares,
            status: PositionStatus::Open,
            reason: request.reason,
            opened_at: now,
            exit_price: None,
            pnl: None,
            pnl_pct: None,
            closed_at: None,
            won: None,
        });

        tracing::info!(id, amount = %request.amount, "Position opened");
        Ok(&self.positions[self.positions.len() - 1])
    }

    /// Close an open position at `exit_price`
    pub fn close(
        &mut self,
        id: u64,
        exit_price: Decimal,
        now: DateTime<Utc>,
    ) -> Result<&Position, LedgerError> {
        if exit_price < Decimal::ZERO || exit_price > Decimal::ONE_HUNDRED {
            return Err(LedgerError::InvalidExitPrice(exit_price));
        }

        let position = self.open_mut(id)?;
        let pnl = position.pnl_at(exit_price);
        position.pnl_pct = Some(position.pnl_pct_of(pnl));
        position.pnl = Some(pnl);
        position.exit_price = Some(exit_price);
        position.closed_at = Some(now);
        position.status = PositionStatus::Closed;

        tracing::info!(id, exit_price = %exit_price, pnl = %pnl, "Position closed");
        Ok(&*position)
    }

    /// Settle an open position when its market resolves
    ///
    /// `won` is whether the position's own side won. The position is marked
    /// at the settlement YES price, 100 if YES won and 0 otherwise, so a
    /// resolve agrees with a close at that price.
    pub fn resolve(
        &mut self,
        id: u64,
        won: bool,
        now: DateTime<Utc>,
    ) -> Result<&Position, LedgerError> {
        let position = self.open_mut(id)?;
        let settlement = settlement_price(position.side, won);
        let pnl = position.pnl_at(settlement);
        position.pnl_pct = Some(position.pnl_pct_of(pnl));
        position.pnl = Some(pnl);
        position.exit_price = Some(settlement);
        position.won = Some(won);
        position.closed_at = Some(now);
        position.status = PositionStatus::Resolved;

        tracing::info!(id, won, pnl = %pnl, "Position resolved");
        Ok(&*position)
    }

    fn open_mut(&mut self, id: u64) -> Result<&mut Position, LedgerError> {
        let position = self
            .positions
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or(LedgerError::NotFound(id))?;
        if position.status.is_terminal() {
            return Err(LedgerError::NotOpen {
                id,
                status: position.status,
            });
        }
        Ok(position)
    }

    pub fn get(&self, id: u64) -> Option<&Position> {
        self.positions.iter().find(|p| p.id == id)
    }

    /// All positions in creation order
    pub fn positions(&self) -> &[Position] {
        &self.positions
    }

    pub fn open_positions(&self) -> impl Iterator<Item = &Position> {
        self.positions.iter().filter(|p| p.is_open())
    }

    pub fn open_count(&self) -> usize {
        self.open_positions().count()
    }

    /// Realized P&L of positions closed or resolved on `date` (UTC)
    pub fn daily_pnl(&self, date: NaiveDate) -> Decimal {
        self.positions
            .iter()
            .filter(|p| p.status.is_terminal())
            .filter(|p| p.closed_at.map(|t| t.date_naive()) == Some(date))
            .filter_map(|p| p.pnl)
            .sum()
    }

    /// Realized P&L over the whole history
    pub fn realized_pnl(&self) -> Decimal {
        self.positions
            .iter()
            .filter(|p| p.status.is_terminal())
            .filter_map(|p| p.pnl)
            .sum()
    }

    /// Dollars currently committed to open positions
    pub fn invested(&self) -> Decimal {
        self.open_positions().map(|p| p.amount).sum()
    }

    /// Uncommitted cash: starting balance plus realized P&L minus open stakes
    pub fn bankroll(&self, starting_balance: Decimal) -> Decimal {
        starting_balance + self.realized_pnl() - self.invested()
    }

    /// Portfolio summary
    pub fn status(&self, starting_balance: Decimal) -> PortfolioStatus {
        let terminal: Vec<&Position> = self
            .positions
            .iter()
            .filter(|p| p.status.is_terminal())
            .collect();
        let wins = terminal
            .iter()
            .filter(|p| p.pnl.unwrap_or_default() > Decimal::ZERO)
            .count();
        let losses = terminal.len() - wins;
        let win_rate = if terminal.is_empty() {
            Decimal::ZERO
        } else {
            Decimal::from(wins) / Decimal::from(terminal.len()) * Decimal::ONE_HUNDRED
        };

        PortfolioStatus {
            starting_balance,
            current_balance: self.bankroll(starting_balance),
            total_invested: self.invested(),
            realized_pnl: self.realized_pnl(),
            open_positions: self.open_count(),
            closed_trades: terminal.len(),
            wins,
            losses,
            win_rate,
        }
    }
}

/// Aggregate portfolio figures
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PortfolioStatus {
    pub starting_balance: Decimal,
    pub current_balance: Decimal,
    pub total_invested: Decimal,
    pub realized_pnl: Decimal,
    pub open_positions: usize,
    pub closed_trades: usize,
    pub wins: usize,
    pub losses: usize,
    /// Percentage of terminal trades with positive P&L
    pub win_rate: Decimal,
}
