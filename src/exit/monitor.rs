//! Exit monitor
//!
//! Prices every open position, runs the exit engine over the ones with a
//! target and reports the result. Prices are all resolved before any rule is
//! evaluated.

use super::{engine, ExitTargetBook, TriggerEvent};
use crate::ledger::{Ledger, Position, Side};
use crate::market::PriceSource;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::{BTreeSet, HashMap};

/// Mark-to-market view of one open position
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PositionMark {
    pub position_id: u64,
    pub market: String,
    pub title: String,
    pub side: Side,
    pub amount: Decimal,
    pub entry_price: Decimal,
    pub current_price: Decimal,
    pub unrealized_pnl: Decimal,
    pub pnl_pct: Decimal,
    /// Trailing stop level after this pass, when one is set
    pub trailing_level: Option<Decimal>,
    pub has_target: bool,
}

impl PositionMark {
    fn new(position: &Position, current_price: Decimal) -> Self {
        let unrealized_pnl = position.pnl_at(current_price);
        Self {
            position_id: position.id,
            market: position.market.clone(),
            title: position.title.clone(),
            side: position.side,
            amount: position.amount,
            entry_price: position.entry_price,
            current_price,
            unrealized_pnl,
            pnl_pct: position.pnl_pct_of(unrealized_pnl),
            trailing_level: None,
            has_target: false,
        }
    }
}

/// Open position left out of a pass because no price was available
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkippedPosition {
    pub position_id: u64,
    pub market: String,
}

/// Result of one monitoring pass
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ScanReport {
    pub triggers: Vec<TriggerEvent>,
    pub skipped: Vec<SkippedPosition>,
    pub marks: Vec<PositionMark>,
}

impl ScanReport {
    /// Unrealized P&L over the priced positions only
    pub fn unrealized_pnl(&self) -> Decimal {
        self.marks.iter().map(|m| m.unrealized_pnl).sum()
    }

    /// Distinct positions with at least one trigger, in first-trigger order
    pub fn triggered_positions(&self) -> Vec<u64> {
        let mut seen = BTreeSet::new();
        self.triggers
            .iter()
            .filter(|t| seen.insert(t.position_id))
            .map(|t| t.position_id)
            .collect()
    }
}

/// Runs exit checks against live prices
pub struct ExitMonitor<P> {
    prices: P,
}

impl<P: PriceSource> ExitMonitor<P> {
    pub fn new(prices: P) -> Self {
        Self { prices }
    }

    /// One pass over the open positions of `ledger`
    ///
    /// Updates trailing-stop peaks in `targets`; the caller persists them.
    pub async fn scan(&self, ledger: &Ledger, targets: &mut ExitTargetBook) -> ScanReport {
        let markets: BTreeSet<&str> = ledger.open_positions().map(|p| p.market.as_str()).collect();

        let mut prices: HashMap<&str, Option<Decimal>> = HashMap::with_capacity(markets.len());
        for market in markets {
            let price = self.prices.current_price(market).await;
            prices.insert(market, price);
        }

        let mut report = ScanReport::default();

        for position in ledger.open_positions() {
            let price = prices.get(position.market.as_str()).copied().flatten();
            let Some(current) = price.filter(|p| valid_price(*p)) else {
                tracing::warn!(
                    position_id = position.id,
                    market = %position.market,
                    price = ?price,
                    "No usable price, skipping position"
                );
                report.skipped.push(SkippedPosition {
                    position_id: position.id,
                    market: position.market.clone(),
                });
                continue;
            };

            let mut mark = PositionMark::new(position, current);

            if let Some(target) = targets.get_mut(position.id) {
                report
                    .triggers
                    .extend(engine::check(position, target, Some(current)));
                mark.trailing_level = target.trailing_level();
                mark.has_target = true;
            }

            report.marks.push(mark);
        }

        tracing::info!(
            priced = report.marks.len(),
            skipped = report.skipped.len(),
            triggers = report.triggers.len(),
            "Exit scan complete"
        );

        report
    }
}

fn valid_price(price: Decimal) -> bool {
    (Decimal::ZERO..=Decimal::ONE_HUNDRED).contains(&price)
}

/// Close every triggered position at its observed price
///
/// A position the ledger refuses to close is logged and left open; the rest
/// are still closed. Returns the ids that were closed.
pub fn close_triggered(ledger: &mut Ledger, report: &ScanReport, now: DateTime<Utc>) -> Vec<u64> {
    let mut closed = Vec::new();

    for id in report.triggered_positions() {
        let Some(trigger) = report.triggers.iter().find(|t| t.position_id == id) else {
            continue;
        };
        match ledger.close(id, trigger.current_price, now) {
            Ok(position) => {
                tracing::info!(
                    position_id = id,
                    kind = %trigger.kind,
                    exit_price = %trigger.current_price,
                    pnl = ?position.pnl,
                    "Position closed by exit rule"
                );
                closed.push(id);
            }
            Err(e) => {
                tracing::warn!(
                    position_id = id,
                    kind = %trigger.kind,
                    error = %e,
                    "Failed to close triggered position"
                );
            }
        }
    }

    closed
}
