//! Exit monitor against a scripted price source

use async_trait::async_trait;
use chrono::Utc;
use poly_guard::exit::{close_triggered, ExitMonitor, ExitTarget, ExitTargetBook, TriggerKind};
use poly_guard::ledger::{Ledger, OpenRequest, Side};
use poly_guard::market::PriceSource;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::collections::HashMap;
use std::sync::Mutex;

/// Serves a queue of prices per market, one per lookup
#[derive(Default)]
struct ScriptedPrices {
    prices: Mutex<HashMap<String, Vec<Option<Decimal>>>>,
}

impl ScriptedPrices {
    fn with(market: &str, prices: &[Option<Decimal>]) -> Self {
        let source = Self::default();
        source.push(market, prices);
        source
    }

    fn push(&self, market: &str, prices: &[Option<Decimal>]) {
        let mut queue: Vec<Option<Decimal>> = prices.to_vec();
        queue.reverse();
        self.prices
            .lock()
            .unwrap()
            .insert(market.to_string(), queue);
    }
}

#[async_trait]
impl PriceSource for ScriptedPrices {
    async fn current_price(&self, market: &str) -> Option<Decimal> {
        self.prices
            .lock()
            .unwrap()
            .get_mut(market)
            .and_then(|queue| queue.pop())
            .flatten()
    }
}

fn open(ledger: &mut Ledger, market: &str, side: Side, amount: Decimal, entry: Decimal) -> u64 {
    ledger
        .open(
            OpenRequest {
                market: market.to_string(),
                title: market.to_string(),
                side,
                amount,
                entry_price: entry,
                reason: String::new(),
            },
            Utc::now(),
        )
        .unwrap()
        .id
}

#[tokio::test]
async fn test_trailing_stop_over_several_passes() {
    let mut ledger = Ledger::new();
    let id = open(&mut ledger, "m", Side::Yes, dec!(100), dec!(50));
    let mut book = ExitTargetBook::new();
    book.set(id, ExitTarget::new(None, None, Some(dec!(5)), Utc::now()));

    let source = ScriptedPrices::with(
        "m",
        &[Some(dec!(70)), Some(dec!(90)), None, Some(dec!(86)), Some(dec!(84))],
    );
    let monitor = ExitMonitor::new(source);

    let mut trigger_counts = Vec::new();
    let mut skipped_counts = Vec::new();
    for _ in 0..5 {
        let report = monitor.scan(&ledger, &mut book).await;
        trigger_counts.push(report.triggers.len());
        skipped_counts.push(report.skipped.len());
    }

    assert_eq!(trigger_counts, vec![0, 0, 0, 0, 1]);
    assert_eq!(skipped_counts, vec![0, 0, 1, 0, 0]);
    assert_eq!(book.get(id).unwrap().peak_price, Some(dec!(90)));
}

#[tokio::test]
async fn test_one_lookup_per_market() {
    let mut ledger = Ledger::new();
    open(&mut ledger, "m", Side::Yes, dec!(10), dec!(50));
    open(&mut ledger, "m", Side::No, dec!(10), dec!(50));
    open(&mut ledger, "other", Side::Yes, dec!(10), dec!(50));

    let source = ScriptedPrices::with("m", &[Some(dec!(55))]);
    source.push("other", &[Some(dec!(20))]);
    let monitor = ExitMonitor::new(source);

    let report = monitor.scan(&ledger, &mut ExitTargetBook::new()).await;
    assert_eq!(report.marks.len(), 3);
    assert!(report.skipped.is_empty());

    // the Yes and No legs on "m" cancel out; "other" is down 30 points on 20 shares
    assert_eq!(report.unrealized_pnl(), dec!(-6));
}

#[tokio::test]
async fn test_unpriced_market_does_not_stop_the_batch() {
    let mut ledger = Ledger::new();
    let dead = open(&mut ledger, "dead", Side::Yes, dec!(10), dec!(50));
    let live = open(&mut ledger, "live", Side::Yes, dec!(10), dec!(50));
    let mut book = ExitTargetBook::new();
    book.set(dead, ExitTarget::new(None, Some(dec!(99)), None, Utc::now()));
    book.set(live, ExitTarget::new(Some(dec!(60)), None, None, Utc::now()));

    let monitor = ExitMonitor::new(ScriptedPrices::with("live", &[Some(dec!(61))]));
    let report = monitor.scan(&ledger, &mut book).await;

    assert_eq!(report.skipped.len(), 1);
    assert_eq!(report.skipped[0].position_id, dead);
    assert_eq!(report.triggers.len(), 1);
    assert_eq!(report.triggers[0].position_id, live);
    assert_eq!(report.triggers[0].kind, TriggerKind::TakeProfit);
}

#[tokio::test]
async fn test_closed_positions_are_not_scanned() {
    let mut ledger = Ledger::new();
    let id = open(&mut ledger, "m", Side::Yes, dec!(10), dec!(50));
    let mut book = ExitTargetBook::new();
    book.set(id, ExitTarget::new(None, Some(dec!(45)), None, Utc::now()));

    let monitor = ExitMonitor::new(ScriptedPrices::with("m", &[Some(dec!(40)), Some(dec!(30))]));
    let report = monitor.scan(&ledger, &mut book).await;
    assert_eq!(close_triggered(&mut ledger, &report, Utc::now()), vec![id]);

    let report = monitor.scan(&ledger, &mut book).await;
    assert!(report.marks.is_empty());
    assert!(report.triggers.is_empty());
    assert_eq!(book.prune(&ledger), vec![id.to_string()]);
}

#[tokio::test]
async fn test_out_of_range_price_does_not_move_the_peak() {
    let mut ledger = Ledger::new();
    let id = open(&mut ledger, "m", Side::Yes, dec!(10), dec!(50));
    let mut book = ExitTargetBook::new();
    book.set(id, ExitTarget::new(None, None, Some(dec!(5)), Utc::now()));

    let monitor = ExitMonitor::new(ScriptedPrices::with(
        "m",
        &[Some(dec!(250)), Some(dec!(70)), Some(dec!(64))],
    ));

    let report = monitor.scan(&ledger, &mut book).await;
    assert_eq!(report.skipped.len(), 1);
    assert!(report.marks.is_empty());
    assert_eq!(book.get(id).unwrap().peak_price, None);

    let report = monitor.scan(&ledger, &mut book).await;
    assert!(report.triggers.is_empty());
    assert_eq!(book.get(id).unwrap().peak_price, Some(dec!(70)));

    let report = monitor.scan(&ledger, &mut book).await;
    assert_eq!(report.triggers.len(), 1);
    assert_eq!(report.triggers[0].kind, TriggerKind::TrailingStop);
    assert_eq!(report.triggers[0].trigger_price, dec!(65));
}
