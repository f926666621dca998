//! End-to-end integration tests

use async_trait::async_trait;
use chrono::Utc;
use poly_guard::config::{Config, ConfigError};
use poly_guard::exit::{close_triggered, ExitMonitor, ExitTarget, TargetStore, TriggerKind};
use poly_guard::ledger::{Ledger, LedgerStore, OpenRequest, PositionStatus, Side};
use poly_guard::market::PriceSource;
use poly_guard::narrative::{NarrativeClassifier, NarrativeTable, NarrativeTag};
use poly_guard::risk::{
    ExposureSnapshot, ExposureSummary, LimitStatus, ProposedTrade, RiskDecision, RiskGate,
    RiskViolation,
};
use poly_guard::telemetry::LogFormat;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::collections::HashMap;
use tempfile::tempdir;

const EXAMPLE_CONFIG: &str = include_str!("../../config.toml.example");

struct FixedPrices(HashMap<String, Decimal>);

#[async_trait]
impl PriceSource for FixedPrices {
    async fn current_price(&self, market: &str) -> Option<Decimal> {
        self.0.get(market).copied()
    }
}

fn classifier(config: &Config) -> NarrativeClassifier {
    NarrativeClassifier::new(NarrativeTable::from_config(&config.narratives))
}

fn gate(config: &Config, ledger: &Ledger, proposed: &ProposedTrade) -> RiskDecision {
    let classifier = classifier(config);
    let snapshot = ExposureSnapshot::compute(ledger.positions(), &classifier);
    RiskGate::new(&config.risk, &classifier).evaluate(
        proposed,
        &snapshot,
        ledger.open_count(),
        ledger.daily_pnl(Utc::now().date_naive()),
        ledger.bankroll(config.portfolio.starting_balance),
    )
}

fn proposal(market: &str, title: &str, amount: Decimal) -> ProposedTrade {
    ProposedTrade {
        market: market.to_string(),
        title: title.to_string(),
        amount,
        entry_price: dec!(50),
    }
}

fn buy(ledger: &mut Ledger, proposed: &ProposedTrade) -> u64 {
    ledger
        .open(
            OpenRequest {
                market: proposed.market.clone(),
                title: proposed.title.clone(),
                side: Side::Yes,
                amount: proposed.amount,
                entry_price: proposed.entry_price,
                reason: "e2e".to_string(),
            },
            Utc::now(),
        )
        .unwrap()
        .id
}

#[test]
fn test_example_config_loads() {
    let config = Config::from_toml(EXAMPLE_CONFIG).unwrap();

    assert_eq!(config.risk.max_position_size, dec!(100));
    assert_eq!(config.risk.max_open_positions, 5);
    assert_eq!(config.risk.kelly_fraction, dec!(0.25));
    assert_eq!(config.portfolio.starting_balance, dec!(10000));
    assert!(!config.monitor.auto_close);
    assert_eq!(config.telemetry.log_format, LogFormat::Pretty);
    assert_eq!(config.telemetry.metrics_port, Some(9090));

    let table = NarrativeTable::from_config(&config.narratives);
    assert_eq!(table.limit_for(NarrativeTag::Crypto, dec!(400)), dec!(300));
    assert_eq!(table.limit_for(NarrativeTag::Geopolitics, dec!(400)), dec!(400));
    assert!(table
        .get(NarrativeTag::ElectionsUs)
        .unwrap()
        .keywords
        .iter()
        .any(|k| k == "governor"));
}

#[test]
fn test_invalid_config_rejected() {
    let err = Config::from_toml("[risk]\nkelly_fraction = 1.5\n").unwrap_err();
    assert!(matches!(
        err,
        ConfigError::Invalid {
            key: "risk.kelly_fraction",
            ..
        }
    ));

    let err = Config::from_toml("[risk]\nmax_open_positions = \"many\"\n").unwrap_err();
    assert!(matches!(err, ConfigError::Parse(_)));

    let err = Config::from_toml("[narratives.crypto]\nmax_exposure = 0\n").unwrap_err();
    assert!(matches!(err, ConfigError::Invalid { .. }));
}

#[tokio::test]
async fn test_trade_lifecycle() {
    let config = Config::from_toml(EXAMPLE_CONFIG).unwrap();
    let dir = tempdir().unwrap();
    let ledger_store = LedgerStore::new(dir.path().join("trades.json"));
    let target_store = TargetStore::new(dir.path().join("targets.json"));

    let mut ledger = ledger_store.load().unwrap();

    // crypto is capped at $300 by the example config
    let trades = [
        proposal("btc-150k", "Will Bitcoin hit $150k in 2026?", dec!(100)),
        proposal("eth-10k", "Will Ethereum hit $10k?", dec!(100)),
        proposal("crypto-cap", "Total crypto market cap above $5T?", dec!(100)),
    ];
    let mut ids = Vec::new();
    for trade in &trades {
        let decision = gate(&config, &ledger, trade);
        assert!(decision.admitted, "{:?}", decision.lines());
        ids.push(buy(&mut ledger, trade));
    }

    let fourth = proposal("btc-dom", "Will BTC dominance rise above 60%?", dec!(50));
    let decision = gate(&config, &ledger, &fourth);
    assert!(!decision.admitted);
    assert!(decision.violations().any(|v| matches!(
        v,
        RiskViolation::NarrativeExposure {
            narrative: NarrativeTag::Crypto,
            would_be,
            ..
        } if *would_be == dec!(350)
    )));

    let summary = ExposureSummary::build(
        ledger.positions(),
        &classifier(&config),
        config.risk.max_narrative_exposure,
    );
    assert_eq!(summary.total, dec!(300));
    assert_eq!(summary.narratives.len(), 1);
    assert_eq!(summary.narratives[0].status, LimitStatus::Approaching);
    assert_eq!(summary.narratives[0].position_ids, ids);
    ledger_store.save(&ledger).unwrap();

    let mut book = target_store.load().unwrap();
    book.set(
        ids[0],
        ExitTarget::new(Some(dec!(70)), Some(dec!(35)), None, Utc::now()),
    );
    target_store.save(&book).unwrap();

    let prices = FixedPrices(HashMap::from([
        ("btc-150k".to_string(), dec!(72)),
        ("eth-10k".to_string(), dec!(45)),
    ]));
    let monitor = ExitMonitor::new(prices);

    let mut ledger = ledger_store.load().unwrap();
    let mut book = target_store.load().unwrap();
    let report = monitor.scan(&ledger, &mut book).await;

    assert_eq!(report.marks.len(), 2);
    assert_eq!(report.skipped.len(), 1);
    assert_eq!(report.skipped[0].market, "crypto-cap");
    assert_eq!(report.triggers.len(), 1);
    assert_eq!(report.triggers[0].kind, TriggerKind::TakeProfit);

    let closed = close_triggered(&mut ledger, &report, Utc::now());
    assert_eq!(closed, vec![ids[0]]);
    book.prune(&ledger);
    ledger_store.save(&ledger).unwrap();
    target_store.save(&book).unwrap();

    let ledger = ledger_store.load().unwrap();
    let position = ledger.get(ids[0]).unwrap();
    assert_eq!(position.status, PositionStatus::Closed);
    assert_eq!(position.exit_price, Some(dec!(72)));
    // 200 shares up 22 points
    assert_eq!(position.pnl, Some(dec!(44)));
    assert_eq!(ledger.realized_pnl(), dec!(44));
    assert!(target_store.load().unwrap().is_empty());

    // the freed crypto budget admits the fourth trade
    let decision = gate(&config, &ledger, &fourth);
    assert!(decision.admitted, "{:?}", decision.lines());
}
