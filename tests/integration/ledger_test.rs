//! Ledger, target and tag persistence

use chrono::Utc;
use poly_guard::exit::{ExitTarget, ExitTargetBook, TargetStore};
use poly_guard::ledger::{Ledger, LedgerStore, OpenRequest, PositionStatus, Side};
use poly_guard::narrative::{NarrativeClassifier, NarrativeOverrides, NarrativeTag, OverrideStore};
use rust_decimal_macros::dec;
use tempfile::tempdir;

fn request(market: &str, amount: rust_decimal::Decimal) -> OpenRequest {
    OpenRequest {
        market: market.to_string(),
        title: String::new(),
        side: Side::Yes,
        amount,
        entry_price: dec!(40),
        reason: "thesis".to_string(),
    }
}

#[test]
fn test_ledger_survives_reload() {
    let dir = tempdir().unwrap();
    let store = LedgerStore::new(dir.path().join("nested").join("trades.json"));

    let mut ledger = store.load().unwrap();
    assert!(ledger.positions().is_empty());

    let first = ledger.open(request("a", dec!(40)), Utc::now()).unwrap().id;
    let second = ledger.open(request("b", dec!(20)), Utc::now()).unwrap().id;
    ledger.close(first, dec!(50), Utc::now()).unwrap();
    store.save(&ledger).unwrap();

    let mut reloaded = store.load().unwrap();
    assert_eq!(reloaded, ledger);
    assert_eq!(reloaded.get(first).unwrap().status, PositionStatus::Closed);
    assert_eq!(reloaded.get(first).unwrap().pnl, Some(dec!(10)));
    assert_eq!(reloaded.get(second).unwrap().title, "b");

    // ids keep increasing after a reload
    let third = reloaded.open(request("c", dec!(5)), Utc::now()).unwrap().id;
    assert!(third > second);
}

#[test]
fn test_corrupt_ledger_is_an_error() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("trades.json");
    std::fs::write(&path, "{ not json").unwrap();

    let store = LedgerStore::new(&path);
    let err = store.load().unwrap_err();
    assert!(err.to_string().contains("trades.json"));
}

#[test]
fn test_targets_survive_reload() {
    let dir = tempdir().unwrap();
    let store = TargetStore::new(dir.path().join("targets.json"));

    let mut book = ExitTargetBook::new();
    book.set(1, ExitTarget::new(Some(dec!(95)), Some(dec!(30)), Some(dec!(5)), Utc::now()));
    book.get_mut(1).unwrap().peak_price = Some(dec!(62.5));
    store.save(&book).unwrap();

    let reloaded = store.load().unwrap();
    assert_eq!(reloaded, book);
    assert_eq!(reloaded.get(1).unwrap().peak_price, Some(dec!(62.5)));
}

#[test]
fn test_manual_tags_survive_reload_and_drive_classification() {
    let dir = tempdir().unwrap();
    let store = OverrideStore::new(dir.path().join("correlations.json"));

    let mut overrides = NarrativeOverrides::new();
    overrides.tag("snow-lisbon", NarrativeTag::Geopolitics);
    store.save(&overrides).unwrap();

    let classifier = NarrativeClassifier::default().with_overrides(store.load().unwrap());
    let tags = classifier.classify_market("snow-lisbon", "Will it snow in Lisbon?");
    assert!(tags.contains(&NarrativeTag::Geopolitics));
}

#[test]
fn test_ledger_json_shape() {
    let mut ledger = Ledger::new();
    ledger.open(request("a", dec!(40)), Utc::now()).unwrap();

    let json = serde_json::to_value(&ledger).unwrap();
    assert_eq!(json["next_id"], 2);
    assert_eq!(json["positions"][0]["side"], "yes");
    assert_eq!(json["positions"][0]["status"], "open");
}

#[test]
fn test_bare_trade_list_is_rejected() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("paper_trades.json");
    std::fs::write(
        &path,
        r#"[{"id": 1, "type": "BUY", "market_slug": "btc-150k", "question": "Bitcoin above 150k?",
            "outcome": "No", "entry_price": 30.0, "amount": 10.0, "shares": 33.3,
            "reason": "", "timestamp": "2026-01-05T10:00:00+00:00", "status": "OPEN",
            "exit_price": null, "pnl": null}]"#,
    )
    .unwrap();

    // refused outright instead of loading with No prices read as YES prices
    let err = LedgerStore::new(&path).load().unwrap_err();
    assert!(err.to_string().contains("paper_trades.json"));
}
