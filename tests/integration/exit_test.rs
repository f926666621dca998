//! Exit engine behaviour over price sequences

use chrono::Utc;
use poly_guard::exit::{self, ExitTarget, TriggerKind};
use poly_guard::ledger::{Ledger, OpenRequest, Position, Side};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

fn open_position(side: Side, amount: Decimal, entry: Decimal) -> Position {
    let mut ledger = Ledger::new();
    ledger
        .open(
            OpenRequest {
                market: "m".to_string(),
                title: "Test market".to_string(),
                side,
                amount,
                entry_price: entry,
                reason: String::new(),
            },
            Utc::now(),
        )
        .unwrap()
        .clone()
}

#[test]
fn test_trailing_stop_follows_peak() {
    let position = open_position(Side::Yes, dec!(100), dec!(50));
    let mut target = ExitTarget::new(None, None, Some(dec!(5)), Utc::now());

    let mut fired = Vec::new();
    for price in [dec!(70), dec!(90), dec!(85), dec!(84)] {
        fired.push(exit::check(&position, &mut target, Some(price)));
    }

    assert!(fired[0].is_empty());
    assert!(fired[1].is_empty());
    // 85 sits exactly on the level and fires
    assert_eq!(fired[2].len(), 1);
    assert_eq!(fired[2][0].trigger_price, dec!(85));
    assert_eq!(fired[3].len(), 1);
    assert_eq!(fired[3][0].kind, TriggerKind::TrailingStop);
    assert_eq!(fired[3][0].trigger_price, dec!(85));
    assert_eq!(target.peak_price, Some(dec!(90)));
}

#[test]
fn test_trailing_stop_waits_for_a_full_retracement() {
    let position = open_position(Side::Yes, dec!(100), dec!(50));
    let mut target = ExitTarget::new(None, None, Some(dec!(5)), Utc::now());

    let prices = [dec!(70), dec!(90), dec!(86), dec!(84)];
    let fired: Vec<usize> = prices
        .iter()
        .map(|p| exit::check(&position, &mut target, Some(*p)).len())
        .collect();

    assert_eq!(fired, vec![0, 0, 0, 1]);
}

#[test]
fn test_peak_is_running_maximum() {
    let position = open_position(Side::Yes, dec!(100), dec!(50));
    let mut target = ExitTarget::new(None, None, Some(dec!(50)), Utc::now());

    let prices = [dec!(52), dec!(61), dec!(58), dec!(73.5), dec!(70), dec!(73.4)];
    let mut max = Decimal::MIN;
    for price in prices {
        exit::check(&position, &mut target, Some(price));
        max = max.max(price);
        assert_eq!(target.peak_price, Some(max));
    }

    // a missing price changes nothing
    exit::check(&position, &mut target, None);
    assert_eq!(target.peak_price, Some(dec!(73.5)));
}

#[test]
fn test_pnl_sign_by_side() {
    let yes = open_position(Side::Yes, dec!(100), dec!(40));
    let no = open_position(Side::No, dec!(100), dec!(40));
    assert_eq!(yes.shares, dec!(250));

    let mut target = ExitTarget::new(Some(dec!(60)), None, None, Utc::now());
    let yes_events = exit::check(&yes, &mut target, Some(dec!(60)));
    let no_events = exit::check(&no, &mut target, Some(dec!(60)));

    assert_eq!(yes_events[0].pnl, dec!(50));
    assert_eq!(no_events[0].pnl, dec!(-50));
}
