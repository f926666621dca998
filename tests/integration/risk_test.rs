//! Risk gate and sizing scenarios

use chrono::Utc;
use poly_guard::config::RiskConfig;
use poly_guard::ledger::{Ledger, OpenRequest, Side};
use poly_guard::narrative::NarrativeClassifier;
use poly_guard::risk::{
    kelly_size, ExposureSnapshot, ProposedTrade, RiskDecision, RiskGate, RiskMessage,
};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

fn risk_config() -> RiskConfig {
    RiskConfig {
        max_position_size: dec!(100),
        max_daily_loss: dec!(50),
        max_daily_loss_pct: dec!(5),
        max_open_positions: 5,
        max_market_exposure: dec!(300),
        max_narrative_exposure: dec!(400),
        asymmetric_risk_threshold: dec!(85),
        kelly_fraction: dec!(0.25),
    }
}

fn open(ledger: &mut Ledger, market: &str, title: &str, amount: Decimal) {
    ledger
        .open(
            OpenRequest {
                market: market.to_string(),
                title: title.to_string(),
                side: Side::Yes,
                amount,
                entry_price: dec!(50),
                reason: String::new(),
            },
            Utc::now(),
        )
        .unwrap();
}

fn proposal(market: &str, title: &str, amount: Decimal, entry: Decimal) -> ProposedTrade {
    ProposedTrade {
        market: market.to_string(),
        title: title.to_string(),
        amount,
        entry_price: entry,
    }
}

fn evaluate(
    config: &RiskConfig,
    ledger: &Ledger,
    classifier: &NarrativeClassifier,
    proposed: &ProposedTrade,
) -> RiskDecision {
    let snapshot = ExposureSnapshot::compute(ledger.positions(), classifier);
    RiskGate::new(config, classifier).evaluate(
        proposed,
        &snapshot,
        ledger.open_count(),
        ledger.daily_pnl(Utc::now().date_naive()),
        ledger.bankroll(dec!(10000)),
    )
}

#[test]
fn test_oversized_trade_is_blocked() {
    let config = risk_config();
    let classifier = NarrativeClassifier::default();
    let ledger = Ledger::new();

    let decision = evaluate(
        &config,
        &ledger,
        &classifier,
        &proposal("snow", "Snow in Lisbon?", dec!(150), dec!(40)),
    );

    assert!(!decision.admitted);
    assert!(decision
        .lines()
        .iter()
        .any(|l| l.contains("exceeds max position size")));
}

#[test]
fn test_full_book_is_blocked() {
    let config = risk_config();
    let classifier = NarrativeClassifier::default();
    let mut ledger = Ledger::new();
    for i in 0..5 {
        open(&mut ledger, &format!("market-{i}"), "Snow in Lisbon?", dec!(10));
    }

    let decision = evaluate(
        &config,
        &ledger,
        &classifier,
        &proposal("another", "Snow in Porto?", dec!(50), dec!(40)),
    );

    assert!(!decision.admitted);
    assert!(decision.lines().iter().any(|l| l.contains("max positions")));
}

#[test]
fn test_market_concentration() {
    let config = risk_config();
    let classifier = NarrativeClassifier::default();
    let mut ledger = Ledger::new();
    open(&mut ledger, "snow", "Snow in Lisbon?", dec!(100));
    open(&mut ledger, "snow", "Snow in Lisbon?", dec!(100));
    open(&mut ledger, "snow", "Snow in Lisbon?", dec!(50));

    let admitted = evaluate(
        &config,
        &ledger,
        &classifier,
        &proposal("snow", "Snow in Lisbon?", dec!(40), dec!(40)),
    );
    assert!(admitted.admitted);
    assert_eq!(admitted.messages, vec![RiskMessage::AllChecksPassed]);

    let denied = evaluate(
        &config,
        &ledger,
        &classifier,
        &proposal("snow", "Snow in Lisbon?", dec!(60), dec!(40)),
    );
    assert!(!denied.admitted);
    assert!(denied.lines()[0].contains("Market exposure for snow"));
}

#[test]
fn test_high_entry_price_warns_without_blocking() {
    let config = risk_config();
    let classifier = NarrativeClassifier::default();
    let ledger = Ledger::new();

    let decision = evaluate(
        &config,
        &ledger,
        &classifier,
        &proposal("snow", "Snow in Lisbon?", dec!(50), dec!(95.9)),
    );

    assert!(decision.admitted);
    let warning = decision.warnings().next().unwrap();
    assert_eq!(warning.upside_pct.round_dp(1), dec!(4.3));
    assert!(decision.lines()[0].contains("+4.3%"));
}

#[test]
fn test_exposure_is_idempotent() {
    let classifier = NarrativeClassifier::default();
    let mut ledger = Ledger::new();
    open(&mut ledger, "btc", "Bitcoin above 150k?", dec!(80));
    open(&mut ledger, "gpt5", "OpenAI GPT-5 release?", dec!(40));

    let first = ExposureSnapshot::compute(ledger.positions(), &classifier);
    let second = ExposureSnapshot::compute(ledger.positions(), &classifier);
    assert_eq!(first, second);
}

#[test]
fn test_denial_is_monotone_in_amount() {
    let config = risk_config();
    let classifier = NarrativeClassifier::default();
    let mut ledger = Ledger::new();
    open(&mut ledger, "btc", "Bitcoin above 150k?", dec!(100));
    open(&mut ledger, "btc", "Bitcoin above 150k?", dec!(100));
    open(&mut ledger, "eth", "Ethereum ETF approved?", dec!(100));

    let mut denied_seen = false;
    for step in 1..=40 {
        let amount = Decimal::from(step * 5);
        let decision = evaluate(
            &config,
            &ledger,
            &classifier,
            &proposal("btc", "Bitcoin above 150k?", amount, dec!(50)),
        );
        if denied_seen {
            assert!(!decision.admitted, "admitted ${amount} after a smaller denial");
        }
        denied_seen |= !decision.admitted;
    }
    assert!(denied_seen);
}

#[test]
fn test_market_limit_is_inclusive() {
    let config = risk_config();
    let classifier = NarrativeClassifier::default();
    let mut ledger = Ledger::new();
    open(&mut ledger, "snow", "Snow in Lisbon?", dec!(100));
    open(&mut ledger, "snow", "Snow in Lisbon?", dec!(100));
    open(&mut ledger, "snow", "Snow in Lisbon?", dec!(50));

    let at_limit = evaluate(
        &config,
        &ledger,
        &classifier,
        &proposal("snow", "Snow in Lisbon?", dec!(50), dec!(40)),
    );
    assert!(at_limit.admitted);

    let over = evaluate(
        &config,
        &ledger,
        &classifier,
        &proposal("snow", "Snow in Lisbon?", dec!(50.01), dec!(40)),
    );
    assert!(!over.admitted);
}

#[test]
fn test_daily_loss_blocks_after_losing_trades() {
    let config = risk_config();
    let classifier = NarrativeClassifier::default();
    let mut ledger = Ledger::new();
    open(&mut ledger, "a", "Snow in Lisbon?", dec!(60));
    let id = ledger.positions()[0].id;
    ledger.resolve(id, false, Utc::now()).unwrap();

    let decision = evaluate(
        &config,
        &ledger,
        &classifier,
        &proposal("b", "Snow in Porto?", dec!(10), dec!(40)),
    );
    assert!(!decision.admitted);
    assert!(decision
        .lines()
        .iter()
        .any(|l| l.starts_with("BLOCKED: Daily loss limit reached")));
}

#[test]
fn test_kelly_never_negative() {
    for p in 1..100 {
        let win_prob = Decimal::new(p, 2);
        for odds in [dec!(0.5), dec!(1), dec!(1.5), dec!(2), dec!(5)] {
            let stake = kelly_size(win_prob, odds, dec!(1000), dec!(0.25));
            assert!(stake >= Decimal::ZERO);
            if odds == dec!(2) && win_prob <= dec!(0.5) {
                assert_eq!(stake, Decimal::ZERO);
            }
        }
    }
    assert_eq!(kelly_size(dec!(0.6), dec!(2), dec!(1000), dec!(0.25)), dec!(50));
}
