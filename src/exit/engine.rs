//! Exit-condition evaluation
//!
//! Pure functions over one position and its target. The only state touched
//! is the target's trailing-stop peak.

use super::{ExitTarget, TriggerEvent, TriggerKind};
use crate::ledger::Position;
use rust_decimal::Decimal;

/// Evaluate a position's exit rules at `current_price`
///
/// Every rule that fires is reported, trailing stop first, then take profit,
/// then stop loss. A missing price or a position that is no longer open
/// yields nothing and leaves the target untouched.
pub fn check(
    position: &Position,
    target: &mut ExitTarget,
    current_price: Option<Decimal>,
) -> Vec<TriggerEvent> {
    let Some(current) = current_price else {
        return Vec::new();
    };
    if !position.is_open() {
        return Vec::new();
    }

    let pnl = position.pnl_at(current);
    let event = |kind, trigger_price| TriggerEvent {
        position_id: position.id,
        kind,
        trigger_price,
        current_price: current,
        pnl,
    };

    let mut events = Vec::new();

    if let Some(distance) = target.trailing_stop {
        let peak = match target.peak_price {
            Some(peak) if peak >= current => peak,
            _ => {
                target.peak_price = Some(current);
                current
            }
        };
        let level = peak - distance;
        if current <= level {
            events.push(event(TriggerKind::TrailingStop, level));
        }
    }

    if let Some(take_profit) = target.take_profit {
        if current >= take_profit {
            events.push(event(TriggerKind::TakeProfit, take_profit));
        }
    }

    if let Some(stop_loss) = target.stop_loss {
        if current <= stop_loss {
            events.push(event(TriggerKind::StopLoss, stop_loss));
        }
    }

    for e in &events {
        tracing::info!(
            position_id = e.position_id,
            kind = %e.kind,
            trigger_price = %e.trigger_price,
            current_price = %e.current_price,
            pnl = %e.pnl,
            "Exit triggered"
        );
    }

    events
}

/// Pre-trade reminder when a trade is entered without any exit rule
pub fn exit_advisory(target: Option<&ExitTarget>) -> Option<&'static str> {
    match target {
        Some(t) if t.is_armed() => None,
        _ => Some(
            "No exit strategy defined: consider a take profit, stop loss or trailing stop",
        ),
    }
}
