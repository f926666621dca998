//! Kelly criterion position sizing
//!
//! Advisory only; the risk gate never consults it.

use rust_decimal::Decimal;

/// Fractional Kelly calculator for binary outcomes
#[derive(Debug, Clone, Copy)]
pub struct KellyCalculator {
    /// Kelly fraction (e.g., 0.25 for quarter Kelly)
    pub fraction: Decimal,
}

impl KellyCalculator {
    pub fn new(fraction: Decimal) -> Self {
        Self { fraction }
    }

    /// Suggested stake for a win probability and decimal odds
    pub fn size(&self, win_prob: Decimal, decimal_odds: Decimal, bankroll: Decimal) -> Decimal {
        kelly_size(win_prob, decimal_odds, bankroll, self.fraction)
    }

    /// Suggested stake when buying at `price` (percent) with an estimated
    /// win probability
    pub fn size_at_price(&self, win_prob: Decimal, price: Decimal, bankroll: Decimal) -> Decimal {
        match odds_from_price(price) {
            Some(odds) => self.size(win_prob, odds, bankroll),
            None => Decimal::ZERO,
        }
    }
}

/// Fractional Kelly stake
///
/// - `b = decimal_odds - 1`
/// - `f* = (b*p - q) / b`
///
/// Returns zero for any input outside the valid domain, and never a
/// negative stake.
pub fn kelly_size(
    win_prob: Decimal,
    decimal_odds: Decimal,
    bankroll: Decimal,
    fraction: Decimal,
) -> Decimal {
    if win_prob <= Decimal::ZERO || win_prob >= Decimal::ONE {
        return Decimal::ZERO;
    }
    if bankroll <= Decimal::ZERO || fraction <= Decimal::ZERO {
        return Decimal::ZERO;
    }

    let b = match decimal_odds.checked_sub(Decimal::ONE) {
        Some(b) if b > Decimal::ZERO => b,
        _ => return Decimal::ZERO,
    };

    let q = Decimal::ONE - win_prob;
    let full = (b * win_prob - q) / b;
    if full <= Decimal::ZERO {
        return Decimal::ZERO;
    }

    bankroll
        .checked_mul(full)
        .and_then(|stake| stake.checked_mul(fraction))
        .unwrap_or(Decimal::ZERO)
}

/// Decimal odds paid by a share bought at `price` percent
pub fn odds_from_price(price: Decimal) -> Option<Decimal> {
    if price <= Decimal::ZERO || price > Decimal::ONE_HUNDRED {
        return None;
    }
    Decimal::ONE_HUNDRED.checked_div(price)
}
