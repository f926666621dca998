//! Trade admission gate
//!
//! Runs every check against a proposed trade and collects all of the
//! results. Checks 1 to 4 are hard limits; the asymmetric-risk check only
//! warns.

use super::{
    AsymmetricRisk, ExposureSnapshot, ProposedTrade, RiskDecision, RiskMessage, RiskViolation,
};
use crate::config::RiskConfig;
use crate::narrative::NarrativeClassifier;
use rust_decimal::Decimal;

/// Admission control over a fixed set of limits
pub struct RiskGate<'a> {
    config: &'a RiskConfig,
    classifier: &'a NarrativeClassifier,
}

impl<'a> RiskGate<'a> {
    pub fn new(config: &'a RiskConfig, classifier: &'a NarrativeClassifier) -> Self {
        Self { config, classifier }
    }

    /// Evaluate a proposed trade against the current book
    ///
    /// `snapshot` must reflect the ledger at the time of the call; a stale
    /// snapshot lets concurrent proposals jointly exceed a limit.
    pub fn evaluate(
        &self,
        proposed: &ProposedTrade,
        snapshot: &ExposureSnapshot,
        open_count: usize,
        daily_pnl: Decimal,
        bankroll: Decimal,
    ) -> RiskDecision {
        let mut violations = self.check_basic_limits(proposed.amount, open_count, daily_pnl);
        violations.extend(self.check_market_exposure(proposed, snapshot));
        violations.extend(self.check_narrative_exposure(proposed, snapshot));
        violations.extend(self.check_daily_loss_pct(daily_pnl, bankroll));

        let admitted = violations.is_empty();
        let mut messages: Vec<RiskMessage> =
            violations.into_iter().map(RiskMessage::Violation).collect();

        if let Some(warning) = self.check_asymmetric_risk(proposed.entry_price) {
            messages.push(RiskMessage::Warning(warning));
        }

        if admitted && messages.is_empty() {
            messages.push(RiskMessage::AllChecksPassed);
        }

        tracing::debug!(
            market = %proposed.market,
            amount = %proposed.amount,
            admitted,
            messages = messages.len(),
            "Risk gate evaluated"
        );

        RiskDecision { admitted, messages }
    }

    /// Size, open-position count and absolute daily loss
    pub fn check_basic_limits(
        &self,
        amount: Decimal,
        open_count: usize,
        daily_pnl: Decimal,
    ) -> Vec<RiskViolation> {
        let mut violations = Vec::new();

        if amount <= Decimal::ZERO {
            violations.push(RiskViolation::InvalidAmount { amount });
        }

        if amount > self.config.max_position_size {
            violations.push(RiskViolation::PositionTooLarge {
                amount,
                max: self.config.max_position_size,
            });
        }

        if open_count >= self.config.max_open_positions {
            violations.push(RiskViolation::MaxPositionsReached {
                open: open_count,
                max: self.config.max_open_positions,
            });
        }

        if daily_pnl <= -self.config.max_daily_loss {
            violations.push(RiskViolation::DailyLossReached {
                pnl: daily_pnl,
                limit: self.config.max_daily_loss,
            });
        }

        violations
    }

    /// Existing plus proposed dollars in the same market
    pub fn check_market_exposure(
        &self,
        proposed: &ProposedTrade,
        snapshot: &ExposureSnapshot,
    ) -> Option<RiskViolation> {
        let current = snapshot.market(&proposed.market);
        let Some(would_be) = current.checked_add(proposed.amount) else {
            return Some(RiskViolation::Overflow {
                check: "market exposure",
            });
        };

        (would_be > self.config.max_market_exposure).then(|| RiskViolation::MarketExposure {
            market: proposed.market.clone(),
            current,
            would_be,
            max: self.config.max_market_exposure,
        })
    }

    /// Existing plus proposed dollars in every narrative of the proposal
    pub fn check_narrative_exposure(
        &self,
        proposed: &ProposedTrade,
        snapshot: &ExposureSnapshot,
    ) -> Vec<RiskViolation> {
        let table = self.classifier.table();

        self.classifier
            .classify_market(&proposed.market, &proposed.title)
            .into_iter()
            .filter_map(|tag| {
                let current = snapshot.narrative(tag);
                let Some(would_be) = current.checked_add(proposed.amount) else {
                    return Some(RiskViolation::Overflow {
                        check: "narrative exposure",
                    });
                };
                let max = table.limit_for(tag, self.config.max_narrative_exposure);

                (would_be > max).then_some(RiskViolation::NarrativeExposure {
                    narrative: tag,
                    current,
                    would_be,
                    max,
                })
            })
            .collect()
    }

    /// Today's loss as a share of bankroll
    pub fn check_daily_loss_pct(&self, daily_pnl: Decimal, bankroll: Decimal) -> Option<RiskViolation> {
        if bankroll <= Decimal::ZERO {
            return Some(RiskViolation::InvalidBankroll { bankroll });
        }

        let loss = (-daily_pnl).max(Decimal::ZERO);
        let Some(loss_pct) = loss
            .checked_div(bankroll)
            .and_then(|ratio| ratio.checked_mul(Decimal::ONE_HUNDRED))
        else {
            return Some(RiskViolation::Overflow {
                check: "daily loss percentage",
            });
        };

        (loss_pct >= self.config.max_daily_loss_pct).then(|| RiskViolation::DailyLossPct {
            loss_pct: loss_pct.round_dp(2),
            max_pct: self.config.max_daily_loss_pct,
        })
    }

    /// Limited upside at high entry prices
    pub fn check_asymmetric_risk(&self, entry_price: Decimal) -> Option<AsymmetricRisk> {
        if entry_price <= self.config.asymmetric_risk_threshold || entry_price <= Decimal::ZERO {
            return None;
        }

        let upside_pct = (Decimal::ONE_HUNDRED - entry_price)
            .checked_div(entry_price)?
            .checked_mul(Decimal::ONE_HUNDRED)?;
        let downside_pct = Decimal::ONE_HUNDRED;

        Some(AsymmetricRisk {
            entry_price,
            upside_pct,
            downside_pct,
            reward_to_risk: upside_pct / Decimal::ONE_HUNDRED,
        })
    }
}
