//! Exposure aggregation by market and narrative

use crate::ledger::Position;
use crate::narrative::{NarrativeClassifier, NarrativeTag};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Serialize;
use std::collections::BTreeMap;

/// Dollar exposure of the open book, recomputed on demand
///
/// A position tagged with several narratives counts in full towards each of
/// them, so narrative buckets can sum to more than `total`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ExposureSnapshot {
    pub by_market: BTreeMap<String, Decimal>,
    pub by_narrative: BTreeMap<NarrativeTag, Decimal>,
    pub total: Decimal,
    pub open_positions: usize,
}

impl ExposureSnapshot {
    /// Aggregate the open positions among `positions`
    pub fn compute<'a>(
        positions: impl IntoIterator<Item = &'a Position>,
        classifier: &NarrativeClassifier,
    ) -> Self {
        let mut snapshot = Self::default();

        // saturates; the gate denies any trade that would push a bucket further
        for position in positions.into_iter().filter(|p| p.is_open()) {
            let market = snapshot
                .by_market
                .entry(position.market.clone())
                .or_default();
            *market = market.saturating_add(position.amount);

            for tag in classifier.classify_market(&position.market, &position.title) {
                let narrative = snapshot.by_narrative.entry(tag).or_default();
                *narrative = narrative.saturating_add(position.amount);
            }

            snapshot.total = snapshot.total.saturating_add(position.amount);
            snapshot.open_positions += 1;
        }

        snapshot
    }

    /// Exposure to one market, zero when absent
    pub fn market(&self, market: &str) -> Decimal {
        self.by_market.get(market).copied().unwrap_or_default()
    }

    /// Exposure to one narrative, zero when absent
    pub fn narrative(&self, tag: NarrativeTag) -> Decimal {
        self.by_narrative.get(&tag).copied().unwrap_or_default()
    }
}

/// How close a narrative is to its limit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LimitStatus {
    Ok,
    /// Above 80% of the limit
    Approaching,
    Over,
}

/// Exposure of one narrative against its limit
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NarrativeExposure {
    pub narrative: NarrativeTag,
    pub description: String,
    pub exposure: Decimal,
    pub limit: Decimal,
    /// Exposure as a percentage of the limit
    pub utilization_pct: Decimal,
    pub status: LimitStatus,
    /// Open positions contributing to this narrative
    pub position_ids: Vec<u64>,
}

/// Per-narrative breakdown of the open book
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExposureSummary {
    pub total: Decimal,
    pub open_positions: usize,
    /// Only narratives with at least one open position
    pub narratives: Vec<NarrativeExposure>,
}

const APPROACHING_RATIO: Decimal = dec!(0.8);

impl ExposureSummary {
    pub fn build<'a>(
        positions: impl IntoIterator<Item = &'a Position> + Clone,
        classifier: &NarrativeClassifier,
        default_limit: Decimal,
    ) -> Self {
        let snapshot = ExposureSnapshot::compute(positions.clone(), classifier);

        let mut members: BTreeMap<NarrativeTag, Vec<u64>> = BTreeMap::new();
        for position in positions.into_iter().filter(|p| p.is_open()) {
            for tag in classifier.classify_market(&position.market, &position.title) {
                members.entry(tag).or_default().push(position.id);
            }
        }

        let narratives = classifier
            .table()
            .iter()
            .filter_map(|def| {
                let position_ids = members.remove(&def.tag)?;
                let exposure = snapshot.narrative(def.tag);
                let limit = def.max_exposure.unwrap_or(default_limit);
                let utilization_pct = if limit > Decimal::ZERO {
                    exposure
                        .checked_div(limit)
                        .and_then(|ratio| ratio.checked_mul(Decimal::ONE_HUNDRED))
                        .unwrap_or(Decimal::MAX)
                } else {
                    Decimal::ZERO
                };
                let status = if exposure > limit {
                    LimitStatus::Over
                } else if exposure > limit * APPROACHING_RATIO {
                    LimitStatus::Approaching
                } else {
                    LimitStatus::Ok
                };

                Some(NarrativeExposure {
                    narrative: def.tag,
                    description: def.description.clone(),
                    exposure,
                    limit,
                    utilization_pct,
                    status,
                    position_ids,
                })
            })
            .collect();

        Self {
            total: snapshot.total,
            open_positions: snapshot.open_positions,
            narratives,
        }
    }
}
