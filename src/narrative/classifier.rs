//! Keyword-based narrative classifier
//!
//! A market belongs to every narrative with at least one keyword appearing in
//! its lower-cased title. Classification is not exclusive and an empty result
//! is common.

use super::{NarrativeTable, NarrativeTag};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Manual market → narrative assignments
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NarrativeOverrides {
    markets: BTreeMap<String, BTreeSet<NarrativeTag>>,
}

impl NarrativeOverrides {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a narrative to a market's manual tags
    pub fn tag(&mut self, market: impl Into<String>, tag: NarrativeTag) {
        self.markets.entry(market.into()).or_default().insert(tag);
    }

    /// Drop all manual tags for a market; returns whether any existed
    pub fn untag(&mut self, market: &str) -> bool {
        self.markets.remove(market).is_some()
    }

    pub fn get(&self, market: &str) -> Option<&BTreeSet<NarrativeTag>> {
        self.markets.get(market)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &BTreeSet<NarrativeTag>)> {
        self.markets.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.markets.is_empty()
    }
}

/// Maps market titles to narrative tags
#[derive(Debug, Clone, Default)]
pub struct NarrativeClassifier {
    table: NarrativeTable,
    overrides: NarrativeOverrides,
}

impl NarrativeClassifier {
    pub fn new(table: NarrativeTable) -> Self {
        Self {
            table,
            overrides: NarrativeOverrides::default(),
        }
    }

    pub fn with_overrides(mut self, overrides: NarrativeOverrides) -> Self {
        self.overrides = overrides;
        self
    }

    pub fn table(&self) -> &NarrativeTable {
        &self.table
    }

    pub fn overrides(&self) -> &NarrativeOverrides {
        &self.overrides
    }

    /// Narratives whose keywords occur in `text`
    pub fn classify(&self, text: &str) -> BTreeSet<NarrativeTag> {
        let text = text.to_lowercase();
        self.table
            .iter()
            .filter(|def| def.keywords.iter().any(|kw| text.contains(kw.as_str())))
            .map(|def| def.tag)
            .collect()
    }

    /// Narratives for a market, preferring manual tags over keyword detection
    pub fn classify_market(&self, market: &str, title: &str) -> BTreeSet<NarrativeTag> {
        match self.overrides.get(market) {
            Some(tags) => tags.clone(),
            None => self.classify(title),
        }
    }
}
