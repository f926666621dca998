//! Exit targets keyed by position id

use super::ExitTarget;
use crate::ledger::Ledger;
use crate::store::JsonStore;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// All exit targets, persisted as a map of position id to target
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExitTargetBook {
    targets: BTreeMap<String, ExitTarget>,
}

/// File-backed exit target store
pub type TargetStore = JsonStore<ExitTargetBook>;

impl ExitTargetBook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach a target to a position, replacing any previous one
    ///
    /// A replaced target loses its trailing-stop peak.
    pub fn set(&mut self, position_id: u64, mut target: ExitTarget) -> Option<ExitTarget> {
        target.peak_price = None;
        self.targets.insert(position_id.to_string(), target)
    }

    pub fn get(&self, position_id: u64) -> Option<&ExitTarget> {
        self.targets.get(&position_id.to_string())
    }

    pub fn get_mut(&mut self, position_id: u64) -> Option<&mut ExitTarget> {
        self.targets.get_mut(&position_id.to_string())
    }

    pub fn remove(&mut self, position_id: u64) -> Option<ExitTarget> {
        self.targets.remove(&position_id.to_string())
    }

    /// Drop targets whose position is missing or no longer open
    ///
    /// Returns the ids that were removed. Keys that are not numeric are
    /// dropped as well.
    pub fn prune(&mut self, ledger: &Ledger) -> Vec<String> {
        let mut removed = Vec::new();
        self.targets.retain(|key, _| {
            let live = key
                .parse::<u64>()
                .ok()
                .and_then(|id| ledger.get(id))
                .is_some_and(|p| p.is_open());
            if !live {
                removed.push(key.clone());
            }
            live
        });
        removed
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &ExitTarget)> {
        self.targets.iter()
    }

    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }
}
