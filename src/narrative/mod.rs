//! Narrative classification
//!
//! Groups markets into correlated themes ("narratives") by keyword so that
//! exposure to outcomes which tend to move together can be capped.

mod classifier;
mod table;

pub use classifier::{NarrativeClassifier, NarrativeOverrides};
pub use table::{NarrativeDef, NarrativeTable};

use crate::store::JsonStore;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// File-backed manual narrative tags
pub type OverrideStore = JsonStore<NarrativeOverrides>;

/// A correlated market theme
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NarrativeTag {
    /// Model releases and capability milestones
    AiProgress,
    /// AI policy and regulation
    AiRegulation,
    /// AI company deals, funding and products
    AiBusiness,
    /// US elections and politics
    ElectionsUs,
    /// Cryptocurrency markets
    Crypto,
    /// Big tech earnings
    TechEarnings,
    /// Wars, sanctions and trade disputes
    Geopolitics,
}

impl NarrativeTag {
    /// Every narrative, in declaration order
    pub const ALL: [NarrativeTag; 7] = [
        NarrativeTag::AiProgress,
        NarrativeTag::AiRegulation,
        NarrativeTag::AiBusiness,
        NarrativeTag::ElectionsUs,
        NarrativeTag::Crypto,
        NarrativeTag::TechEarnings,
        NarrativeTag::Geopolitics,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            NarrativeTag::AiProgress => "ai_progress",
            NarrativeTag::AiRegulation => "ai_regulation",
            NarrativeTag::AiBusiness => "ai_business",
            NarrativeTag::ElectionsUs => "elections_us",
            NarrativeTag::Crypto => "crypto",
            NarrativeTag::TechEarnings => "tech_earnings",
            NarrativeTag::Geopolitics => "geopolitics",
        }
    }
}

impl fmt::Display for NarrativeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unknown narrative name
#[derive(Debug, Error)]
#[error("unknown narrative `{0}`, expected one of: ai_progress, ai_regulation, ai_business, elections_us, crypto, tech_earnings, geopolitics")]
pub struct UnknownNarrative(pub String);

impl FromStr for NarrativeTag {
    type Err = UnknownNarrative;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        NarrativeTag::ALL
            .into_iter()
            .find(|tag| tag.as_str() == wanted)
            .ok_or_else(|| UnknownNarrative(s.to_string()))
    }
}
