//! Narrative keyword tables

use super::NarrativeTag;
use crate::config::NarrativeConfig;
use rust_decimal::Decimal;
use std::collections::BTreeMap;

/// Keywords and limit for one narrative
#[derive(Debug, Clone)]
pub struct NarrativeDef {
    pub tag: NarrativeTag,
    pub description: String,
    /// Lower-cased keywords, matched as substrings
    pub keywords: Vec<String>,
    /// Dollar limit; `None` falls back to the global narrative limit
    pub max_exposure: Option<Decimal>,
}

/// Static narrative configuration, immutable once built
#[derive(Debug, Clone)]
pub struct NarrativeTable {
    defs: Vec<NarrativeDef>,
}

impl NarrativeTable {
    /// Built-in keyword table
    pub fn builtin() -> Self {
        let defs = NarrativeTag::ALL
            .into_iter()
            .map(|tag| {
                let (description, keywords) = builtin_entry(tag);
                NarrativeDef {
                    tag,
                    description: description.to_string(),
                    keywords: keywords.iter().map(|k| k.to_string()).collect(),
                    max_exposure: None,
                }
            })
            .collect();
        Self { defs }
    }

    /// Built-in table with per-narrative overrides applied
    pub fn from_config(overrides: &BTreeMap<NarrativeTag, NarrativeConfig>) -> Self {
        let mut table = Self::builtin();
        for def in &mut table.defs {
            let Some(cfg) = overrides.get(&def.tag) else {
                continue;
            };
            if let Some(keywords) = &cfg.keywords {
                def.keywords = keywords
                    .iter()
                    .map(|k| k.trim().to_lowercase())
                    .filter(|k| !k.is_empty())
                    .collect();
            }
            if let Some(description) = &cfg.description {
                def.description = description.clone();
            }
            def.max_exposure = cfg.max_exposure;
        }
        table
    }

    pub fn get(&self, tag: NarrativeTag) -> Option<&NarrativeDef> {
        self.defs.iter().find(|d| d.tag == tag)
    }

    pub fn iter(&self) -> impl Iterator<Item = &NarrativeDef> {
        self.defs.iter()
    }

    /// Dollar limit for a narrative, falling back to `default`
    pub fn limit_for(&self, tag: NarrativeTag, default: Decimal) -> Decimal {
        self.get(tag)
            .and_then(|d| d.max_exposure)
            .unwrap_or(default)
    }
}

impl Default for NarrativeTable {
    fn default() -> Self {
        Self::builtin()
    }
}

fn builtin_entry(tag: NarrativeTag) -> (&'static str, &'static [&'static str]) {
    match tag {
        NarrativeTag::AiProgress => (
            "AI capability milestones and model releases",
            &[
                "gpt", "chatgpt", "gemini", "claude", "llama", "agi", "frontier model",
                "model release", "benchmark",
            ],
        ),
        NarrativeTag::AiRegulation => (
            "AI regulation and policy",
            &[
                "ai regulation", "ai safety", "ai act", "executive order", "ai ban", "ftc ai",
                "eu ai", "congress ai",
            ],
        ),
        NarrativeTag::AiBusiness => (
            "AI company deals, funding and products",
            &[
                "openai", "anthropic", "deepmind", "google ai", "meta ai", "microsoft ai",
                "xai", "mistral", "copilot", "ai startup",
            ],
        ),
        NarrativeTag::ElectionsUs => (
            "US elections and politics",
            &[
                "trump", "biden", "harris", "election", "republican", "democrat", "gop",
                "electoral",
            ],
        ),
        NarrativeTag::Crypto => (
            "Cryptocurrency markets",
            &["bitcoin", "ethereum", "crypto", "btc", "eth", "sec crypto", "binance"],
        ),
        NarrativeTag::TechEarnings => (
            "Tech company earnings",
            &[
                "earnings", "revenue", "quarterly", "guidance", "nvidia", "apple", "alphabet",
                "amazon", "microsoft",
            ],
        ),
        NarrativeTag::Geopolitics => (
            "Geopolitical events",
            &["china", "russia", "ukraine", "taiwan", "war", "sanctions", "tariff"],
        ),
    }
}
