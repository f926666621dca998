//! CLI interface for poly-guard
//!
//! Provides subcommands for:
//! - `buy` / `check`: Run the risk gate, optionally opening a paper position
//! - `close` / `resolve`: Settle paper positions
//! - `status` / `list`: Portfolio summary and trade log
//! - `target` / `exits` / `watch`: Exit rules and their monitoring
//! - `exposure` / `narratives` / `tag` / `untag`: Narrative exposure
//! - `kelly`: Position sizing advice

mod exits;
mod kelly;
mod narratives;
mod portfolio;
mod trade;

pub use exits::{ExitsArgs, TargetArgs, WatchArgs};
pub use kelly::KellyArgs;
pub use narratives::{ExposureArgs, NarrativesArgs, TagArgs, UntagArgs};
pub use portfolio::{ListArgs, StatusArgs};
pub use trade::{BuyArgs, CheckArgs, CloseArgs, ResolveArgs};

use crate::config::Config;
use crate::exit::TargetStore;
use crate::ledger::LedgerStore;
use crate::market::{GammaClient, GammaConfig};
use crate::narrative::{NarrativeClassifier, NarrativeTable, OverrideStore};
use clap::{Parser, Subcommand};
use serde::Serialize;

#[derive(Parser, Debug)]
#[command(name = "poly-guard")]
#[command(about = "Risk gate and exit monitor for Polymarket paper trading")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Path to configuration file
    #[arg(short, long, default_value = "config.toml")]
    pub config: String,

    /// Print machine-readable JSON instead of text
    #[arg(long, global = true)]
    pub json: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Open a paper position after risk checks
    Buy(BuyArgs),
    /// Run risk checks for a trade without opening it
    Check(CheckArgs),
    /// Close an open position
    Close(CloseArgs),
    /// Settle a position on market resolution
    Resolve(ResolveArgs),
    /// Show portfolio summary
    Status(StatusArgs),
    /// List positions
    List(ListArgs),
    /// Set or clear exit rules for a position
    Target(TargetArgs),
    /// Check exit rules once against current prices
    Exits(ExitsArgs),
    /// Check exit rules on an interval
    Watch(WatchArgs),
    /// Show exposure by narrative
    Exposure(ExposureArgs),
    /// List narratives, keywords and manual tags
    Narratives(NarrativesArgs),
    /// Manually tag a market with a narrative
    Tag(TagArgs),
    /// Remove manual narrative tags from a market
    Untag(UntagArgs),
    /// Kelly criterion position size
    Kelly(KellyArgs),
}

impl Commands {
    pub async fn execute(&self, ctx: &Context) -> anyhow::Result<()> {
        match self {
            Commands::Buy(args) => args.execute(ctx).await,
            Commands::Check(args) => args.execute(ctx).await,
            Commands::Close(args) => args.execute(ctx).await,
            Commands::Resolve(args) => args.execute(ctx).await,
            Commands::Status(args) => args.execute(ctx).await,
            Commands::List(args) => args.execute(ctx).await,
            Commands::Target(args) => args.execute(ctx).await,
            Commands::Exits(args) => args.execute(ctx).await,
            Commands::Watch(args) => args.execute(ctx).await,
            Commands::Exposure(args) => args.execute(ctx).await,
            Commands::Narratives(args) => args.execute(ctx).await,
            Commands::Tag(args) => args.execute(ctx).await,
            Commands::Untag(args) => args.execute(ctx).await,
            Commands::Kelly(args) => args.execute(ctx).await,
        }
    }
}

/// Shared state for every subcommand
pub struct Context {
    pub config: Config,
    pub json: bool,
}

impl Context {
    pub fn new(config: Config, json: bool) -> Self {
        Self { config, json }
    }

    pub fn ledger_store(&self) -> LedgerStore {
        LedgerStore::new(self.config.portfolio.ledger_path.clone())
    }

    pub fn target_store(&self) -> TargetStore {
        TargetStore::new(self.config.portfolio.targets_path.clone())
    }

    pub fn override_store(&self) -> OverrideStore {
        OverrideStore::new(self.config.portfolio.overrides_path.clone())
    }

    /// Classifier built from the configured tables and the saved manual tags
    pub fn classifier(&self) -> anyhow::Result<NarrativeClassifier> {
        let table = NarrativeTable::from_config(&self.config.narratives);
        let overrides = self.override_store().load()?;
        Ok(NarrativeClassifier::new(table).with_overrides(overrides))
    }

    pub fn gamma(&self) -> anyhow::Result<GammaClient> {
        GammaClient::with_config(GammaConfig::from(&self.config.monitor))
    }

    fn print_json<T: Serialize>(&self, value: &T) -> anyhow::Result<()> {
        println!("{}", serde_json::to_string_pretty(value)?);
        Ok(())
    }
}

/// Shorten a market title for one-line output
fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let cut: String = text.chars().take(max.saturating_sub(3)).collect();
    format!("{cut}...")
}
