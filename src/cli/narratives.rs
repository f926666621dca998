//! Narrative commands: exposure, narratives, tag, untag

use super::{truncate, Context};
use crate::narrative::{NarrativeOverrides, NarrativeTag};
use crate::risk::{ExposureSnapshot, ExposureSummary, LimitStatus};
use clap::Args;
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Args, Debug)]
pub struct ExposureArgs {}

#[derive(Serialize)]
struct ExposureOutput {
    #[serde(flatten)]
    summary: ExposureSummary,
    by_market: BTreeMap<String, Decimal>,
}

impl ExposureArgs {
    pub async fn execute(&self, ctx: &Context) -> anyhow::Result<()> {
        let ledger = ctx.ledger_store().load()?;
        let classifier = ctx.classifier()?;
        let summary = ExposureSummary::build(
            ledger.positions(),
            &classifier,
            ctx.config.risk.max_narrative_exposure,
        );
        let snapshot = ExposureSnapshot::compute(ledger.positions(), &classifier);

        if ctx.json {
            return ctx.print_json(&ExposureOutput {
                summary,
                by_market: snapshot.by_market,
            });
        }

        println!("NARRATIVE EXPOSURE");
        println!(
            "  Total: ${} across {} open position(s)",
            summary.total.round_dp(2),
            summary.open_positions
        );
        if summary.narratives.is_empty() {
            println!("  No narrative exposure.");
        }
        for n in &summary.narratives {
            let flag = match n.status {
                LimitStatus::Ok => "ok",
                LimitStatus::Approaching => "APPROACHING",
                LimitStatus::Over => "OVER LIMIT",
            };
            let ids: Vec<String> = n.position_ids.iter().map(|id| format!("#{id}")).collect();
            println!(
                "  {:<14} ${} / ${} ({}%) {}  [{}]",
                n.narrative.as_str(),
                n.exposure.round_dp(2),
                n.limit.round_dp(2),
                n.utilization_pct.round_dp(1),
                flag,
                ids.join(" ")
            );
        }

        let max_market = ctx.config.risk.max_market_exposure;
        println!();
        println!("MARKET EXPOSURE (max ${})", max_market);
        for (market, exposure) in &snapshot.by_market {
            println!("  {:<40} ${}", truncate(market, 40), exposure.round_dp(2));
        }
        Ok(())
    }
}

#[derive(Args, Debug)]
pub struct NarrativesArgs {}

#[derive(Serialize)]
struct NarrativeRow<'a> {
    narrative: NarrativeTag,
    description: &'a str,
    limit: Decimal,
    keywords: &'a [String],
}

#[derive(Serialize)]
struct NarrativesOutput<'a> {
    narratives: Vec<NarrativeRow<'a>>,
    manual_tags: &'a NarrativeOverrides,
}

impl NarrativesArgs {
    pub async fn execute(&self, ctx: &Context) -> anyhow::Result<()> {
        let classifier = ctx.classifier()?;
        let default_limit = ctx.config.risk.max_narrative_exposure;

        let rows: Vec<NarrativeRow> = classifier
            .table()
            .iter()
            .map(|def| NarrativeRow {
                narrative: def.tag,
                description: &def.description,
                limit: def.max_exposure.unwrap_or(default_limit),
                keywords: &def.keywords,
            })
            .collect();

        if ctx.json {
            return ctx.print_json(&NarrativesOutput {
                narratives: rows,
                manual_tags: classifier.overrides(),
            });
        }

        for row in &rows {
            println!("{} (limit ${}): {}", row.narrative, row.limit, row.description);
            println!("  keywords: {}", row.keywords.join(", "));
        }

        if !classifier.overrides().is_empty() {
            println!();
            println!("MANUAL TAGS");
            for (market, tags) in classifier.overrides().iter() {
                let names: Vec<&str> = tags.iter().map(|t| t.as_str()).collect();
                println!("  {}: {}", market, names.join(", "));
            }
        }
        Ok(())
    }
}

#[derive(Args, Debug)]
pub struct TagArgs {
    /// Market slug
    pub market: String,
    /// Narrative to add
    pub narrative: NarrativeTag,
}

impl TagArgs {
    pub async fn execute(&self, ctx: &Context) -> anyhow::Result<()> {
        let store = ctx.override_store();
        let mut overrides = store.load()?;
        overrides.tag(self.market.clone(), self.narrative);
        store.save(&overrides)?;

        tracing::info!(market = %self.market, narrative = %self.narrative, "Market tagged");

        if ctx.json {
            return ctx.print_json(&overrides.get(&self.market));
        }
        println!("Tagged {} as {}", self.market, self.narrative);
        Ok(())
    }
}

#[derive(Args, Debug)]
pub struct UntagArgs {
    /// Market slug
    pub market: String,
}

impl UntagArgs {
    pub async fn execute(&self, ctx: &Context) -> anyhow::Result<()> {
        let store = ctx.override_store();
        let mut overrides = store.load()?;
        let removed = overrides.untag(&self.market);
        if removed {
            store.save(&overrides)?;
            tracing::info!(market = %self.market, "Manual tags removed");
        }

        if ctx.json {
            return ctx.print_json(&serde_json::json!({
                "market": self.market,
                "removed": removed,
            }));
        }
        if removed {
            println!(
                "Removed manual tags from {}; keyword detection applies again",
                self.market
            );
        } else {
            println!("{} had no manual tags", self.market);
        }
        Ok(())
    }
}
