//! Exit commands: target, exits, watch

use super::trade::{print_target, ExitRuleArgs};
use super::{truncate, Context};
use crate::exit::{close_triggered, ExitMonitor, ExitTargetBook, ScanReport};
use crate::ledger::Ledger;
use crate::market::PriceSource;
use crate::risk::ExposureSnapshot;
use crate::telemetry::{self, CounterMetric, GaugeMetric};
use chrono::Utc;
use clap::Args;
use rust_decimal::Decimal;
use std::time::Duration;

#[derive(Args, Debug)]
pub struct TargetArgs {
    /// Position id
    pub id: u64,

    #[command(flatten)]
    pub rules: ExitRuleArgs,

    /// Remove the position's exit rules
    #[arg(long, conflicts_with_all = ["tp", "sl", "ts"])]
    pub clear: bool,
}

impl TargetArgs {
    pub async fn execute(&self, ctx: &Context) -> anyhow::Result<()> {
        let ledger = ctx.ledger_store().load()?;
        let position = ledger
            .get(self.id)
            .ok_or_else(|| anyhow::anyhow!("position #{} not found", self.id))?;

        let store = ctx.target_store();
        let mut book = store.load()?;

        if self.clear {
            let removed = book.remove(self.id).is_some();
            store.save(&book)?;
            if !ctx.json {
                if removed {
                    println!("Exit rules cleared for position #{}", self.id);
                } else {
                    println!("Position #{} had no exit rules", self.id);
                }
            }
            return Ok(());
        }

        anyhow::ensure!(
            position.is_open(),
            "position #{} is {}, exit rules only apply to open positions",
            self.id,
            position.status
        );
        self.rules.validate()?;
        let target = self
            .rules
            .to_target()
            .ok_or_else(|| anyhow::anyhow!("give at least one of --tp, --sl, --ts or --clear"))?;

        book.set(self.id, target.clone());
        store.save(&book)?;

        tracing::info!(
            id = self.id,
            take_profit = ?target.take_profit,
            stop_loss = ?target.stop_loss,
            trailing_stop = ?target.trailing_stop,
            "Exit target set"
        );

        if ctx.json {
            return ctx.print_json(&target);
        }

        println!("Exit rules set for position #{}", self.id);
        print_target(&target);
        Ok(())
    }
}

#[derive(Args, Debug)]
pub struct ExitsArgs {
    /// Close triggered positions at the observed price
    #[arg(long)]
    pub close: bool,
}

impl ExitsArgs {
    pub async fn execute(&self, ctx: &Context) -> anyhow::Result<()> {
        let monitor = ExitMonitor::new(ctx.gamma()?);
        let auto_close = self.close || ctx.config.monitor.auto_close;
        let (report, closed) = run_pass(ctx, &monitor, auto_close).await?;

        if ctx.json {
            return ctx.print_json(&report);
        }
        print_report(&report, &closed);
        Ok(())
    }
}

#[derive(Args, Debug)]
pub struct WatchArgs {
    /// Seconds between passes, overriding `monitor.poll_interval_secs`
    #[arg(long)]
    pub interval: Option<u64>,
}

impl WatchArgs {
    pub async fn execute(&self, ctx: &Context) -> anyhow::Result<()> {
        let secs = self
            .interval
            .unwrap_or(ctx.config.monitor.poll_interval_secs)
            .max(1);

        if let Some(port) = ctx.config.telemetry.metrics_port {
            telemetry::serve_metrics(port)?;
        }

        let monitor = ExitMonitor::new(ctx.gamma()?);
        let auto_close = ctx.config.monitor.auto_close;
        let mut interval = tokio::time::interval(Duration::from_secs(secs));

        tracing::info!(interval_secs = secs, auto_close, "Starting exit monitor");

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    match run_pass(ctx, &monitor, auto_close).await {
                        Ok((report, closed)) => {
                            if ctx.json {
                                ctx.print_json(&report)?;
                            } else {
                                print_report(&report, &closed);
                            }
                        }
                        Err(e) => tracing::error!(error = %e, "Exit scan failed"),
                    }
                }
                _ = tokio::signal::ctrl_c() => {
                    tracing::info!("Received shutdown signal");
                    break;
                }
            }
        }

        Ok(())
    }
}

/// Load, scan, persist peaks and optionally close triggered positions
async fn run_pass<P: PriceSource>(
    ctx: &Context,
    monitor: &ExitMonitor<P>,
    auto_close: bool,
) -> anyhow::Result<(ScanReport, Vec<u64>)> {
    let ledger_store = ctx.ledger_store();
    let target_store = ctx.target_store();
    let mut ledger = ledger_store.load()?;
    let mut book = target_store.load()?;

    let pruned = book.prune(&ledger);
    if !pruned.is_empty() {
        tracing::info!(pruned = ?pruned, "Dropped exit targets of settled positions");
    }

    let report = monitor.scan(&ledger, &mut book).await;
    // peaks from this pass are kept even if closing fails below
    target_store.save(&book)?;

    let closed = if auto_close && !report.triggers.is_empty() {
        close_triggered(&mut ledger, &report, Utc::now())
    } else {
        Vec::new()
    };
    if !closed.is_empty() {
        ledger_store.save(&ledger)?;
        for id in &closed {
            book.remove(*id);
        }
        target_store.save(&book)?;
    }

    publish_metrics(ctx, &ledger, &book, &report)?;

    Ok((report, closed))
}

fn publish_metrics(
    ctx: &Context,
    ledger: &Ledger,
    book: &ExitTargetBook,
    report: &ScanReport,
) -> anyhow::Result<()> {
    let classifier = ctx.classifier()?;
    let snapshot = ExposureSnapshot::compute(ledger.positions(), &classifier);

    telemetry::increment(CounterMetric::Scans, 1);
    telemetry::increment(CounterMetric::PriceMisses, report.skipped.len() as u64);
    for trigger in &report.triggers {
        telemetry::record_trigger(trigger.kind.as_str());
    }

    telemetry::set_gauge(GaugeMetric::OpenPositions, Decimal::from(snapshot.open_positions));
    telemetry::set_gauge(GaugeMetric::TotalExposure, snapshot.total);
    telemetry::set_gauge(
        GaugeMetric::DailyPnl,
        ledger.daily_pnl(Utc::now().date_naive()),
    );
    telemetry::set_gauge(
        GaugeMetric::Bankroll,
        ledger.bankroll(ctx.config.portfolio.starting_balance),
    );
    telemetry::set_gauge(GaugeMetric::UnrealizedPnl, report.unrealized_pnl());
    for (tag, exposure) in &snapshot.by_narrative {
        telemetry::set_narrative_exposure(*tag, *exposure);
    }

    tracing::debug!(targets = book.len(), "Published portfolio metrics");
    Ok(())
}

fn print_report(report: &ScanReport, closed: &[u64]) {
    println!("Exit check at {}", Utc::now().format("%Y-%m-%d %H:%M:%S UTC"));

    if report.marks.is_empty() && report.skipped.is_empty() {
        println!("  No open positions.");
        return;
    }

    for mark in &report.marks {
        println!(
            "  #{} {} ({}): {}% -> {}%  P&L ${} ({}%)",
            mark.position_id,
            truncate(&mark.title, 40),
            mark.side,
            mark.entry_price,
            mark.current_price.round_dp(1),
            mark.unrealized_pnl.round_dp(2),
            mark.pnl_pct.round_dp(1)
        );
        match (mark.has_target, mark.trailing_level) {
            (true, Some(level)) => println!("      trailing stop at {}%", level.round_dp(1)),
            (false, _) => println!("      (no exit rules)"),
            _ => {}
        }
    }
    for skipped in &report.skipped {
        println!(
            "  #{} {}: price unavailable, skipped",
            skipped.position_id, skipped.market
        );
    }

    if report.triggers.is_empty() {
        println!("No exits triggered.");
    } else {
        println!("TRIGGERED:");
        for trigger in &report.triggers {
            println!("  {trigger}");
        }
    }
    for id in closed {
        println!("Closed position #{id}");
    }
    println!(
        "Unrealized P&L (priced positions): ${}",
        report.unrealized_pnl().round_dp(2)
    );
}
