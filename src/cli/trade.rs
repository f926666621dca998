//! Trade commands: buy, check, close, resolve

use super::{truncate, Context};
use crate::exit::{exit_advisory, ExitTarget};
use crate::ledger::{Ledger, OpenRequest, Position, Side};
use crate::market::PriceSource;
use crate::narrative::NarrativeClassifier;
use crate::risk::{
    run_checklist, Advisory, ChecklistInput, ExposureSnapshot, ProposedTrade, RiskDecision,
    RiskGate,
};
use crate::telemetry::{self, CounterMetric};
use chrono::Utc;
use clap::{Args, ValueEnum};
use rust_decimal::Decimal;
use serde::Serialize;

/// Exit rules that can accompany a trade
#[derive(Args, Debug, Clone, Default)]
pub struct ExitRuleArgs {
    /// Take profit at this YES price (percent)
    #[arg(long)]
    pub tp: Option<Decimal>,
    /// Stop loss at this YES price (percent)
    #[arg(long)]
    pub sl: Option<Decimal>,
    /// Trailing stop distance below the peak (percentage points)
    #[arg(long)]
    pub ts: Option<Decimal>,
}

impl ExitRuleArgs {
    pub fn is_empty(&self) -> bool {
        self.tp.is_none() && self.sl.is_none() && self.ts.is_none()
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        for (name, value) in [("--tp", self.tp), ("--sl", self.sl)] {
            if let Some(v) = value {
                anyhow::ensure!(
                    v >= Decimal::ZERO && v <= Decimal::ONE_HUNDRED,
                    "{name} must be between 0 and 100, got {v}"
                );
            }
        }
        if let Some(ts) = self.ts {
            anyhow::ensure!(ts > Decimal::ZERO, "--ts must be positive, got {ts}");
        }
        Ok(())
    }

    pub fn to_target(&self) -> Option<ExitTarget> {
        (!self.is_empty()).then(|| ExitTarget::new(self.tp, self.sl, self.ts, Utc::now()))
    }
}

/// Market and price of a proposed trade
#[derive(Args, Debug, Clone)]
pub struct TradeArgs {
    /// Market slug
    pub market: String,
    /// Dollars to commit
    pub amount: Decimal,
    /// Entry YES price in percent; fetched from Gamma when omitted
    #[arg(long)]
    pub price: Option<Decimal>,
    /// Market question used for narrative detection; fetched when omitted
    #[arg(long)]
    pub title: Option<String>,
}

impl TradeArgs {
    /// Fill in price and title, asking Gamma only for what is missing
    async fn resolve(&self, ctx: &Context) -> anyhow::Result<ProposedTrade> {
        let (price, title) = match (self.price, &self.title) {
            (Some(price), Some(title)) => (price, title.clone()),
            _ => {
                let quote = ctx.gamma()?.fetch_quote(&self.market).await;
                let quote = match (quote, self.price) {
                    (Ok(quote), _) => quote,
                    (Err(e), Some(_)) => {
                        tracing::warn!(market = %self.market, error = %e, "Market lookup failed");
                        None
                    }
                    (Err(e), None) => return Err(e),
                };
                let price = self
                    .price
                    .or_else(|| quote.as_ref().and_then(|q| q.yes_price))
                    .ok_or_else(|| anyhow::anyhow!("no price available for {}", self.market))?;
                let title = self
                    .title
                    .clone()
                    .or_else(|| quote.map(|q| q.question))
                    .unwrap_or_else(|| self.market.clone());
                (price, title)
            }
        };

        Ok(ProposedTrade {
            market: self.market.clone(),
            title,
            amount: self.amount,
            entry_price: price,
        })
    }
}

/// Run the gate for `proposed` against the current ledger
pub(super) fn assess(
    ctx: &Context,
    ledger: &Ledger,
    classifier: &NarrativeClassifier,
    proposed: &ProposedTrade,
) -> RiskDecision {
    let snapshot = ExposureSnapshot::compute(ledger.positions(), classifier);
    let gate = RiskGate::new(&ctx.config.risk, classifier);
    let decision = gate.evaluate(
        proposed,
        &snapshot,
        ledger.open_count(),
        ledger.daily_pnl(Utc::now().date_naive()),
        ledger.bankroll(ctx.config.portfolio.starting_balance),
    );

    let counter = if decision.admitted {
        CounterMetric::GateAdmitted
    } else {
        CounterMetric::GateDenied
    };
    telemetry::increment(counter, 1);

    decision
}

/// Pre-trade advisories for buying `side` of `proposed`
fn checklist(
    ctx: &Context,
    ledger: &Ledger,
    proposed: &ProposedTrade,
    side: Side,
    thesis: &str,
) -> Vec<Advisory> {
    let status = ledger.status(ctx.config.portfolio.starting_balance);
    let input =
        ChecklistInput::with_status(side, proposed.entry_price, proposed.amount, thesis, &status);
    let advisories = run_checklist(&input);
    for advisory in &advisories {
        tracing::debug!(severity = %advisory.severity(), "{advisory}");
    }
    advisories
}

#[derive(Serialize)]
struct CheckOutput<'a> {
    trade: &'a ProposedTrade,
    side: Side,
    decision: &'a RiskDecision,
    advisories: &'a [Advisory],
    advisory: Option<&'static str>,
}

fn print_decision(decision: &RiskDecision, advisories: &[Advisory], advisory: Option<&str>) {
    for line in decision.lines() {
        println!("{line}");
    }
    for item in advisories {
        println!("{}: {item}", item.severity());
    }
    if let Some(advisory) = advisory {
        println!("NOTE: {advisory}");
    }
}

#[derive(Args, Debug)]
pub struct CheckArgs {
    #[command(flatten)]
    pub trade: TradeArgs,

    /// Outcome that would be bought (yes or no)
    #[arg(long, default_value = "yes")]
    pub side: Side,

    /// Trade thesis, checked for clarity
    #[arg(long, default_value = "")]
    pub reason: String,

    #[command(flatten)]
    pub exits: ExitRuleArgs,
}

impl CheckArgs {
    pub async fn execute(&self, ctx: &Context) -> anyhow::Result<()> {
        self.exits.validate()?;
        let proposed = self.trade.resolve(ctx).await?;
        let ledger = ctx.ledger_store().load()?;
        let classifier = ctx.classifier()?;

        let decision = assess(ctx, &ledger, &classifier, &proposed);
        let advisories = checklist(ctx, &ledger, &proposed, self.side, &self.reason);
        let target = self.exits.to_target();
        let advisory = exit_advisory(target.as_ref());

        if ctx.json {
            return ctx.print_json(&CheckOutput {
                trade: &proposed,
                side: self.side,
                decision: &decision,
                advisories: &advisories,
                advisory,
            });
        }

        println!(
            "Risk check: ${} {} on {} @ {}%",
            proposed.amount,
            self.side,
            truncate(&proposed.title, 60),
            proposed.entry_price
        );
        let tags = classifier.classify_market(&proposed.market, &proposed.title);
        if !tags.is_empty() {
            let names: Vec<&str> = tags.iter().map(|t| t.as_str()).collect();
            println!("Narratives: {}", names.join(", "));
        }
        print_decision(&decision, &advisories, advisory);
        println!(
            "{}",
            if decision.admitted {
                "Trade would be ADMITTED"
            } else {
                "Trade would be DENIED"
            }
        );
        Ok(())
    }
}

#[derive(Args, Debug)]
pub struct BuyArgs {
    /// Market slug
    pub market: String,
    /// Outcome to buy (yes or no)
    pub side: Side,
    /// Dollars to commit
    pub amount: Decimal,
    /// Entry YES price in percent; fetched from Gamma when omitted
    #[arg(long)]
    pub price: Option<Decimal>,
    /// Market question; fetched when omitted
    #[arg(long)]
    pub title: Option<String>,
    /// Trade thesis
    #[arg(long, default_value = "")]
    pub reason: String,

    #[command(flatten)]
    pub exits: ExitRuleArgs,
}

#[derive(Serialize)]
struct BuyOutput<'a> {
    decision: &'a RiskDecision,
    position: Option<&'a Position>,
    target: Option<&'a ExitTarget>,
    advisories: &'a [Advisory],
    advisory: Option<&'static str>,
}

impl BuyArgs {
    pub async fn execute(&self, ctx: &Context) -> anyhow::Result<()> {
        self.exits.validate()?;
        let trade = TradeArgs {
            market: self.market.clone(),
            amount: self.amount,
            price: self.price,
            title: self.title.clone(),
        };
        let proposed = trade.resolve(ctx).await?;

        let ledger_store = ctx.ledger_store();
        let mut ledger = ledger_store.load()?;
        let classifier = ctx.classifier()?;

        let decision = assess(ctx, &ledger, &classifier, &proposed);
        let advisories = checklist(ctx, &ledger, &proposed, self.side, &self.reason);
        let target = self.exits.to_target();
        let advisory = exit_advisory(target.as_ref());

        if !decision.admitted {
            if ctx.json {
                ctx.print_json(&BuyOutput {
                    decision: &decision,
                    position: None,
                    target: None,
                    advisories: &advisories,
                    advisory,
                })?;
            } else {
                print_decision(&decision, &advisories, None);
            }
            anyhow::bail!(
                "trade blocked by {} risk check(s)",
                decision.violations().count()
            );
        }

        let position = ledger.open(
            OpenRequest {
                market: proposed.market.clone(),
                title: proposed.title.clone(),
                side: self.side,
                amount: proposed.amount,
                entry_price: proposed.entry_price,
                reason: self.reason.clone(),
            },
            Utc::now(),
        )?;
        let position = position.clone();
        ledger_store.save(&ledger)?;

        if let Some(target) = &target {
            let target_store = ctx.target_store();
            let mut book = target_store.load()?;
            book.set(position.id, target.clone());
            target_store.save(&book)?;
        }

        tracing::info!(
            id = position.id,
            market = %position.market,
            side = %position.side,
            amount = %position.amount,
            entry_price = %position.entry_price,
            "Paper trade opened"
        );

        if ctx.json {
            return ctx.print_json(&BuyOutput {
                decision: &decision,
                position: Some(&position),
                target: target.as_ref(),
                advisories: &advisories,
                advisory,
            });
        }

        print_decision(&decision, &advisories, advisory);
        println!();
        println!("PAPER TRADE OPENED #{}", position.id);
        println!("  {}", truncate(&position.title, 60));
        println!("  Position: {} @ {}%", position.side, position.entry_price);
        println!("  Amount:   ${}", position.amount.round_dp(2));
        println!("  Shares:   {}", position.shares.round_dp(2));
        if !position.reason.is_empty() {
            println!("  Reason:   {}", position.reason);
        }
        if let Some(target) = &target {
            print_target(target);
        }
        Ok(())
    }
}

pub(super) fn print_target(target: &ExitTarget) {
    if let Some(tp) = target.take_profit {
        println!("  Take profit:   {}%", tp);
    }
    if let Some(sl) = target.stop_loss {
        println!("  Stop loss:     {}%", sl);
    }
    if let Some(ts) = target.trailing_stop {
        println!("  Trailing stop: {}pp", ts);
    }
}

#[derive(Args, Debug)]
pub struct CloseArgs {
    /// Position id
    pub id: u64,
    /// Exit YES price in percent; fetched from Gamma when omitted
    #[arg(long)]
    pub price: Option<Decimal>,
}

impl CloseArgs {
    pub async fn execute(&self, ctx: &Context) -> anyhow::Result<()> {
        let ledger_store = ctx.ledger_store();
        let mut ledger = ledger_store.load()?;

        let market = ledger
            .get(self.id)
            .map(|p| p.market.clone())
            .ok_or_else(|| anyhow::anyhow!("position #{} not found", self.id))?;

        let exit_price = match self.price {
            Some(price) => price,
            None => ctx
                .gamma()?
                .current_price(&market)
                .await
                .ok_or_else(|| anyhow::anyhow!("could not fetch current price for {market}"))?,
        };

        let position = ledger.close(self.id, exit_price, Utc::now())?.clone();
        ledger_store.save(&ledger)?;
        remove_target(ctx, self.id)?;

        if ctx.json {
            return ctx.print_json(&position);
        }

        let pnl = position.pnl.unwrap_or_default();
        println!("PAPER TRADE CLOSED #{}", position.id);
        println!("  {}", truncate(&position.title, 60));
        println!(
            "  {}: {}% -> {}%",
            position.side, position.entry_price, exit_price
        );
        println!(
            "  P&L: ${} ({}%)",
            pnl.round_dp(2),
            position.pnl_pct.unwrap_or_default().round_dp(1)
        );
        Ok(())
    }
}

/// Market outcome for a resolved position
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Outcome {
    Won,
    Lost,
}

#[derive(Args, Debug)]
pub struct ResolveArgs {
    /// Position id
    pub id: u64,
    /// Whether the position's side won
    #[arg(value_enum)]
    pub outcome: Outcome,
}

impl ResolveArgs {
    pub async fn execute(&self, ctx: &Context) -> anyhow::Result<()> {
        let ledger_store = ctx.ledger_store();
        let mut ledger = ledger_store.load()?;

        let won = self.outcome == Outcome::Won;
        let position = ledger.resolve(self.id, won, Utc::now())?.clone();
        ledger_store.save(&ledger)?;
        remove_target(ctx, self.id)?;

        if ctx.json {
            return ctx.print_json(&position);
        }

        println!(
            "POSITION RESOLVED #{}: {}",
            position.id,
            if won { "WON" } else { "LOST" }
        );
        println!("  {}", truncate(&position.title, 60));
        println!("  P&L: ${}", position.pnl.unwrap_or_default().round_dp(2));
        Ok(())
    }
}

/// Drop the exit target of a position that is no longer open
fn remove_target(ctx: &Context, id: u64) -> anyhow::Result<()> {
    let store = ctx.target_store();
    let mut book = store.load()?;
    if book.remove(id).is_some() {
        store.save(&book)?;
    }
    Ok(())
}
