//! Portfolio commands: status, list

use super::{truncate, Context};
use crate::ledger::{PortfolioStatus, Position, PositionStatus};
use chrono::Utc;
use clap::{Args, ValueEnum};
use rust_decimal::Decimal;
use serde::Serialize;

#[derive(Args, Debug)]
pub struct StatusArgs {}

#[derive(Serialize)]
struct StatusOutput {
    #[serde(flatten)]
    status: PortfolioStatus,
    daily_pnl: Decimal,
}

impl StatusArgs {
    pub async fn execute(&self, ctx: &Context) -> anyhow::Result<()> {
        let ledger = ctx.ledger_store().load()?;
        let status = ledger.status(ctx.config.portfolio.starting_balance);
        let daily_pnl = ledger.daily_pnl(Utc::now().date_naive());

        if ctx.json {
            return ctx.print_json(&StatusOutput { status, daily_pnl });
        }

        println!("PAPER TRADING PORTFOLIO");
        println!("  Starting balance: ${}", status.starting_balance.round_dp(2));
        println!("  Current balance:  ${}", status.current_balance.round_dp(2));
        println!("  Invested:         ${}", status.total_invested.round_dp(2));
        println!("  Realized P&L:     ${}", status.realized_pnl.round_dp(2));
        println!("  Today's P&L:      ${}", daily_pnl.round_dp(2));
        println!("  Open positions:   {}", status.open_positions);
        println!(
            "  Closed trades:    {} ({}W / {}L, win rate {}%)",
            status.closed_trades,
            status.wins,
            status.losses,
            status.win_rate.round_dp(1)
        );

        let open: Vec<&Position> = ledger.open_positions().collect();
        if !open.is_empty() {
            println!();
            println!("OPEN POSITIONS");
            for p in open {
                print_position(p);
            }
        }
        Ok(())
    }
}

/// Which positions to list
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StatusFilter {
    All,
    Open,
    Closed,
    Resolved,
}

impl StatusFilter {
    fn matches(&self, status: PositionStatus) -> bool {
        match self {
            StatusFilter::All => true,
            StatusFilter::Open => status == PositionStatus::Open,
            StatusFilter::Closed => status == PositionStatus::Closed,
            StatusFilter::Resolved => status == PositionStatus::Resolved,
        }
    }
}

#[derive(Args, Debug)]
pub struct ListArgs {
    /// Only show positions in this state
    #[arg(long, value_enum, default_value = "all")]
    pub status: StatusFilter,
}

impl ListArgs {
    pub async fn execute(&self, ctx: &Context) -> anyhow::Result<()> {
        let ledger = ctx.ledger_store().load()?;
        let positions: Vec<&Position> = ledger
            .positions()
            .iter()
            .filter(|p| self.status.matches(p.status))
            .collect();

        if ctx.json {
            return ctx.print_json(&positions);
        }

        if positions.is_empty() {
            println!("No positions.");
            return Ok(());
        }
        for p in positions {
            print_position(p);
        }
        Ok(())
    }
}

fn print_position(p: &Position) {
    let outcome = match (p.status, p.pnl) {
        (PositionStatus::Open, _) | (_, None) => String::new(),
        (_, Some(pnl)) => format!(
            " -> {}% P&L ${}",
            p.exit_price.unwrap_or_default(),
            pnl.round_dp(2)
        ),
    };
    println!(
        "  #{:<4} [{}] {} {} ${} @ {}%{}",
        p.id,
        p.status,
        truncate(&p.title, 50),
        p.side,
        p.amount.round_dp(2),
        p.entry_price,
        outcome
    );
}
