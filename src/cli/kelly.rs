//! Kelly command implementation

use super::Context;
use crate::risk::{odds_from_price, KellyCalculator};
use clap::Args;
use rust_decimal::Decimal;
use serde::Serialize;

#[derive(Args, Debug)]
pub struct KellyArgs {
    /// Estimated probability of winning, between 0 and 1
    pub win_prob: Decimal,

    /// Decimal odds (payout per $1 staked, including the stake)
    #[arg(long, conflicts_with = "price", required_unless_present = "price")]
    pub odds: Option<Decimal>,

    /// Entry price in percent, converted to odds as 100 / price
    #[arg(long)]
    pub price: Option<Decimal>,

    /// Bankroll in dollars; defaults to the paper portfolio's bankroll
    #[arg(long)]
    pub bankroll: Option<Decimal>,

    /// Kelly fraction; defaults to `risk.kelly_fraction`
    #[arg(long)]
    pub fraction: Option<Decimal>,
}

#[derive(Serialize)]
struct KellyOutput {
    win_prob: Decimal,
    decimal_odds: Decimal,
    bankroll: Decimal,
    fraction: Decimal,
    stake: Decimal,
}

impl KellyArgs {
    pub async fn execute(&self, ctx: &Context) -> anyhow::Result<()> {
        let decimal_odds = match (self.odds, self.price) {
            (Some(odds), _) => odds,
            (None, Some(price)) => odds_from_price(price)
                .ok_or_else(|| anyhow::anyhow!("--price must be within (0, 100], got {price}"))?,
            (None, None) => anyhow::bail!("give --odds or --price"),
        };

        let bankroll = match self.bankroll {
            Some(bankroll) => bankroll,
            None => ctx
                .ledger_store()
                .load()?
                .bankroll(ctx.config.portfolio.starting_balance),
        };
        let fraction = self.fraction.unwrap_or(ctx.config.risk.kelly_fraction);

        let stake = KellyCalculator::new(fraction).size(self.win_prob, decimal_odds, bankroll);

        if ctx.json {
            return ctx.print_json(&KellyOutput {
                win_prob: self.win_prob,
                decimal_odds,
                bankroll,
                fraction,
                stake,
            });
        }

        println!(
            "Kelly ({}x) at p={} and odds {}: stake ${} of ${}",
            fraction,
            self.win_prob,
            decimal_odds.round_dp(3),
            stake.round_dp(2),
            bankroll.round_dp(2)
        );
        if stake.is_zero() {
            println!("No edge: do not bet.");
        }
        Ok(())
    }
}
