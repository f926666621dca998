//! Gamma API client for market prices
//!
//! Looks markets up by slug. Gamma reports outcome prices as probabilities in
//! `[0, 1]`, usually as a JSON-encoded string array; the first entry is the
//! YES price.

use super::{MarketQuote, PriceSource};
use crate::config::MonitorConfig;
use async_trait::async_trait;
use reqwest::Client;
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::Value;
use std::str::FromStr;
use std::time::Duration;

/// Gamma API base URL
pub const GAMMA_API_URL: &str = "https://gamma-api.polymarket.com";

/// Configuration for the Gamma client
#[derive(Debug, Clone)]
pub struct GammaConfig {
    /// Base URL for the Gamma API
    pub base_url: String,
    /// Request timeout
    pub timeout: Duration,
}

impl Default for GammaConfig {
    fn default() -> Self {
        Self {
            base_url: GAMMA_API_URL.to_string(),
            timeout: Duration::from_secs(10),
        }
    }
}

impl From<&MonitorConfig> for GammaConfig {
    fn from(config: &MonitorConfig) -> Self {
        Self {
            base_url: config.gamma_url.trim_end_matches('/').to_string(),
            timeout: Duration::from_secs(config.request_timeout_secs),
        }
    }
}

/// Client for Polymarket's Gamma API
pub struct GammaClient {
    config: GammaConfig,
    client: Client,
}

impl GammaClient {
    /// Create a new client with default configuration
    pub fn new() -> anyhow::Result<Self> {
        Self::with_config(GammaConfig::default())
    }

    /// Create a new client with custom configuration
    pub fn with_config(config: GammaConfig) -> anyhow::Result<Self> {
        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self { config, client })
    }

    pub fn base_url(&self) -> &str {
        &self.config.base_url
    }

    /// Fetch a market by slug
    ///
    /// `Ok(None)` when Gamma does not know the slug.
    pub async fn fetch_quote(&self, slug: &str) -> anyhow::Result<Option<MarketQuote>> {
        let url = format!("{}/markets", self.config.base_url);

        tracing::debug!(url = %url, slug, "Fetching market from Gamma API");

        let response = self
            .client
            .get(&url)
            .query(&[("slug", slug)])
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Gamma API error: {} - {}", status, body);
        }

        let markets: Vec<GammaMarket> = response.json().await?;

        Ok(markets.into_iter().next().map(|m| m.into_quote(slug)))
    }
}

#[async_trait]
impl PriceSource for GammaClient {
    async fn current_price(&self, market: &str) -> Option<Decimal> {
        match self.fetch_quote(market).await {
            Ok(Some(quote)) => {
                if quote.yes_price.is_none() {
                    tracing::warn!(market, "Gamma market has no outcome prices");
                }
                quote.yes_price
            }
            Ok(None) => {
                tracing::warn!(market, "Market not found on Gamma");
                None
            }
            Err(e) => {
                tracing::warn!(market, error = %e, "Price lookup failed");
                None
            }
        }
    }
}

/// Raw market response from Gamma API
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GammaMarket {
    #[serde(default)]
    slug: Option<String>,
    #[serde(default)]
    question: Option<String>,
    /// Outcome prices, either a JSON string or an array
    #[serde(default)]
    outcome_prices: Option<Value>,
    #[serde(default)]
    active: bool,
    #[serde(default)]
    closed: bool,
}

impl GammaMarket {
    fn into_quote(self, requested_slug: &str) -> MarketQuote {
        let yes_price = self.outcome_prices.as_ref().and_then(parse_outcome_price);
        let slug = self.slug.unwrap_or_else(|| requested_slug.to_string());
        MarketQuote {
            question: self.question.unwrap_or_else(|| slug.clone()),
            slug,
            yes_price,
            active: self.active,
            closed: self.closed,
        }
    }
}

/// Parse the YES price, as a percentage, from `outcomePrices`
///
/// Accepts `"[\"0.52\", \"0.48\"]"`, `"[0.52, 0.48]"` and a plain array.
/// A probability outside `[0, 1]` is malformed and yields `None`.
fn parse_outcome_price(prices: &Value) -> Option<Decimal> {
    let decoded;
    let prices = match prices {
        Value::String(s) => {
            decoded = serde_json::from_str::<Value>(s).ok()?;
            &decoded
        }
        other => other,
    };

    let first = prices.as_array()?.first()?;
    let probability = match first {
        Value::String(s) => parse_decimal(s.trim())?,
        Value::Number(n) => parse_decimal(&n.to_string())?,
        _ => return None,
    };

    if probability < Decimal::ZERO || probability > Decimal::ONE {
        return None;
    }
    probability.checked_mul(Decimal::ONE_HUNDRED)
}

fn parse_decimal(s: &str) -> Option<Decimal> {
    Decimal::from_str(s)
        .or_else(|_| Decimal::from_scientific(s))
        .ok()
}
