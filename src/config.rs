//! Configuration types for poly-guard

use crate::narrative::NarrativeTag;
use crate::telemetry::LogFormat;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Config file could not be read
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// Config file is not valid TOML for this schema
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    /// A value is outside its allowed range
    #[error("invalid config value `{key}`: {reason}")]
    Invalid { key: &'static str, reason: String },
}

/// Root configuration structure
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub risk: RiskConfig,
    pub portfolio: PortfolioConfig,
    pub monitor: MonitorConfig,
    pub telemetry: TelemetryConfig,
    /// Per-narrative keyword and limit overrides, keyed by tag
    pub narratives: BTreeMap<NarrativeTag, NarrativeConfig>,
}

/// Risk limits applied by the admission gate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RiskConfig {
    /// Largest single trade in dollars
    pub max_position_size: Decimal,
    /// Absolute daily loss that halts new trades
    pub max_daily_loss: Decimal,
    /// Daily loss as a percentage of bankroll that halts new trades
    pub max_daily_loss_pct: Decimal,
    /// Maximum concurrent open positions
    pub max_open_positions: usize,
    /// Maximum dollars committed to a single market
    pub max_market_exposure: Decimal,
    /// Default maximum dollars committed to a single narrative
    pub max_narrative_exposure: Decimal,
    /// Entry price (percent) above which the payoff is flagged as asymmetric
    pub asymmetric_risk_threshold: Decimal,
    /// Fraction of full Kelly used by the sizing advisor
    pub kelly_fraction: Decimal,
}

impl Default for RiskConfig {
    fn default() -> Self {
        Self {
            max_position_size: dec!(100),
            max_daily_loss: dec!(50),
            max_daily_loss_pct: dec!(5),
            max_open_positions: 5,
            max_market_exposure: dec!(200),
            max_narrative_exposure: dec!(400),
            asymmetric_risk_threshold: dec!(85),
            kelly_fraction: dec!(0.25), // quarter Kelly
        }
    }
}

/// Paper portfolio and its stores
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PortfolioConfig {
    /// Paper money the ledger starts with
    pub starting_balance: Decimal,
    /// Position ledger file
    pub ledger_path: PathBuf,
    /// Exit target file
    pub targets_path: PathBuf,
    /// Manual narrative tags file
    pub overrides_path: PathBuf,
}

impl Default for PortfolioConfig {
    fn default() -> Self {
        Self {
            starting_balance: dec!(10000),
            ledger_path: PathBuf::from("./data/paper_trades.json"),
            targets_path: PathBuf::from("./data/exit_targets.json"),
            overrides_path: PathBuf::from("./data/correlations.json"),
        }
    }
}

/// Exit monitor configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    /// Seconds between exit scans in watch mode
    pub poll_interval_secs: u64,
    /// Gamma API base URL used for prices
    pub gamma_url: String,
    /// Per-request timeout for price lookups
    pub request_timeout_secs: u64,
    /// Close triggered positions at the observed price
    pub auto_close: bool,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: 300,
            gamma_url: crate::market::GAMMA_API_URL.to_string(),
            request_timeout_secs: 10,
            auto_close: false,
        }
    }
}

/// Telemetry configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TelemetryConfig {
    pub log_level: String,
    pub log_format: LogFormat,
    /// Prometheus exporter port, only bound by the watch loop
    pub metrics_port: Option<u16>,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_port: None,
        }
    }
}

/// Overrides for one narrative
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct NarrativeConfig {
    /// Replaces the built-in keyword list when set
    pub keywords: Option<Vec<String>>,
    /// Dollar limit for this narrative, replacing `risk.max_narrative_exposure`
    pub max_exposure: Option<Decimal>,
    pub description: Option<String>,
}

impl Config {
    /// Load configuration from a TOML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }

    /// Parse and validate configuration from TOML text
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the risk core cannot work with
    pub fn validate(&self) -> Result<(), ConfigError> {
        let risk = &self.risk;
        let positive = [
            ("risk.max_position_size", risk.max_position_size),
            ("risk.max_daily_loss", risk.max_daily_loss),
            ("risk.max_daily_loss_pct", risk.max_daily_loss_pct),
            ("risk.max_market_exposure", risk.max_market_exposure),
            ("risk.max_narrative_exposure", risk.max_narrative_exposure),
            ("portfolio.starting_balance", self.portfolio.starting_balance),
        ];
        for (key, value) in positive {
            if value <= Decimal::ZERO {
                return Err(ConfigError::Invalid {
                    key,
                    reason: format!("must be positive, got {value}"),
                });
            }
        }

        if risk.max_open_positions == 0 {
            return Err(ConfigError::Invalid {
                key: "risk.max_open_positions",
                reason: "must be at least 1".to_string(),
            });
        }

        if risk.asymmetric_risk_threshold <= Decimal::ZERO
            || risk.asymmetric_risk_threshold > Decimal::ONE_HUNDRED
        {
            return Err(ConfigError::Invalid {
                key: "risk.asymmetric_risk_threshold",
                reason: format!(
                    "must be within (0, 100], got {}",
                    risk.asymmetric_risk_threshold
                ),
            });
        }

        if risk.kelly_fraction <= Decimal::ZERO || risk.kelly_fraction > Decimal::ONE {
            return Err(ConfigError::Invalid {
                key: "risk.kelly_fraction",
                reason: format!("must be within (0, 1], got {}", risk.kelly_fraction),
            });
        }

        for (tag, narrative) in &self.narratives {
            if let Some(limit) = narrative.max_exposure {
                if limit <= Decimal::ZERO {
                    return Err(ConfigError::Invalid {
                        key: "narratives.max_exposure",
                        reason: format!("{tag} limit must be positive, got {limit}"),
                    });
                }
            }
        }

        if self.monitor.poll_interval_secs == 0 {
            return Err(ConfigError::Invalid {
                key: "monitor.poll_interval_secs",
                reason: "must be at least 1".to_string(),
            });
        }

        Ok(())
    }
}
