//! Telemetry module
//!
//! Logging and Prometheus metrics

mod logging;
mod metrics;

pub use logging::{init_logging, LogFormat};
pub use self::metrics::{
    increment, record_trigger, serve_metrics, set_gauge, set_narrative_exposure, CounterMetric,
    GaugeMetric,
};

use crate::config::TelemetryConfig;

/// Initialize logging from configuration
///
/// The metrics exporter is started separately by long-running commands.
pub fn init_telemetry(config: &TelemetryConfig) -> anyhow::Result<()> {
    init_logging(&config.log_level, config.log_format)
}
