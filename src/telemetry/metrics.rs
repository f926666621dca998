//! Prometheus metrics

use crate::narrative::NarrativeTag;
use metrics::{counter, gauge};
use metrics_exporter_prometheus::PrometheusBuilder;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use std::net::SocketAddr;

/// Gauge metric types
#[derive(Debug, Clone, Copy)]
pub enum GaugeMetric {
    /// Open position count
    OpenPositions,
    /// Dollars committed to open positions
    TotalExposure,
    /// Realized P&L for the current UTC day
    DailyPnl,
    /// Cash available after open positions
    Bankroll,
    /// Unrealized P&L across priced open positions
    UnrealizedPnl,
}

impl GaugeMetric {
    pub fn name(&self) -> &'static str {
        match self {
            GaugeMetric::OpenPositions => "polyguard_open_positions",
            GaugeMetric::TotalExposure => "polyguard_total_exposure_usd",
            GaugeMetric::DailyPnl => "polyguard_daily_pnl_usd",
            GaugeMetric::Bankroll => "polyguard_bankroll_usd",
            GaugeMetric::UnrealizedPnl => "polyguard_unrealized_pnl_usd",
        }
    }
}

/// Counter metric types
#[derive(Debug, Clone, Copy)]
pub enum CounterMetric {
    /// Completed exit scans
    Scans,
    /// Exit rules that fired
    ExitTriggers,
    /// Positions skipped for lack of a price
    PriceMisses,
    /// Trades admitted by the risk gate
    GateAdmitted,
    /// Trades denied by the risk gate
    GateDenied,
}

impl CounterMetric {
    pub fn name(&self) -> &'static str {
        match self {
            CounterMetric::Scans => "polyguard_exit_scans_total",
            CounterMetric::ExitTriggers => "polyguard_exit_triggers_total",
            CounterMetric::PriceMisses => "polyguard_price_misses_total",
            CounterMetric::GateAdmitted => "polyguard_gate_admitted_total",
            CounterMetric::GateDenied => "polyguard_gate_denied_total",
        }
    }
}

const NARRATIVE_EXPOSURE: &str = "polyguard_narrative_exposure_usd";

/// Set a gauge value
pub fn set_gauge(metric: GaugeMetric, value: Decimal) {
    gauge!(metric.name()).set(value.to_f64().unwrap_or_default());
}

/// Set the exposure gauge of one narrative
pub fn set_narrative_exposure(tag: NarrativeTag, value: Decimal) {
    gauge!(NARRATIVE_EXPOSURE, "narrative" => tag.as_str()).set(value.to_f64().unwrap_or_default());
}

/// Increment a counter
pub fn increment(metric: CounterMetric, by: u64) {
    counter!(metric.name()).increment(by);
}

/// Increment the trigger counter for one exit rule
pub fn record_trigger(kind: &'static str) {
    counter!(CounterMetric::ExitTriggers.name(), "kind" => kind).increment(1);
}

/// Install the Prometheus recorder and serve `/metrics` on `port`
///
/// Must be called from inside a tokio runtime.
pub fn serve_metrics(port: u16) -> anyhow::Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .map_err(|e| anyhow::anyhow!("Failed to start metrics exporter: {}", e))?;

    tracing::info!(%addr, "Prometheus metrics exporter listening");
    Ok(())
}
