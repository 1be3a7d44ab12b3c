//! Metrics collection and exposition.
//!
//! # Metrics
//! - `proxy_exchanges_total` (counter): exchanges by method, status
//! - `proxy_exchange_duration_seconds` (histogram): accept to interception
//! - `proxy_audit_records_total` (counter): records by outcome (emitted, dropped, failed)
//! - `proxy_capture_failures_total` (counter): aborted captures by direction
//!
//! Recording is a no-op until [`init_metrics`] installs the exporter.

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

/// Install the Prometheus recorder and its scrape endpoint on `addr`.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics endpoint listening");
    Ok(())
}

/// Count a finished exchange.
pub fn record_exchange(method: &str, status: u16, start: Instant) {
    metrics::counter!(
        "proxy_exchanges_total",
        "method" => method.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
    metrics::histogram!("proxy_exchange_duration_seconds").record(start.elapsed().as_secs_f64());
}

/// Count an audit record outcome.
pub fn record_audit(outcome: &'static str) {
    metrics::counter!("proxy_audit_records_total", "outcome" => outcome).increment(1);
}

/// Count an exchange aborted because a body could not be captured.
pub fn record_capture_failure(direction: &'static str) {
    metrics::counter!("proxy_capture_failures_total", "direction" => direction).increment(1);
}
