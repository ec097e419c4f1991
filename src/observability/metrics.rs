//! Metrics collection and exposition.
//!
//! # Metrics
//! - `auv_admission_decisions_total` (counter): by decision
//! - `auv_requests_total` (counter): by method, status
//! - `auv_request_duration_seconds` (histogram)
//! - `auv_tracked_clients` (gauge): rate limiter records held
//! - `auv_control_updates_total` (counter): by control
//!
//! Without an installed recorder these calls are no-ops.

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

/// Install the Prometheus exporter with its own HTTP listener.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics exporter listening");
    Ok(())
}

pub fn record_admission(decision: &'static str) {
    metrics::counter!("auv_admission_decisions_total", "decision" => decision).increment(1);
}

pub fn record_request(method: &str, status: u16, start: Instant) {
    metrics::counter!(
        "auv_requests_total",
        "method" => method.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
    metrics::histogram!("auv_request_duration_seconds").record(start.elapsed().as_secs_f64());
}

pub fn record_tracked_clients(count: usize) {
    metrics::gauge!("auv_tracked_clients").set(count as f64);
}

pub fn record_control_update(control: &'static str) {
    metrics::counter!("auv_control_updates_total", "control" => control).increment(1);
}
