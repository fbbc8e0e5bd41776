//! Metrics collection and exposition.
//!
//! # Metrics
//! - `maverick_requests_total` (counter): requests by method, status
//! - `maverick_request_duration_seconds` (histogram): full cycle latency
//! - `maverick_failures_total` (counter): translated failures by kind
//!
//! # Design Decisions
//! - Recording is a no-op until an exporter is installed
//! - Prometheus exporter serves its own HTTP listener

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

use crate::failure::FailureKind;

/// Install the Prometheus exporter on `addr`.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_request(method: &str, status: u16, start: Instant) {
    counter!(
        "maverick_requests_total",
        "method" => method.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
    histogram!("maverick_request_duration_seconds").record(start.elapsed().as_secs_f64());
}

pub fn record_failure(kind: FailureKind) {
    counter!("maverick_failures_total", "kind" => kind.as_str()).increment(1);
}
