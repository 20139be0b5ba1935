//! Metrics collection and exposition.
//!
//! # Metrics
//! - `http_requests_total` (counter): responses written, by method and status
//! - `http_request_duration_seconds` (histogram): read-to-write latency
//! - `http_connections_active` (gauge): connections currently being served
//! - `http_connection_errors_total` (counter): aborted connections, by kind
//!
//! # Design Decisions
//! - Recording is always on; without an installed recorder it is a no-op
//! - The Prometheus endpoint is opt-in via `observability.metrics_enabled`

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

/// Install the Prometheus recorder and its scrape endpoint.
///
/// Must be called from within a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics endpoint listening");
    Ok(())
}

pub fn record_request(method: &str, status: u16, start: Instant) {
    metrics::counter!(
        "http_requests_total",
        "method" => method.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
    metrics::histogram!("http_request_duration_seconds").record(start.elapsed().as_secs_f64());
}

pub fn connection_opened() {
    metrics::gauge!("http_connections_active").increment(1.0);
}

pub fn connection_closed() {
    metrics::gauge!("http_connections_active").decrement(1.0);
}

pub fn record_connection_error(kind: &'static str) {
    metrics::counter!("http_connection_errors_total", "kind" => kind).increment(1);
}
