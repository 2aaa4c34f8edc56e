//! Metrics collection and exposition.
//!
//! # Responsibilities
//! - Define gateway metrics (request counts, latency, outcomes)
//! - Expose a Prometheus-compatible metrics endpoint
//!
//! # Metrics
//! - `gateway_requests_total` (counter): requests by method, status,
//!   and dispatch outcome
//! - `gateway_request_duration_seconds` (histogram): latency
//!   distribution by method and outcome
//!
//! # Design Decisions
//! - Low-overhead metric updates (atomic operations)
//! - The dispatch outcome label (route, asset, passthrough, unrouted,
//!   error) makes fallback traffic visible without extra counters

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus recorder and scrape endpoint. Failure is
/// logged, not fatal; the gateway serves traffic without metrics.
pub fn init_metrics(address: SocketAddr) {
    match PrometheusBuilder::new()
        .with_http_listener(address)
        .install()
    {
        Ok(()) => tracing::info!(address = %address, "metrics exporter listening"),
        Err(error) => {
            tracing::error!(address = %address, error = %error, "failed to install metrics exporter")
        }
    }
}

/// Record one finished request.
pub fn record_request(method: &str, status: u16, outcome: &str, start: Instant) {
    let elapsed = start.elapsed().as_secs_f64();

    metrics::counter!(
        "gateway_requests_total",
        "method" => method.to_string(),
        "status" => status.to_string(),
        "outcome" => outcome.to_string(),
    )
    .increment(1);

    metrics::histogram!(
        "gateway_request_duration_seconds",
        "method" => method.to_string(),
        "outcome" => outcome.to_string(),
    )
    .record(elapsed);
}
