//! Metrics collection and exposition.
//!
//! # Metrics
//! - `relay_requests_total` (counter): requests by method and status
//! - `relay_request_duration_seconds` (histogram): latency by method
//!
//! # Design Decisions
//! - Low-overhead updates (atomic operations in the recorder)
//! - Labels carry the outbound method and the final response status
//! - The Prometheus exporter runs on its own address and is optional

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus exporter on `addr` and register metric
/// descriptions. Failure to bind is logged, not fatal.
pub fn init_metrics(addr: SocketAddr) {
    let builder = PrometheusBuilder::new().with_http_listener(addr);
    if let Err(err) = builder.install() {
        tracing::error!(address = %addr, error = %err, "Failed to install metrics exporter");
        return;
    }

    metrics::describe_counter!(
        "relay_requests_total",
        "Total relayed requests by outbound method and response status"
    );
    metrics::describe_histogram!(
        "relay_request_duration_seconds",
        "End-to-end relay latency by outbound method"
    );
    tracing::info!(address = %addr, "Metrics exporter listening");
}

/// Record one finished relay request.
pub fn record_request(method: &str, status: u16, start_time: Instant) {
    let elapsed = start_time.elapsed().as_secs_f64();
    metrics::counter!(
        "relay_requests_total",
        "method" => method.to_string(),
        "status" => status.to_string(),
    )
    .increment(1);
    metrics::histogram!(
        "relay_request_duration_seconds",
        "method" => method.to_string(),
    )
    .record(elapsed);
}
