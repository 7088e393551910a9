//! Metrics collection and exposition.
//!
//! # Metrics
//! - `stitch_http_requests_total` (counter): requests by route, status
//! - `stitch_http_request_duration_seconds` (histogram): handler latency
//! - `stitch_submission_status_total` (counter): lifecycle updates by status
//! - `stitch_anchor_total` (counter): server-side anchor outcomes
//! - `stitch_receipt_store_size` (gauge): receipts held in memory
//! - `stitch_node_health` (gauge): 1=healthy, 0=unhealthy

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus exporter with its own HTTP listener.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

/// Record one handled API request.
pub fn record_request(route: &str, status: u16, start: Instant) {
    let route = route.to_string();
    let status = status.to_string();
    counter!("stitch_http_requests_total", "route" => route.clone(), "status" => status).increment(1);
    histogram!("stitch_http_request_duration_seconds", "route" => route)
        .record(start.elapsed().as_secs_f64());
}

/// Record a lifecycle update delivered by a submission tracker.
pub fn record_submission_status(status: &'static str) {
    counter!("stitch_submission_status_total", "status" => status).increment(1);
}

/// Record the outcome of a server-signed anchor request.
pub fn record_anchor(outcome: &'static str) {
    counter!("stitch_anchor_total", "outcome" => outcome).increment(1);
}

/// Record the current receipt store size.
pub fn record_receipt_store_size(size: usize) {
    gauge!("stitch_receipt_store_size").set(size as f64);
}

/// Record node reachability.
pub fn record_node_health(endpoint: &str, healthy: bool) {
    gauge!("stitch_node_health", "endpoint" => endpoint.to_string())
        .set(if healthy { 1.0 } else { 0.0 });
}
