//! Metrics collection and exposition.
//!
//! # Metrics
//! - `ratelimit_checks_total` (counter): limiter calls by group, outcome
//! - `ratelimit_exceeded_total` (counter): limited requests by group, action
//! - `ratelimit_tracker_events_total` (counter): events delivered by tracker
//! - `ratelimit_tracker_failures_total` (counter): events lost by tracker
//! - `gate_requests_total` (counter): forwarded requests by method, status
//! - `gate_request_duration_seconds` (histogram): forwarding latency

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus exporter listening on `addr`.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint started"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to start metrics endpoint"),
    }
}

/// Record the outcome of one limiter call.
pub fn record_check(group: &str, limited: bool) {
    let outcome = if limited { "limited" } else { "allowed" };
    metrics::counter!(
        "ratelimit_checks_total",
        "group" => group.to_string(),
        "outcome" => outcome
    )
    .increment(1);
}

/// Record a limited request and what was done with it.
pub fn record_exceeded(group: &str, action: &'static str) {
    metrics::counter!(
        "ratelimit_exceeded_total",
        "group" => group.to_string(),
        "action" => action
    )
    .increment(1);
}

pub fn record_tracker_event(tracker: &'static str) {
    metrics::counter!("ratelimit_tracker_events_total", "tracker" => tracker).increment(1);
}

pub fn record_tracker_failure(tracker: &'static str) {
    metrics::counter!("ratelimit_tracker_failures_total", "tracker" => tracker).increment(1);
}

/// Record a forwarded request.
pub fn record_request(method: &str, status: u16, start: Instant) {
    let labels = [
        ("method", method.to_string()),
        ("status", status.to_string()),
    ];
    metrics::counter!("gate_requests_total", &labels).increment(1);
    metrics::histogram!("gate_request_duration_seconds", &labels)
        .record(start.elapsed().as_secs_f64());
}
