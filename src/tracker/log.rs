//! Tracker that reports through the log pipeline.

use super::{ErrorTracker, RateLimitEvent};
use crate::observability::metrics;

/// Emits one structured `warn!` per event.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogTracker;

impl ErrorTracker for LogTracker {
    fn capture(&self, event: RateLimitEvent) {
        tracing::warn!(
            target: "ratelimit_gate::tracker",
            event_id = %event.event_id,
            group = %event.group,
            rate = %event.rate,
            key = %event.key,
            method = %event.method,
            path = %event.path,
            tracking_only = event.tracking_only,
            "Rate limit exceeded"
        );
        metrics::record_tracker_event("log");
    }
}
