//! Error tracker integration.
//!
//! Rate-limit events are reported best-effort. A tracker must never block
//! the request path or fail it; transport errors are logged and counted.
//!
//! # Data Flow
//! ```text
//! RatelimitAllService (limited verdict)
//!     → RateLimitEvent::new(...)
//!     → ErrorTracker::capture(event)
//!         → log.rs      (structured warn! event)
//!         → webhook.rs  (spawned JSON POST, no retry)
//! ```

pub mod log;
pub mod webhook;

use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::Serialize;
use uuid::Uuid;

use crate::config::TrackerConfig;

pub use self::log::LogTracker;
pub use webhook::WebhookTracker;

/// A rate-limit-exceeded occurrence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RateLimitEvent {
    pub event_id: Uuid,
    /// Seconds since the Unix epoch.
    pub timestamp: u64,
    pub group: String,
    pub rate: String,
    pub key: String,
    pub method: String,
    pub path: String,
    /// The request was marked but allowed through.
    pub tracking_only: bool,
}

impl RateLimitEvent {
    pub fn new(
        group: &str,
        rate: &str,
        key: &str,
        method: &str,
        path: &str,
        tracking_only: bool,
    ) -> Self {
        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or_default();

        Self {
            event_id: Uuid::new_v4(),
            timestamp,
            group: group.to_string(),
            rate: rate.to_string(),
            key: key.to_string(),
            method: method.to_string(),
            path: path.to_string(),
            tracking_only,
        }
    }
}

/// Receives rate-limit events.
pub trait ErrorTracker: Send + Sync {
    /// Report an event. Must return promptly and never panic on transport
    /// failure.
    fn capture(&self, event: RateLimitEvent);
}

/// Build the tracker selected by configuration, if integration is enabled.
pub fn from_config(config: &TrackerConfig) -> Option<Arc<dyn ErrorTracker>> {
    if !config.is_enabled() {
        return None;
    }

    let tracker: Arc<dyn ErrorTracker> = match &config.dsn {
        Some(dsn) => Arc::new(WebhookTracker::new(dsn.clone())),
        None => Arc::new(LogTracker),
    };
    Some(tracker)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_config() {
        assert!(from_config(&TrackerConfig::default()).is_none());

        let explicit = TrackerConfig {
            enabled: Some(true),
            dsn: None,
        };
        assert!(from_config(&explicit).is_some());

        let disabled = TrackerConfig {
            enabled: Some(false),
            dsn: Some("http://127.0.0.1:1/events".into()),
        };
        assert!(from_config(&disabled).is_none());
    }

    #[test]
    fn test_event_serializes() {
        let event = RateLimitEvent::new("cms.page", "2/s", "header:x-forwarded-for", "GET", "/", false);
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["group"], "cms.page");
        assert_eq!(json["rate"], "2/s");
        assert_eq!(json["tracking_only"], false);
        assert!(json["event_id"].is_string());
    }
}
