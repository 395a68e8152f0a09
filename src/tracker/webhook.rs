//! Tracker that POSTs events as JSON to a collector endpoint.

use std::time::Duration;

use tokio::runtime::Handle;

use super::{ErrorTracker, RateLimitEvent};
use crate::observability::metrics;

const SEND_TIMEOUT: Duration = Duration::from_secs(5);

/// Fire-and-forget webhook reporter.
///
/// Each capture spawns one POST on the current Tokio runtime. There is no
/// retry and no queue; a failed delivery is logged and counted.
#[derive(Debug, Clone)]
pub struct WebhookTracker {
    client: reqwest::Client,
    endpoint: String,
}

impl WebhookTracker {
    pub fn new(endpoint: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(SEND_TIMEOUT)
            .build()
            .unwrap_or_else(|e| {
                tracing::warn!(error = %e, "Falling back to default tracker client");
                reqwest::Client::new()
            });

        Self {
            client,
            endpoint: endpoint.into(),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn send(client: reqwest::Client, endpoint: String, event: RateLimitEvent) {
        let result = client
            .post(&endpoint)
            .json(&event)
            .send()
            .await
            .and_then(|res| res.error_for_status());

        match result {
            Ok(_) => {
                tracing::debug!(event_id = %event.event_id, "Rate limit event delivered");
                metrics::record_tracker_event("webhook");
            }
            Err(e) => {
                tracing::warn!(
                    event_id = %event.event_id,
                    endpoint = %endpoint,
                    error = %e,
                    "Failed to deliver rate limit event"
                );
                metrics::record_tracker_failure("webhook");
            }
        }
    }
}

impl ErrorTracker for WebhookTracker {
    fn capture(&self, event: RateLimitEvent) {
        let Ok(handle) = Handle::try_current() else {
            tracing::warn!(event_id = %event.event_id, "No runtime available, dropping rate limit event");
            metrics::record_tracker_failure("webhook");
            return;
        };

        handle.spawn(Self::send(self.client.clone(), self.endpoint.clone(), event));
    }
}
