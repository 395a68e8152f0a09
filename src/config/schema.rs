//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the gate.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Deployment stage that keys limits on the peer address instead of the
/// forwarded-address header.
pub const LOCAL_STAGE: &str = "local";

/// Root configuration for the rate-limit gate.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct GateConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Upstream application that allowed requests are forwarded to.
    pub upstream: UpstreamConfig,

    /// Rate limiting policy.
    pub rate_limit: RateLimitConfig,

    /// Error tracker integration.
    pub tracker: TrackerConfig,

    /// Route table used to classify requests.
    pub routes: Vec<RouteConfig>,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
        }
    }
}

/// Upstream application configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct UpstreamConfig {
    /// Upstream address (e.g., "127.0.0.1:8000").
    pub address: String,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            address: "127.0.0.1:8000".to_string(),
        }
    }
}

/// Rate limiting policy.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RateLimitConfig {
    /// Rate applied to page routes.
    pub page_rate: String,

    /// Rate applied to application (module) routes.
    pub module_rate: String,

    /// Group that page routes count against.
    pub page_group: String,

    /// Route names that belong to the page zone.
    pub page_routes: Vec<String>,

    /// Namespace whose routes are never limited.
    pub admin_namespace: String,

    /// Deployment stage. `"local"` keys on the peer address.
    pub stage: String,

    /// Name of the registered responder used for limited requests.
    pub limited_response: Option<String>,

    /// Mark and report limited requests without blocking them.
    pub tracking_only: bool,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            page_rate: "50/s".to_string(),
            module_rate: "5/s".to_string(),
            page_group: "cms.page".to_string(),
            page_routes: vec![
                "pages-root".to_string(),
                "pages-details-by-slug".to_string(),
            ],
            admin_namespace: "admin".to_string(),
            stage: "stage".to_string(),
            limited_response: None,
            tracking_only: false,
        }
    }
}

impl RateLimitConfig {
    /// Whether limits are keyed on the peer address.
    pub fn is_local(&self) -> bool {
        self.stage == LOCAL_STAGE
    }
}

/// Error tracker integration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct TrackerConfig {
    /// Explicit switch. Unset means enabled iff a DSN is configured.
    pub enabled: Option<bool>,

    /// Webhook endpoint that receives rate-limit events.
    pub dsn: Option<String>,
}

impl TrackerConfig {
    /// Resolve the auto-detected integration switch.
    pub fn is_enabled(&self) -> bool {
        self.enabled.unwrap_or(self.dsn.is_some())
    }
}

/// A named route of the upstream application.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RouteConfig {
    /// Route name (e.g., "pages-root").
    #[serde(default)]
    pub name: Option<String>,

    /// Path pattern (e.g., "/blog/{slug}/").
    pub pattern: String,

    /// Application namespaces owning the route.
    #[serde(default)]
    pub namespaces: Option<Vec<String>>,

    /// Identity of the view the route dispatches to.
    pub target: String,
}

/// Timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Request timeout (total time for request/response) in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { request_secs: 30 }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Enable Prometheus metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
