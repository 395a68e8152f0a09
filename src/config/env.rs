//! Environment overlay.
//!
//! Settings read from the environment win over the config file. The overlay
//! runs once at startup; nothing re-reads the environment per request.

use crate::config::schema::GateConfig;

pub const ENV_PAGE_RATE: &str = "RATELIMIT_PAGE";
pub const ENV_MODULE_RATE: &str = "RATELIMIT_MODULE";
pub const ENV_STAGE: &str = "STAGE";
pub const ENV_LIMITED_RESPONSE: &str = "RATELIMIT_VIEW";
pub const ENV_TRACKING_ONLY: &str = "RATELIMIT_TRACKING_ONLY";
pub const ENV_TRACKER_ENABLED: &str = "RATELIMIT_TRACKER_ENABLED";
pub const ENV_TRACKER_DSN: &str = "RATELIMIT_TRACKER_DSN";
pub const ENV_UPSTREAM: &str = "RATELIMIT_UPSTREAM";
pub const ENV_BIND: &str = "RATELIMIT_BIND";

/// Apply environment overrides using `lookup` to read variables.
pub fn apply_env<F>(config: &mut GateConfig, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    let rl = &mut config.rate_limit;
    if let Some(v) = lookup(ENV_PAGE_RATE) {
        rl.page_rate = v;
    }
    if let Some(v) = lookup(ENV_MODULE_RATE) {
        rl.module_rate = v;
    }
    if let Some(v) = lookup(ENV_STAGE) {
        rl.stage = v;
    }
    if let Some(v) = lookup(ENV_LIMITED_RESPONSE) {
        rl.limited_response = non_empty(v);
    }
    if let Some(v) = lookup(ENV_TRACKING_ONLY).and_then(|v| parse_flag(&v)) {
        rl.tracking_only = v;
    }

    if let Some(v) = lookup(ENV_TRACKER_ENABLED) {
        config.tracker.enabled = parse_flag(&v);
    }
    if let Some(v) = lookup(ENV_TRACKER_DSN) {
        config.tracker.dsn = non_empty(v);
    }

    if let Some(v) = lookup(ENV_UPSTREAM) {
        config.upstream.address = v;
    }
    if let Some(v) = lookup(ENV_BIND) {
        config.listener.bind_address = v;
    }
}

fn non_empty(v: String) -> Option<String> {
    if v.trim().is_empty() {
        None
    } else {
        Some(v)
    }
}

fn parse_flag(v: &str) -> Option<bool> {
    match v.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => {
            tracing::warn!(value = %v, "Ignoring unrecognised boolean in environment");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_overrides() {
        let mut config = GateConfig::default();
        apply_env(
            &mut config,
            env(&[
                (ENV_PAGE_RATE, "2/s"),
                (ENV_STAGE, "local"),
                (ENV_LIMITED_RESPONSE, "json"),
                (ENV_TRACKING_ONLY, "True"),
                (ENV_TRACKER_DSN, "http://tracker.internal/events"),
            ]),
        );

        assert_eq!(config.rate_limit.page_rate, "2/s");
        assert_eq!(config.rate_limit.module_rate, "5/s");
        assert!(config.rate_limit.is_local());
        assert_eq!(config.rate_limit.limited_response.as_deref(), Some("json"));
        assert!(config.rate_limit.tracking_only);
        assert!(config.tracker.is_enabled());
    }

    #[test]
    fn test_empty_values_clear_optionals() {
        let mut config = GateConfig::default();
        config.rate_limit.limited_response = Some("plain".into());
        apply_env(&mut config, env(&[(ENV_LIMITED_RESPONSE, " ")]));
        assert!(config.rate_limit.limited_response.is_none());
    }

    #[test]
    fn test_bad_flag_is_ignored() {
        let mut config = GateConfig::default();
        apply_env(&mut config, env(&[(ENV_TRACKING_ONLY, "maybe")]));
        assert!(!config.rate_limit.tracking_only);
    }
}
