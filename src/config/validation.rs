//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Rate strings must be understood by the limiter
//! - Route patterns must compile
//! - Addresses and tracker URL must parse
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use crate::config::schema::GateConfig;
use crate::limiter::RateSpec;
use crate::routing::matcher::Pattern;

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{field}: {message}")]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

impl ValidationError {
    fn new(field: impl Into<String>, message: impl ToString) -> Self {
        Self {
            field: field.into(),
            message: message.to_string(),
        }
    }
}

/// Validate a loaded configuration.
///
/// `rate_limit.limited_response` is not checked here. Responders can be
/// registered at runtime, so the name is resolved when the layers are built.
pub fn validate_config(config: &GateConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();
    let rl = &config.rate_limit;

    for (field, rate) in [
        ("rate_limit.page_rate", &rl.page_rate),
        ("rate_limit.module_rate", &rl.module_rate),
    ] {
        if let Err(e) = rate.parse::<RateSpec>() {
            errors.push(ValidationError::new(field, e));
        }
    }

    if rl.page_group.is_empty() {
        errors.push(ValidationError::new("rate_limit.page_group", "must not be empty"));
    }

    if let Some(dsn) = &config.tracker.dsn {
        match url::Url::parse(dsn) {
            Ok(u) if matches!(u.scheme(), "http" | "https") => {}
            Ok(u) => errors.push(ValidationError::new(
                "tracker.dsn",
                format!("unsupported scheme '{}'", u.scheme()),
            )),
            Err(e) => errors.push(ValidationError::new("tracker.dsn", e)),
        }
    }

    for (i, route) in config.routes.iter().enumerate() {
        if let Err(e) = Pattern::parse(&route.pattern) {
            errors.push(ValidationError::new(format!("routes[{i}].pattern"), e));
        }
        if route.target.is_empty() {
            errors.push(ValidationError::new(format!("routes[{i}].target"), "must not be empty"));
        }
    }

    for (field, addr) in [
        ("listener.bind_address", &config.listener.bind_address),
        ("upstream.address", &config.upstream.address),
    ] {
        if addr.parse::<SocketAddr>().is_err() {
            errors.push(ValidationError::new(field, format!("invalid socket address '{addr}'")));
        }
    }

    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::new("timeouts.request_secs", "must be greater than 0"));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
