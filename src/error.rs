//! Error types shared across the gate.

use crate::limiter::Key;

/// Raised when a request is over its rate.
///
/// Travels outward through the tower error channel until the responder
/// layer turns it into a response.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("rate limit exceeded for group '{group}' at {rate}")]
pub struct Ratelimited {
    pub group: String,
    pub rate: String,
    pub key: Key,
}

/// Startup failures of the gate binary.
#[derive(Debug, thiserror::Error)]
pub enum GateError {
    #[error("Configuration error: {0}")]
    Config(#[from] crate::config::ConfigError),

    #[error("Route table error: {0}")]
    Routes(#[from] crate::routing::matcher::PatternError),

    #[error("Unknown responder '{0}'")]
    UnknownResponder(String),

    #[error("Invalid address '{0}'")]
    Address(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for gate operations.
pub type Result<T> = std::result::Result<T, GateError>;
