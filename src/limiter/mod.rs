//! External limiter contract.
//!
//! The gate never counts requests itself. It asks a [`RateLimiter`] whether
//! a request is over its rate and reacts to the boolean answer.
//!
//! # Data Flow
//! ```text
//! RatelimitAllService
//!     → RateLimiter::is_ratelimited(info, group, key, rate, increment)
//!         → Key::value_of(info)   (discriminator for independent callers)
//!         → counter storage        (owned by the limiter)
//!     ← bool verdict
//! ```

pub mod governor;
pub mod rate;

use std::fmt;
use std::net::IpAddr;

use axum::http::{HeaderMap, Method};

pub use self::governor::GovernorLimiter;
pub use rate::{RateSpec, RateSpecError};

/// Header carrying the client address when behind a trusted proxy.
pub const FORWARDED_FOR: &str = "x-forwarded-for";

/// How independent callers sharing a group are told apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    /// The peer address of the connection.
    Ip,
    /// The raw value of a request header.
    Header(&'static str),
}

impl Key {
    /// Key selection by deployment stage.
    pub fn for_stage(local: bool) -> Self {
        if local {
            Key::Ip
        } else {
            Key::Header(FORWARDED_FOR)
        }
    }

    /// Extract the discriminator value. Missing metadata yields "".
    pub fn value_of(&self, info: &RequestInfo<'_>) -> String {
        match self {
            Key::Ip => info.peer.map(|ip| ip.to_string()).unwrap_or_default(),
            Key::Header(name) => info
                .headers
                .get(*name)
                .and_then(|v| v.to_str().ok())
                .unwrap_or_default()
                .to_string(),
        }
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Key::Ip => f.write_str("ip"),
            Key::Header(name) => write!(f, "header:{name}"),
        }
    }
}

/// The parts of a request a limiter may inspect.
#[derive(Debug, Clone, Copy)]
pub struct RequestInfo<'a> {
    pub method: &'a Method,
    pub path: &'a str,
    pub headers: &'a HeaderMap,
    pub peer: Option<IpAddr>,
}

/// External rate limiter.
///
/// Implementations own the counters and must make check-and-increment
/// atomic across concurrent requests.
pub trait RateLimiter: Send + Sync {
    /// Returns true if the caller identified by `key` is over `rate` in
    /// `group`. With `increment` the request is counted as part of the check.
    fn is_ratelimited(
        &self,
        info: &RequestInfo<'_>,
        group: &str,
        key: Key,
        rate: &str,
        increment: bool,
    ) -> bool;

    /// Drop state for callers that no longer affect any verdict. Called
    /// periodically by the server.
    fn retain_recent(&self) {}
}
