//! Rate-limit gate library.
//!
//! Tower middleware that classifies requests by route, asks an external
//! limiter for a verdict and blocks, or only marks, requests over their rate.

pub mod config;
pub mod error;
pub mod http;
pub mod limiter;
pub mod observability;
pub mod routing;
pub mod tracker;

pub use config::GateConfig;
pub use error::{GateError, Ratelimited};
pub use http::HttpServer;
