//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware stack)
//!     → middleware/ (classify, limit, respond)
//!     → proxy.rs (forward allowed requests upstream)
//!     → Send upstream response to client
//! ```

pub mod middleware;
pub mod proxy;
pub mod server;

pub use middleware::{Collaborators, Limited};
pub use server::HttpServer;
