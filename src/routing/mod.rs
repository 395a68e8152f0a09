//! Routing subsystem.
//!
//! Mirrors the route table of the upstream application so requests can be
//! classified before they are forwarded.
//!
//! # Data Flow
//! ```text
//! Request path
//!     → router.rs (route lookup)
//!     → matcher.rs (evaluate path pattern)
//!     → Return: RouteMatch or ResolveError
//!
//! Route Compilation (at startup):
//!     RouteConfig[]
//!     → Compile patterns
//!     → Freeze as immutable RouteTable
//! ```

pub mod matcher;
pub mod router;

pub use router::{ResolveError, RouteMatch, RouteResolver, RouteTable};
