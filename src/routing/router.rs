//! Route lookup.
//!
//! # Responsibilities
//! - Store compiled routes in declaration order
//! - Resolve a request path to the owning route
//! - Report malformed paths and misses as explicit errors
//!
//! # Design Decisions
//! - Immutable after construction (thread-safe without locks)
//! - O(n) scan over routes (acceptable for typical route counts)
//! - First match wins

use crate::config::RouteConfig;
use crate::routing::matcher::{Pattern, PatternError};

/// The route a path resolved to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteMatch {
    /// Route name, if the route is named.
    pub name: Option<String>,
    /// Application namespaces owning the route. `None` when the route was
    /// not included under any application.
    pub namespaces: Option<Vec<String>>,
    /// Identity of the view the route dispatches to.
    pub target: String,
}

impl RouteMatch {
    /// True if the route sits under at least one application namespace.
    pub fn in_namespace(&self) -> bool {
        self.namespaces.as_ref().is_some_and(|ns| !ns.is_empty())
    }

    /// True if any owning namespace equals `namespace`.
    pub fn has_namespace(&self, namespace: &str) -> bool {
        self.namespaces
            .as_ref()
            .is_some_and(|ns| ns.iter().any(|n| n == namespace))
    }
}

/// Why a path could not be resolved.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ResolveError {
    #[error("malformed path '{0}'")]
    Malformed(String),
    #[error("no route for '{0}'")]
    NotFound(String),
}

/// Resolves request paths to routes.
pub trait RouteResolver: Send + Sync {
    fn resolve(&self, path: &str) -> Result<RouteMatch, ResolveError>;
}

#[derive(Debug)]
struct CompiledRoute {
    pattern: Pattern,
    route: RouteMatch,
}

/// Ordered table of compiled routes.
#[derive(Debug, Default)]
pub struct RouteTable {
    routes: Vec<CompiledRoute>,
}

impl RouteTable {
    /// Compile routes from configuration, preserving their order.
    pub fn from_config(routes: &[RouteConfig]) -> Result<Self, PatternError> {
        let routes = routes
            .iter()
            .map(|r| {
                Ok(CompiledRoute {
                    pattern: Pattern::parse(&r.pattern)?,
                    route: RouteMatch {
                        name: r.name.clone(),
                        namespaces: r.namespaces.clone(),
                        target: r.target.clone(),
                    },
                })
            })
            .collect::<Result<Vec<_>, PatternError>>()?;

        tracing::debug!(count = routes.len(), "Route table compiled");
        Ok(Self { routes })
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

impl RouteResolver for RouteTable {
    fn resolve(&self, path: &str) -> Result<RouteMatch, ResolveError> {
        if !path.starts_with('/') || path.contains("//") {
            return Err(ResolveError::Malformed(path.to_string()));
        }

        self.routes
            .iter()
            .find(|r| r.pattern.matches(path))
            .map(|r| r.route.clone())
            .ok_or_else(|| ResolveError::NotFound(path.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn route(name: Option<&str>, pattern: &str, ns: Option<&[&str]>, target: &str) -> RouteConfig {
        RouteConfig {
            name: name.map(str::to_string),
            pattern: pattern.to_string(),
            namespaces: ns.map(|ns| ns.iter().map(|s| s.to_string()).collect()),
            target: target.to_string(),
        }
    }

    fn table() -> RouteTable {
        RouteTable::from_config(&[
            route(Some("admin-index"), "/admin/", Some(&["admin"]), "admin.index"),
            route(Some("post-detail"), "/blog/{slug}/", Some(&["blog"]), "blog.views.detail"),
            route(Some("pages-root"), "/", None, "cms.views.details"),
            route(Some("pages-details-by-slug"), "/{*slug}", None, "cms.views.details"),
        ])
        .unwrap()
    }

    #[test]
    fn test_first_match_wins() {
        let t = table();
        let m = t.resolve("/blog/hello/").unwrap();
        assert_eq!(m.name.as_deref(), Some("post-detail"));
        assert_eq!(m.target, "blog.views.detail");
        assert!(m.in_namespace());

        let m = t.resolve("/about/").unwrap();
        assert_eq!(m.name.as_deref(), Some("pages-details-by-slug"));
        assert!(!m.in_namespace());

        let m = t.resolve("/").unwrap();
        assert_eq!(m.name.as_deref(), Some("pages-root"));
    }

    #[test]
    fn test_namespace_membership() {
        let m = table().resolve("/admin/").unwrap();
        assert!(m.has_namespace("admin"));
        assert!(!m.has_namespace("blog"));
    }

    #[test]
    fn test_resolution_failures() {
        let t = table();
        assert!(matches!(t.resolve("blog"), Err(ResolveError::Malformed(_))));
        assert!(matches!(t.resolve("/blog//x"), Err(ResolveError::Malformed(_))));

        let empty = RouteTable::default();
        assert!(empty.is_empty());
        assert!(matches!(empty.resolve("/"), Err(ResolveError::NotFound(_))));
    }
}
