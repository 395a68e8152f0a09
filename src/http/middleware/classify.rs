//! Request classification.
//!
//! Decides which group a request counts against and at which rate:
//!
//! 1. Named page routes count against the page group at the page rate.
//! 2. Routes under an application namespace other than the admin namespace
//!    count against a group named after their target at the module rate.
//! 3. Everything else, including paths that fail to resolve, is skipped.

use std::sync::Arc;

use crate::config::RateLimitConfig;
use crate::routing::{RouteMatch, RouteResolver};

/// The group and rate a request is limited under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    pub group: String,
    pub rate: String,
}

impl Classification {
    pub fn new(group: impl Into<String>, rate: impl Into<String>) -> Self {
        Self {
            group: group.into(),
            rate: rate.into(),
        }
    }
}

/// Maps request paths to classifications.
pub struct Classifier {
    resolver: Arc<dyn RouteResolver>,
    page_routes: Vec<String>,
    page_group: String,
    page_rate: String,
    module_rate: String,
    admin_namespace: String,
}

impl Classifier {
    pub fn new(resolver: Arc<dyn RouteResolver>, config: &RateLimitConfig) -> Self {
        Self {
            resolver,
            page_routes: config.page_routes.clone(),
            page_group: config.page_group.clone(),
            page_rate: config.page_rate.clone(),
            module_rate: config.module_rate.clone(),
            admin_namespace: config.admin_namespace.clone(),
        }
    }

    /// Classify a request path. `None` means the request is not limited.
    pub fn classify(&self, path: &str) -> Option<Classification> {
        match self.resolver.resolve(path) {
            Ok(route) => self.classify_route(&route),
            Err(e) => {
                tracing::trace!(path, reason = %e, "Unresolved path, not limiting");
                None
            }
        }
    }

    /// Classify an already resolved route.
    pub fn classify_route(&self, route: &RouteMatch) -> Option<Classification> {
        let is_page = route
            .name
            .as_deref()
            .is_some_and(|name| self.page_routes.iter().any(|p| p == name));

        if is_page {
            Some(Classification::new(&self.page_group, &self.page_rate))
        } else if route.in_namespace() && !route.has_namespace(&self.admin_namespace) {
            Some(Classification::new(&route.target, &self.module_rate))
        } else {
            None
        }
    }
}
