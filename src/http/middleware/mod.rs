//! Rate-limit middleware.
//!
//! # Data Flow
//! ```text
//! Request
//!     → HandleErrorLayer        (unhandled failures → 500)
//!     → RatelimitLayer          (responder.rs: Ratelimited → response)
//!     → RatelimitAllLayer       (limit.rs: classify, check, mark)
//!         → classify.rs         (route → group + rate, or skip)
//!         → RateLimiter         (external verdict)
//!         → ErrorTracker        (report, best-effort)
//!     → handler
//! ```
//!
//! # Design Decisions
//! - Limited requests are reported once, at the check site
//! - The limited flag on a request only ever goes from false to true
//! - Tracking-only mode marks and reports but never blocks

pub mod classify;
pub mod limit;
pub mod responder;

use std::sync::Arc;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::{error_handling::HandleErrorLayer, Router};
use tower::{BoxError, ServiceBuilder};

use crate::config::GateConfig;
use crate::error::{GateError, Ratelimited};
use crate::limiter::{GovernorLimiter, RateLimiter};
use crate::routing::{RouteResolver, RouteTable};
use crate::tracker::{self, ErrorTracker};

pub use classify::{Classification, Classifier};
pub use limit::{Limited, RatelimitAllLayer, RatelimitAllService};
pub use responder::{
    LimitedResponder, RatelimitLayer, RatelimitService, RequestHead, ResponderRegistry,
    BUILTIN_RESPONDERS,
};

/// External collaborators of the middleware.
#[derive(Clone)]
pub struct Collaborators {
    pub resolver: Arc<dyn RouteResolver>,
    pub limiter: Arc<dyn RateLimiter>,
    pub tracker: Option<Arc<dyn ErrorTracker>>,
    pub responders: ResponderRegistry,
}

impl Collaborators {
    /// Default collaborators: the configured route table, an in-process
    /// governor limiter, the configured tracker and the built-in responders.
    pub fn from_config(config: &GateConfig) -> Result<Self, GateError> {
        Ok(Self {
            resolver: Arc::new(RouteTable::from_config(&config.routes)?),
            limiter: Arc::new(GovernorLimiter::new()),
            tracker: tracker::from_config(&config.tracker),
            responders: ResponderRegistry::with_builtins(),
        })
    }
}

/// Build the responder and limiter layers, outermost first.
pub fn layers(
    config: &GateConfig,
    collaborators: Collaborators,
) -> Result<(RatelimitLayer, RatelimitAllLayer), GateError> {
    let rl = &config.rate_limit;

    let responder = match &rl.limited_response {
        Some(name) => Some(
            collaborators
                .responders
                .get(name)
                .ok_or_else(|| GateError::UnknownResponder(name.clone()))?,
        ),
        None => None,
    };

    tracing::info!(
        page_rate = %rl.page_rate,
        module_rate = %rl.module_rate,
        stage = %rl.stage,
        responder = ?rl.limited_response,
        tracking_only = rl.tracking_only,
        tracker = collaborators.tracker.is_some(),
        "Rate limiting configured"
    );

    let limiter = RatelimitAllLayer::new(
        collaborators.resolver,
        collaborators.limiter,
        collaborators.tracker,
        rl,
    );
    Ok((RatelimitLayer::new(responder), limiter))
}

/// Wrap every route of `router` with the rate-limit middleware.
pub fn apply<S>(
    router: Router<S>,
    config: &GateConfig,
    collaborators: Collaborators,
) -> Result<Router<S>, GateError>
where
    S: Clone + Send + Sync + 'static,
{
    let (responder, limiter) = layers(config, collaborators)?;
    Ok(router.layer(
        ServiceBuilder::new()
            .layer(HandleErrorLayer::new(handle_unhandled))
            .layer(responder)
            .layer(limiter),
    ))
}

/// Default handling for failures no layer turned into a response.
async fn handle_unhandled(err: BoxError) -> Response {
    if let Some(exceeded) = err.downcast_ref::<Ratelimited>() {
        tracing::error!(group = %exceeded.group, "Rate limit exceeded with no responder configured");
    } else {
        tracing::error!(error = %err, "Unhandled middleware error");
    }
    (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error").into_response()
}
