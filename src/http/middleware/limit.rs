//! Limiter invocation middleware.
//!
//! Classifies every request, asks the external limiter for a verdict and
//! records it on the request as a [`Limited`] extension. Over-limit requests
//! fail with [`Ratelimited`] unless the gate runs in tracking-only mode.

use std::net::SocketAddr;
use std::sync::Arc;
use std::task::{Context, Poll};

use axum::body::Body;
use axum::extract::ConnectInfo;
use axum::http::Request;
use futures_util::future::BoxFuture;
use tower::{BoxError, Layer, Service};

use super::classify::{Classification, Classifier};
use crate::config::RateLimitConfig;
use crate::error::Ratelimited;
use crate::limiter::{Key, RateLimiter, RequestInfo};
use crate::observability::metrics;
use crate::routing::RouteResolver;
use crate::tracker::{ErrorTracker, RateLimitEvent};

/// Whether any limiter layer found the request over its rate.
///
/// Once true it stays true for the rest of the request's lifetime.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Limited(pub bool);

impl Limited {
    /// Read the flag from a request. Absent means not limited.
    pub fn of<B>(req: &Request<B>) -> bool {
        req.extensions().get::<Limited>().is_some_and(|l| l.0)
    }

    fn record<B>(req: &mut Request<B>, verdict: bool) {
        let limited = Self::of(req) || verdict;
        req.extensions_mut().insert(Limited(limited));
    }
}

struct Policy {
    classifier: Classifier,
    limiter: Arc<dyn RateLimiter>,
    tracker: Option<Arc<dyn ErrorTracker>>,
    key: Key,
    tracking_only: bool,
}

impl Policy {
    fn enforce(&self, req: &mut Request<Body>) -> Result<(), Ratelimited> {
        let Some(Classification { group, rate }) = self.classifier.classify(req.uri().path()) else {
            return Ok(());
        };

        let peer = req
            .extensions()
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| addr.ip());
        let info = RequestInfo {
            method: req.method(),
            path: req.uri().path(),
            headers: req.headers(),
            peer,
        };

        let verdict = self.limiter.is_ratelimited(&info, &group, self.key, &rate, true);
        metrics::record_check(&group, verdict);

        if verdict {
            tracing::debug!(
                group = %group,
                rate = %rate,
                key = %self.key,
                path = %info.path,
                tracking_only = self.tracking_only,
                "Rate limit exceeded"
            );
            if let Some(tracker) = &self.tracker {
                tracker.capture(RateLimitEvent::new(
                    &group,
                    &rate,
                    &self.key.to_string(),
                    info.method.as_str(),
                    info.path,
                    self.tracking_only,
                ));
            }
        }

        Limited::record(req, verdict);

        if !verdict {
            return Ok(());
        }
        if self.tracking_only {
            metrics::record_exceeded(&group, "tracked");
            return Ok(());
        }

        metrics::record_exceeded(&group, "blocked");
        Err(Ratelimited {
            group,
            rate,
            key: self.key,
        })
    }
}

/// Layer that classifies requests and invokes the external limiter.
#[derive(Clone)]
pub struct RatelimitAllLayer {
    policy: Arc<Policy>,
}

impl RatelimitAllLayer {
    pub fn new(
        resolver: Arc<dyn RouteResolver>,
        limiter: Arc<dyn RateLimiter>,
        tracker: Option<Arc<dyn ErrorTracker>>,
        config: &RateLimitConfig,
    ) -> Self {
        let policy = Policy {
            classifier: Classifier::new(resolver, config),
            limiter,
            tracker,
            key: Key::for_stage(config.is_local()),
            tracking_only: config.tracking_only,
        };
        Self {
            policy: Arc::new(policy),
        }
    }
}

impl<S> Layer<S> for RatelimitAllLayer {
    type Service = RatelimitAllService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        RatelimitAllService {
            inner,
            policy: self.policy.clone(),
        }
    }
}

/// Service produced by [`RatelimitAllLayer`].
#[derive(Clone)]
pub struct RatelimitAllService<S> {
    inner: S,
    policy: Arc<Policy>,
}

impl<S> Service<Request<Body>> for RatelimitAllService<S>
where
    S: Service<Request<Body>> + Clone + Send + 'static,
    S::Response: Send + 'static,
    S::Error: Into<BoxError>,
    S::Future: Send + 'static,
{
    type Response = S::Response;
    type Error = BoxError;
    type Future = BoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx).map_err(Into::into)
    }

    fn call(&mut self, mut req: Request<Body>) -> Self::Future {
        if let Err(exceeded) = self.policy.enforce(&mut req) {
            return Box::pin(async move { Err(exceeded.into()) });
        }

        // The ready service is the one that must handle this request.
        let clone = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, clone);
        Box::pin(async move { inner.call(req).await.map_err(Into::into) })
    }
}
