//! Exceeded-limit responder middleware.
//!
//! Sits outside [`super::limit::RatelimitAllLayer`] and turns a
//! [`Ratelimited`] failure into the response produced by the configured
//! [`LimitedResponder`]. Without a responder the failure keeps propagating
//! to the server's default error handling.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::task::{Context, Poll};

use axum::body::Body;
use axum::http::{Extensions, HeaderMap, Method, Request, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::Json;
use futures_util::future::BoxFuture;
use serde_json::json;
use tower::{BoxError, Layer, Service};

use super::limit::Limited;
use crate::error::Ratelimited;

/// Names of the responders every registry starts with.
pub const BUILTIN_RESPONDERS: &[&str] = &["plain", "json"];

/// Snapshot of the request taken before it entered the limiter.
///
/// The body is not kept. `extensions` carries what the server attached
/// (such as `ConnectInfo`) plus [`Limited`], which is always set by the time
/// a responder sees the head.
#[derive(Debug, Clone)]
pub struct RequestHead {
    pub method: Method,
    pub uri: Uri,
    pub headers: HeaderMap,
    pub extensions: Extensions,
}

impl RequestHead {
    fn of<B>(req: &Request<B>) -> Self {
        Self {
            method: req.method().clone(),
            uri: req.uri().clone(),
            headers: req.headers().clone(),
            extensions: req.extensions().clone(),
        }
    }
}

/// Produces the response sent in place of a limited request.
pub trait LimitedResponder: Send + Sync {
    fn respond(&self, head: &RequestHead, exceeded: &Ratelimited) -> Response;
}

impl<F> LimitedResponder for F
where
    F: Fn(&RequestHead, &Ratelimited) -> Response + Send + Sync,
{
    fn respond(&self, head: &RequestHead, exceeded: &Ratelimited) -> Response {
        self(head, exceeded)
    }
}

fn plain_response(_: &RequestHead, _: &Ratelimited) -> Response {
    (StatusCode::TOO_MANY_REQUESTS, "Rate limit exceeded").into_response()
}

fn json_response(_: &RequestHead, exceeded: &Ratelimited) -> Response {
    let body = json!({
        "error": "rate_limited",
        "group": exceeded.group,
        "rate": exceeded.rate,
    });
    (StatusCode::TOO_MANY_REQUESTS, Json(body)).into_response()
}

/// Responders addressable by name from configuration.
#[derive(Clone)]
pub struct ResponderRegistry {
    entries: HashMap<String, Arc<dyn LimitedResponder>>,
}

impl ResponderRegistry {
    /// Registry holding only the built-in responders.
    pub fn with_builtins() -> Self {
        let mut registry = Self {
            entries: HashMap::new(),
        };
        registry.register("plain", plain_response);
        registry.register("json", json_response);
        registry
    }

    /// Add or replace a responder.
    pub fn register<R>(&mut self, name: impl Into<String>, responder: R) -> &mut Self
    where
        R: LimitedResponder + 'static,
    {
        self.entries.insert(name.into(), Arc::new(responder));
        self
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn LimitedResponder>> {
        self.entries.get(name).cloned()
    }

    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.entries.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

impl Default for ResponderRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}

impl fmt::Debug for ResponderRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResponderRegistry")
            .field("names", &self.names())
            .finish()
    }
}

/// Layer that answers [`Ratelimited`] failures with a responder.
#[derive(Clone, Default)]
pub struct RatelimitLayer {
    responder: Option<Arc<dyn LimitedResponder>>,
}

impl RatelimitLayer {
    pub fn new(responder: Option<Arc<dyn LimitedResponder>>) -> Self {
        Self { responder }
    }
}

impl<S> Layer<S> for RatelimitLayer {
    type Service = RatelimitService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        RatelimitService {
            inner,
            responder: self.responder.clone(),
        }
    }
}

/// Service produced by [`RatelimitLayer`].
#[derive(Clone)]
pub struct RatelimitService<S> {
    inner: S,
    responder: Option<Arc<dyn LimitedResponder>>,
}

impl<S> Service<Request<Body>> for RatelimitService<S>
where
    S: Service<Request<Body>, Response = Response> + Clone + Send + 'static,
    S::Error: Into<BoxError>,
    S::Future: Send + 'static,
{
    type Response = Response;
    type Error = BoxError;
    type Future = BoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx).map_err(Into::into)
    }

    fn call(&mut self, req: Request<Body>) -> Self::Future {
        let head = self.responder.as_ref().map(|_| RequestHead::of(&req));
        let responder = self.responder.clone();

        let clone = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, clone);

        Box::pin(async move {
            let err: BoxError = match inner.call(req).await {
                Ok(response) => return Ok(response),
                Err(e) => e.into(),
            };

            if let (Some(responder), Some(mut head), Some(exceeded)) =
                (responder, head, err.downcast_ref::<Ratelimited>())
            {
                head.extensions.insert(Limited(true));
                tracing::debug!(group = %exceeded.group, "Responding to limited request");
                return Ok(responder.respond(&head, exceeded));
            }

            Err(err)
        })
    }
}
