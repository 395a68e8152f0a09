//! Shared fakes and helpers for integration tests.
#![allow(dead_code)]

use std::collections::VecDeque;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use axum::{
    body::Body,
    http::{Request, StatusCode},
    response::IntoResponse,
    routing::any,
    Router,
};
use tokio::net::TcpListener;

use ratelimit_gate::config::{GateConfig, RouteConfig};
use ratelimit_gate::http::middleware::{self, Collaborators, Limited, ResponderRegistry};
use ratelimit_gate::limiter::{Key, RateLimiter, RequestInfo};
use ratelimit_gate::routing::RouteTable;
use ratelimit_gate::tracker::{ErrorTracker, RateLimitEvent};

/// One recorded limiter call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LimiterCall {
    pub group: String,
    pub key: Key,
    pub key_value: String,
    pub rate: String,
    pub increment: bool,
}

/// Limiter answering from a script; answers `false` once exhausted.
#[derive(Default)]
pub struct ScriptedLimiter {
    verdicts: Mutex<VecDeque<bool>>,
    calls: Mutex<Vec<LimiterCall>>,
}

impl ScriptedLimiter {
    pub fn new(verdicts: &[bool]) -> Arc<Self> {
        Arc::new(Self {
            verdicts: Mutex::new(verdicts.iter().copied().collect()),
            calls: Mutex::new(Vec::new()),
        })
    }

    pub fn calls(&self) -> Vec<LimiterCall> {
        self.calls.lock().unwrap().clone()
    }
}

impl RateLimiter for ScriptedLimiter {
    fn is_ratelimited(
        &self,
        info: &RequestInfo<'_>,
        group: &str,
        key: Key,
        rate: &str,
        increment: bool,
    ) -> bool {
        self.calls.lock().unwrap().push(LimiterCall {
            group: group.to_string(),
            key,
            key_value: key.value_of(info),
            rate: rate.to_string(),
            increment,
        });
        self.verdicts.lock().unwrap().pop_front().unwrap_or(false)
    }
}

/// Tracker that keeps every captured event.
#[derive(Default)]
pub struct RecordingTracker {
    events: Mutex<Vec<RateLimitEvent>>,
}

impl RecordingTracker {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn events(&self) -> Vec<RateLimitEvent> {
        self.events.lock().unwrap().clone()
    }
}

impl ErrorTracker for RecordingTracker {
    fn capture(&self, event: RateLimitEvent) {
        self.events.lock().unwrap().push(event);
    }
}

pub fn route(name: &str, pattern: &str, namespaces: Option<&[&str]>, target: &str) -> RouteConfig {
    RouteConfig {
        name: Some(name.to_string()),
        pattern: pattern.to_string(),
        namespaces: namespaces.map(|ns| ns.iter().map(|s| s.to_string()).collect()),
        target: target.to_string(),
    }
}

/// A small CMS-like site: pages, a blog application and the admin.
pub fn site_config() -> GateConfig {
    let mut config = GateConfig::default();
    config.routes = vec![
        route("admin-index", "/admin/", Some(&["admin"]), "admin.site.index"),
        route("post-detail", "/blog/{slug}/", Some(&["blog"]), "blog.views.detail"),
        route("pages-root", "/", None, "cms.views.details"),
        route("pages-details-by-slug", "/{slug}/", None, "cms.views.details"),
    ];
    config
}

pub fn collaborators(
    config: &GateConfig,
    limiter: Arc<ScriptedLimiter>,
    tracker: Option<Arc<RecordingTracker>>,
) -> Collaborators {
    Collaborators {
        resolver: Arc::new(RouteTable::from_config(&config.routes).unwrap()),
        limiter,
        tracker: tracker.map(|t| t as Arc<dyn ErrorTracker>),
        responders: ResponderRegistry::with_builtins(),
    }
}

/// Handler that reports whether it saw the request as limited.
async fn echo_limited(req: Request<Body>) -> impl IntoResponse {
    let body = if Limited::of(&req) { "limited" } else { "ok" };
    (StatusCode::OK, body)
}

/// Router with the middleware applied around `echo_limited`.
pub fn app(config: &GateConfig, collaborators: Collaborators) -> Router {
    let router = Router::new()
        .route("/{*path}", any(echo_limited))
        .route("/", any(echo_limited));
    middleware::apply(router, config, collaborators).unwrap()
}

pub fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .header("x-forwarded-for", "203.0.113.9")
        .body(Body::empty())
        .unwrap()
}

pub async fn body_string(response: axum::response::Response) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

/// Serve `router` on an ephemeral local port.
pub async fn spawn(router: Router) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let _ = axum::serve(listener, router).await;
    });
    addr
}
