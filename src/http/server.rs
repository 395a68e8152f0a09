//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with the forwarding handler
//! - Wire up middleware (rate limiting, timeout, tracing)
//! - Bind server to listener
//! - Prune limiter state periodically while serving
//! - Graceful shutdown on Ctrl+C

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{body::Body, routing::any, Router};
use hyper_util::{client::legacy::Client, rt::TokioExecutor};
use hyper_util::client::legacy::connect::HttpConnector;
use tokio::net::TcpListener;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use crate::config::GateConfig;
use crate::error::{GateError, Result};
use crate::http::middleware::{self, Collaborators};
use crate::http::proxy::{forward, ProxyState};
use crate::limiter::RateLimiter;

/// How often idle callers are dropped from the limiter.
const PRUNE_INTERVAL: Duration = Duration::from_secs(60);

/// HTTP server fronting the upstream application.
pub struct HttpServer {
    router: Router,
    config: GateConfig,
    limiter: Arc<dyn RateLimiter>,
}

impl HttpServer {
    /// Create a server with the default collaborators.
    pub fn new(config: GateConfig) -> Result<Self> {
        let collaborators = Collaborators::from_config(&config)?;
        Self::with_collaborators(config, collaborators)
    }

    /// Create a server with caller-supplied collaborators.
    pub fn with_collaborators(config: GateConfig, collaborators: Collaborators) -> Result<Self> {
        let client: Client<HttpConnector, Body> =
            Client::builder(TokioExecutor::new()).build(HttpConnector::new());
        let state = ProxyState::new(client, &config.upstream.address)
            .ok_or_else(|| GateError::Address(config.upstream.address.clone()))?;

        let limiter = collaborators.limiter.clone();
        let router = Self::build_router(&config, state, collaborators)?;
        Ok(Self {
            router,
            config,
            limiter,
        })
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(
        config: &GateConfig,
        state: ProxyState,
        collaborators: Collaborators,
    ) -> Result<Router> {
        let router = Router::new()
            .route("/{*path}", any(forward))
            .route("/", any(forward))
            .with_state(state);

        Ok(middleware::apply(router, config, collaborators)?
            .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)))
            .layer(TraceLayer::new_for_http()))
    }

    /// The assembled router, for embedding or driving in tests.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Run the server, accepting connections on the given listener.
    pub async fn run(self, listener: TcpListener) -> Result<()> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            upstream = %self.config.upstream.address,
            "HTTP server starting"
        );

        let pruner = tokio::spawn(prune_limiter(self.limiter.clone(), PRUNE_INTERVAL));
        let app = self.router.into_make_service_with_connect_info::<SocketAddr>();

        let served = axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await;
        pruner.abort();
        served?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &GateConfig {
        &self.config
    }
}

async fn prune_limiter(limiter: Arc<dyn RateLimiter>, period: Duration) {
    let mut ticker = tokio::time::interval(period);
    // The first tick completes immediately.
    ticker.tick().await;
    loop {
        ticker.tick().await;
        limiter.retain_recent();
    }
}

/// Wait for shutdown signal (Ctrl+C).
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for Ctrl+C, shutting down");
        return;
    }
    tracing::info!("Shutdown signal received");
}
