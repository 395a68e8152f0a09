//! Rate-limit gate.
//!
//! Sits in front of a web application and applies per-route rate limits
//! before forwarding requests.
//!
//! # Architecture Overview
//!
//! ```text
//!     Client Request
//!     ──────────────▶ HandleErrorLayer ─▶ RatelimitLayer ─▶ RatelimitAllLayer ─▶ forward ─▶ Upstream
//!                                              ▲                  │   │
//!                                              │  Ratelimited     │   ├─▶ RouteTable (classify)
//!                                              └──────────────────┘   ├─▶ RateLimiter (verdict)
//!                                                                     └─▶ ErrorTracker (report)
//! ```

use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use ratelimit_gate::config::{load_config, load_from_env};
use ratelimit_gate::observability::{logging, metrics};
use ratelimit_gate::HttpServer;

#[derive(Parser)]
#[command(name = "ratelimit-gate")]
#[command(about = "Per-route rate limiting in front of a web application", long_about = None)]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Validate the configuration and exit.
    #[arg(long)]
    check: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    logging::init();
    let cli = Cli::parse();

    tracing::info!("ratelimit-gate v{} starting", env!("CARGO_PKG_VERSION"));

    let config = match &cli.config {
        Some(path) => load_config(path)?,
        None => load_from_env()?,
    };

    tracing::info!(
        bind_address = %config.listener.bind_address,
        upstream = %config.upstream.address,
        routes = config.routes.len(),
        "Configuration loaded"
    );

    let server = HttpServer::new(config)?;
    if cli.check {
        println!("configuration OK");
        return Ok(());
    }

    let observability = &server.config().observability;
    if observability.metrics_enabled {
        match observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let listener = TcpListener::bind(&server.config().listener.bind_address).await?;
    server.run(listener).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
