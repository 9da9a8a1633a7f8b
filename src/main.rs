//! Request gateway.
//!
//! # Architecture Overview
//!
//! ```text
//!                         ┌───────────────────────────────────────────────────┐
//!                         │                  REQUEST GATEWAY                  │
//!                         │                                                   │
//!     Client Request      │  ┌─────────┐    ┌──────────┐    ┌─────────────┐  │
//!     ────────────────────┼─▶│  http   │───▶│ registry │───▶│  resilience │  │
//!                         │  │ server  │    │  lookup  │    │   breaker   │  │
//!                         │  └─────────┘    └──────────┘    └──────┬──────┘  │
//!                         │                                        ▼         │
//!                         │                                 ┌─────────────┐  │
//!                         │                                 │  ratelimit  │  │
//!                         │                                 └──────┬──────┘  │
//!                         │                                        ▼         │
//!     Client Response     │  ┌─────────┐                    ┌─────────────┐  │
//!     ◀───────────────────┼──│response │◀───────────────────│  upstream   │◀─┼── Backend
//!                         │  └─────────┘                    └─────────────┘  │
//!                         │                                                   │
//!                         │  health monitor · limiter sweeper · admin API     │
//!                         │  config watcher · metrics · lifecycle             │
//!                         └───────────────────────────────────────────────────┘
//! ```

use clap::Parser;
use std::path::PathBuf;
use tokio::net::TcpListener;

use request_gateway::admin::setup_admin_router;
use request_gateway::config::watcher::ConfigWatcher;
use request_gateway::config::{load_config, GatewayConfig};
use request_gateway::lifecycle::{signals, startup, Shutdown};
use request_gateway::observability::{logging, metrics};
use request_gateway::HttpServer;

#[derive(Parser)]
#[command(name = "request-gateway", version, about = "HTTP request gateway")]
struct Args {
    /// Path to the TOML configuration file. Defaults are used when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => load_config(path)?,
        None => GatewayConfig::default(),
    };

    logging::init_tracing(&config.observability);
    tracing::info!("request-gateway v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        bind_address = %config.listener.bind_address,
        services = config.services.len(),
        strategy = ?config.rate_limit.strategy,
        request_timeout_secs = config.timeouts.request_secs,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let gateway = startup::build_gateway(&config)?;
    let shutdown = Shutdown::new();
    signals::spawn_signal_handler(shutdown.clone());

    let mut tasks = startup::spawn_background(&gateway, &config, &shutdown);

    // Kept alive for the life of the process.
    let _watcher = match &args.config {
        Some(path) => {
            let (watcher, updates) = ConfigWatcher::new(path);
            tasks.push(startup::spawn_reload_loop(gateway.clone(), updates, &shutdown));
            match watcher.run() {
                Ok(w) => Some(w),
                Err(e) => {
                    tracing::warn!(error = %e, "Config hot reload unavailable");
                    None
                }
            }
        }
        None => None,
    };

    if config.admin.enabled {
        let listener = TcpListener::bind(&config.admin.bind_address).await?;
        tracing::info!(address = %listener.local_addr()?, "Admin API listening");
        if config.admin.api_key.is_empty() {
            tracing::warn!("Admin API key is empty, admin endpoints are unauthenticated");
        }
        let router = setup_admin_router(gateway.clone(), &config.admin.api_key);
        let mut stop = shutdown.subscribe();
        tasks.push(tokio::spawn(async move {
            let served = axum::serve(listener, router)
                .with_graceful_shutdown(async move {
                    let _ = stop.recv().await;
                })
                .await;
            if let Err(e) = served {
                tracing::error!(error = %e, "Admin server failed");
            }
        }));
    }

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let server = HttpServer::new(gateway, &config);
    let served = server.run(listener, shutdown.subscribe()).await;

    // A listener error must still stop the background tasks.
    shutdown.trigger();
    for task in tasks {
        let _ = task.await;
    }
    served?;

    tracing::info!("Shutdown complete");
    Ok(())
}
