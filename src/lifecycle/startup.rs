//! Startup orchestration.
//!
//! # Responsibilities
//! - Build the gateway and register configured services
//! - Start background tasks (health checks, limiter sweeps, config reload)
//!
//! # Design Decisions
//! - Fail fast: an invalid service at startup is fatal
//! - Reload failures are logged and the running set is kept

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::config::GatewayConfig;
use crate::gateway::{Gateway, RegistrationError};
use crate::health::HealthMonitor;
use crate::lifecycle::Shutdown;
use crate::ratelimit::LimiterSweeper;

/// Build a gateway from validated configuration and register its services.
pub fn build_gateway(config: &GatewayConfig) -> Result<Arc<Gateway>, RegistrationError> {
    let gateway = Gateway::new(config);
    let count = gateway.register_all(&config.services)?;
    tracing::info!(services = count, strategy = ?config.rate_limit.strategy, "Gateway ready");
    Ok(Arc::new(gateway))
}

/// Re-apply the service list of a reloaded config. New services are added,
/// known ones get their address and breaker thresholds updated. Services
/// missing from the new list stay registered.
pub fn apply_reload(gateway: &Gateway, config: &GatewayConfig) -> usize {
    let mut applied = 0;
    for service in &config.services {
        match gateway.register_service(&service.name, &service.base_address, service.into()) {
            Ok(_) => applied += 1,
            Err(e) => tracing::error!(service = %service.name, error = %e, "Skipping service on reload"),
        }
    }
    tracing::info!(services = applied, "Configuration reloaded");
    applied
}

/// Spawn the health monitor and limiter sweeper.
pub fn spawn_background(
    gateway: &Arc<Gateway>,
    config: &GatewayConfig,
    shutdown: &Shutdown,
) -> Vec<JoinHandle<()>> {
    let monitor = HealthMonitor::new(gateway.clone(), config.health_check.clone());
    let sweeper = LimiterSweeper::new(
        gateway.limiter(),
        Duration::from_secs(config.rate_limit.sweep_interval_secs),
        Duration::from_secs(config.rate_limit.idle_ttl_secs),
    );

    vec![
        tokio::spawn(monitor.run(shutdown.subscribe())),
        tokio::spawn(sweeper.run(shutdown.subscribe())),
    ]
}

/// Apply reloaded configs until the channel closes or shutdown fires.
pub fn spawn_reload_loop(
    gateway: Arc<Gateway>,
    mut updates: mpsc::UnboundedReceiver<GatewayConfig>,
    shutdown: &Shutdown,
) -> JoinHandle<()> {
    let mut stop = shutdown.subscribe();
    tokio::spawn(async move {
        loop {
            tokio::select! {
                update = updates.recv() => match update {
                    Some(config) => {
                        apply_reload(&gateway, &config);
                    }
                    None => break,
                },
                _ = stop.recv() => break,
            }
        }
    })
}
