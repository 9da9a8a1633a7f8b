//! Active health checking.
//!
//! # Responsibilities
//! - Periodically probe every registered service
//! - Record results in the registry through the gateway

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::time;

use crate::config::HealthCheckConfig;
use crate::gateway::Gateway;

pub struct HealthMonitor {
    gateway: Arc<Gateway>,
    config: HealthCheckConfig,
}

impl HealthMonitor {
    pub fn new(gateway: Arc<Gateway>, config: HealthCheckConfig) -> Self {
        Self { gateway, config }
    }

    /// Probe every service once. Returns how many reported healthy.
    pub async fn check_once(&self) -> usize {
        let results = self.gateway.check_all().await;
        let healthy = results.iter().filter(|(_, ok)| *ok).count();
        tracing::debug!(
            checked = results.len(),
            healthy,
            "Health check round complete"
        );
        healthy
    }

    pub async fn run(self, mut shutdown: broadcast::Receiver<()>) {
        if !self.config.enabled || self.config.interval_secs == 0 {
            tracing::info!("Active health checks disabled");
            return;
        }

        tracing::info!(
            interval = self.config.interval_secs,
            path = %self.config.path,
            "Health monitor starting"
        );

        let mut ticker = time::interval(Duration::from_secs(self.config.interval_secs));
        ticker.set_missed_tick_behavior(time::MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.check_once().await;
                }
                _ = shutdown.recv() => {
                    tracing::info!("Health monitor received shutdown signal, exiting loop");
                    break;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::config::GatewayConfig;
    use crate::gateway::ServiceOptions;
    use crate::upstream::{Transport, TransportError, UpstreamRequest, UpstreamResponse};
    use async_trait::async_trait;
    use axum::http::{HeaderMap, StatusCode};

    /// Healthy only for hosts on port 9000.
    #[derive(Debug)]
    struct PortTransport;

    #[async_trait]
    impl Transport for PortTransport {
        async fn send(&self, request: UpstreamRequest) -> Result<UpstreamResponse, TransportError> {
            if request.url.port() == Some(9000) {
                Ok(UpstreamResponse {
                    status: StatusCode::OK,
                    headers: HeaderMap::new(),
                    body: Default::default(),
                })
            } else {
                Err(TransportError::Connect("refused".into()))
            }
        }
    }

    fn gateway() -> Arc<Gateway> {
        let gateway = Gateway::with_parts(
            &GatewayConfig::default(),
            Arc::new(ManualClock::new(0)),
            Arc::new(PortTransport),
        );
        gateway
            .register_service("up", "http://127.0.0.1:9000", ServiceOptions::default())
            .unwrap();
        gateway
            .register_service("down", "http://127.0.0.1:9001", ServiceOptions::default())
            .unwrap();
        Arc::new(gateway)
    }

    #[tokio::test]
    async fn test_check_once_updates_registry() {
        let gateway = gateway();
        let monitor = HealthMonitor::new(gateway.clone(), HealthCheckConfig::default());

        assert_eq!(monitor.check_once().await, 1);
        assert!(gateway.registry().lookup("up").unwrap().healthy);
        assert!(!gateway.registry().lookup("down").unwrap().healthy);
    }

    #[tokio::test]
    async fn test_run_stops_on_shutdown() {
        let monitor = HealthMonitor::new(gateway(), HealthCheckConfig::default());
        let (tx, rx) = broadcast::channel(1);

        let handle = tokio::spawn(monitor.run(rx));
        tx.send(()).unwrap();

        time::timeout(Duration::from_secs(5), handle)
            .await
            .unwrap()
            .unwrap();
    }

    #[tokio::test]
    async fn test_disabled_monitor_returns_immediately() {
        let config = HealthCheckConfig {
            enabled: false,
            ..Default::default()
        };
        let (_tx, rx) = broadcast::channel(1);
        HealthMonitor::new(gateway(), config).run(rx).await;
    }
}
