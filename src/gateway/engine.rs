//! Request orchestration.
//!
//! # Responsibilities
//! - Resolve the target service
//! - Consult the circuit breaker, then the rate limiter
//! - Forward the request and settle the breaker from the outcome
//! - Health probes and status snapshots over the same state
//!
//! # Design Decisions
//! - Breaker before limiter: a known-dead backend never costs a caller quota
//! - Settlement happens once, after the call completes; an abandoned call
//!   settles nothing
//! - A response of any status is a breaker success
//! - Breaker trips mark the service unhealthy; closing marks it healthy

use axum::http::{HeaderName, StatusCode};
use futures_util::future::join_all;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::clock::{Clock, SystemClock};
use crate::config::validation::check_base_address;
use crate::config::{GatewayConfig, ServiceConfig};
use crate::gateway::error::{GatewayError, RegistrationError};
use crate::gateway::identity::Identity;
use crate::gateway::options::{RequestOptions, ServiceOptions};
use crate::gateway::status::GatewayStatus;
use crate::observability::metrics;
use crate::ratelimit::{build_limiter, RateLimiter};
use crate::registry::{Registration, ServiceEntry, ServiceRegistry};
use crate::resilience::timeouts::bounded;
use crate::resilience::{CircuitBreakers, CircuitState};
use crate::upstream::headers::{self, X_REQUEST_ID};
use crate::upstream::{
    target, HttpTransport, Transport, TransportError, UpstreamRequest, UpstreamResponse,
};

/// A backend response returned to the caller unchanged.
pub type RouteResponse = UpstreamResponse;

/// Result of one `route` call.
pub type RouteOutcome = Result<RouteResponse, GatewayError>;

const DEFAULT_IDENTITY_HEADER: &str = "x-forwarded-for";

#[derive(Debug, Clone)]
struct Settings {
    identity_header: HeaderName,
    request_timeout: Duration,
    health_path: String,
    health_timeout: Duration,
}

impl Settings {
    fn from_config(config: &GatewayConfig) -> Self {
        let identity_header = HeaderName::from_bytes(config.forwarding.identity_header.as_bytes())
            .unwrap_or_else(|_| {
                tracing::warn!(
                    header = %config.forwarding.identity_header,
                    "Invalid identity header name, using default"
                );
                HeaderName::from_static(DEFAULT_IDENTITY_HEADER)
            });

        Self {
            identity_header,
            request_timeout: Duration::from_secs(config.timeouts.request_secs),
            health_path: config.health_check.path.clone(),
            health_timeout: Duration::from_secs(config.health_check.timeout_secs),
        }
    }
}

/// The gateway engine.
#[derive(Debug)]
pub struct Gateway {
    registry: ServiceRegistry,
    breakers: CircuitBreakers,
    limiter: Arc<dyn RateLimiter>,
    transport: Arc<dyn Transport>,
    settings: Settings,
}

impl Gateway {
    /// Build a gateway using the system clock and the HTTP transport.
    pub fn new(config: &GatewayConfig) -> Self {
        let transport = HttpTransport::new(
            Duration::from_secs(config.timeouts.connect_secs),
            config.limits.max_response_body_bytes,
        );
        Self::with_parts(config, Arc::new(SystemClock), Arc::new(transport))
    }

    /// Build a gateway from explicit collaborators.
    pub fn with_parts(
        config: &GatewayConfig,
        clock: Arc<dyn Clock>,
        transport: Arc<dyn Transport>,
    ) -> Self {
        Self {
            registry: ServiceRegistry::new(clock.clone()),
            breakers: CircuitBreakers::new(config.circuit_breaker, clock.clone()),
            limiter: build_limiter(&config.rate_limit, clock),
            transport,
            settings: Settings::from_config(config),
        }
    }

    /// Register a backend, or update the address of a known one.
    ///
    /// The service's breaker is created closed on first registration and
    /// keeps its state on re-registration.
    pub fn register_service(
        &self,
        name: &str,
        base_address: &str,
        options: ServiceOptions,
    ) -> Result<Registration, RegistrationError> {
        if name.is_empty() || name.contains('/') {
            return Err(RegistrationError::InvalidName(name.to_owned()));
        }
        let url = check_base_address(base_address).map_err(|reason| {
            RegistrationError::InvalidAddress {
                service: name.to_owned(),
                reason,
            }
        })?;

        self.breakers.ensure(name, options.circuit_breaker);
        let registration = self.registry.register(name, url);

        tracing::info!(
            service = %name,
            base_address = %base_address,
            registration = ?registration,
            "Service registered"
        );
        Ok(registration)
    }

    /// Register every configured service, stopping at the first invalid one.
    pub fn register_all(&self, services: &[ServiceConfig]) -> Result<usize, RegistrationError> {
        for service in services {
            self.register_service(&service.name, &service.base_address, service.into())?;
        }
        Ok(services.len())
    }

    /// Forward one request to `service`.
    pub async fn route(
        &self,
        service: &str,
        path: &str,
        identity: &Identity,
        options: RequestOptions,
    ) -> RouteOutcome {
        let start = Instant::now();
        let outcome = self.dispatch(service, path, identity, options).await;
        metrics::record_route(service, &outcome, start);
        outcome
    }

    async fn dispatch(
        &self,
        service: &str,
        path: &str,
        identity: &Identity,
        options: RequestOptions,
    ) -> RouteOutcome {
        let entry = self
            .registry
            .lookup(service)
            .ok_or_else(|| GatewayError::ServiceNotFound(service.to_owned()))?;

        let permit = self.breakers.may_attempt(service).ok_or_else(|| {
            tracing::debug!(service = %service, "Circuit open, request short-circuited");
            GatewayError::CircuitOpen(service.to_owned())
        })?;

        if identity.is_rate_limited() {
            let key = identity.limiter_key();
            if !self.limiter.is_allowed(&key) {
                tracing::warn!(service = %service, identity = %key, "Rate limit exceeded");
                metrics::record_rate_limited(service);
                return Err(GatewayError::RateLimited);
            }
        }

        let timeout = options.timeout.unwrap_or(self.settings.request_timeout);
        let request = self
            .build_request(&entry, path, identity, options)
            .map_err(GatewayError::UpstreamUnavailable)?;

        tracing::debug!(
            service = %service,
            method = %request.method,
            url = %request.url,
            identity = %identity,
            "Forwarding request"
        );

        match bounded(timeout, self.transport.send(request)).await {
            Ok(response) => {
                if permit.record(true) == Some(CircuitState::Closed) {
                    self.observe_health(service, true);
                }
                Ok(response)
            }
            Err(e) => {
                tracing::error!(service = %service, error = %e, "Upstream error");
                if permit.record(false) == Some(CircuitState::Open) {
                    self.observe_health(service, false);
                }
                Err(GatewayError::UpstreamUnavailable(e))
            }
        }
    }

    fn build_request(
        &self,
        entry: &ServiceEntry,
        path: &str,
        identity: &Identity,
        options: RequestOptions,
    ) -> Result<UpstreamRequest, TransportError> {
        let url = target::join(&entry.base_address, path)?;

        let mut request_headers = options.headers;
        headers::strip_hop_by_hop(&mut request_headers);
        headers::set(
            &mut request_headers,
            &self.settings.identity_header,
            identity.forwarded_value(),
        );
        if let Some(id) = &options.request_id {
            headers::set(&mut request_headers, &HeaderName::from_static(X_REQUEST_ID), id);
        }

        Ok(UpstreamRequest {
            method: options.method,
            url,
            headers: request_headers,
            body: options.body.unwrap_or_default(),
        })
    }

    /// Probe `service` on the health path and record the result.
    ///
    /// Healthy means the probe got a 200. Every failure, including an open
    /// circuit, records unhealthy. Unknown services report `false` and
    /// nothing is written.
    pub async fn health_check(&self, service: &str) -> bool {
        let options = RequestOptions::default().timeout(self.settings.health_timeout);
        let healthy = match self
            .route(service, &self.settings.health_path, &Identity::HealthProbe, options)
            .await
        {
            Ok(response) if response.status == StatusCode::OK => true,
            Ok(response) => {
                tracing::warn!(service = %service, status = %response.status, "Health check failed: non-200 status");
                false
            }
            Err(e) => {
                tracing::warn!(service = %service, error = %e, "Health check failed");
                false
            }
        };

        self.observe_health(service, healthy);
        healthy
    }

    /// Probe every registered service concurrently.
    pub async fn check_all(&self) -> Vec<(String, bool)> {
        let names = self.registry.names();
        let results = join_all(names.iter().map(|name| self.health_check(name))).await;
        names.into_iter().zip(results).collect()
    }

    fn observe_health(&self, service: &str, healthy: bool) {
        match self.registry.set_health(service, healthy) {
            Some(previous) => {
                if previous != healthy {
                    tracing::info!(service = %service, healthy, "Service health changed");
                }
                metrics::record_service_health(service, healthy);
            }
            None => tracing::debug!(service = %service, "Health update for unknown service ignored"),
        }
    }

    /// Read-only snapshot of services and breakers.
    pub fn status(&self) -> GatewayStatus {
        GatewayStatus {
            services: self.registry.snapshot(),
            circuit_breakers: self.breakers.snapshot(),
        }
    }

    /// Remaining quota for `identity`, when the strategy has one.
    pub fn remaining(&self, identity: &Identity) -> Option<u32> {
        if !identity.is_rate_limited() {
            return None;
        }
        self.limiter.remaining(&identity.limiter_key())
    }

    /// Clear admission state for one identity.
    pub fn reset_identity(&self, identity: &Identity) {
        self.limiter.reset(&identity.limiter_key());
        tracing::info!(identity = %identity, "Rate limit state reset");
    }

    pub fn registry(&self) -> &ServiceRegistry {
        &self.registry
    }

    pub fn breakers(&self) -> &CircuitBreakers {
        &self.breakers
    }

    pub fn limiter(&self) -> Arc<dyn RateLimiter> {
        self.limiter.clone()
    }
}
