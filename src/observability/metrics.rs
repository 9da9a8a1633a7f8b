//! Metrics collection and exposition.
//!
//! # Metrics
//! - `gateway_requests_total` (counter): route outcomes by service, outcome
//! - `gateway_request_duration_seconds` (histogram): route latency by service
//! - `gateway_rate_limited_total` (counter): admission rejections by service
//! - `gateway_circuit_transitions_total` (counter): breaker transitions by service, state
//! - `gateway_circuit_state` (gauge): 0=closed, 1=half_open, 2=open
//! - `gateway_service_health` (gauge): 1=healthy, 0=unhealthy
//! - `gateway_limiter_evictions_total` (counter): idle limiter records dropped
//! - `gateway_limiter_tracked_identities` (gauge): limiter records held
//!
//! Recording is a no-op until [`init_metrics`] installs the exporter, so
//! tests and embedders pay nothing.

use metrics_exporter_prometheus::{Matcher, PrometheusBuilder};
use std::net::SocketAddr;
use std::time::Instant;

use crate::gateway::{GatewayError, RouteOutcome};
use crate::resilience::CircuitState;

const LATENCY_BUCKETS: &[f64] = &[
    0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0,
];

/// Label for requests naming a service that is not registered. Keeps
/// caller-controlled strings out of label values.
const UNKNOWN_SERVICE: &str = "unknown";

/// Install the Prometheus recorder and its scrape listener on `addr`.
pub fn init_metrics(addr: SocketAddr) {
    let builder = match PrometheusBuilder::new()
        .with_http_listener(addr)
        .set_buckets_for_metric(
            Matcher::Full("gateway_request_duration_seconds".to_string()),
            LATENCY_BUCKETS,
        ) {
        Ok(builder) => builder,
        Err(e) => {
            tracing::error!(error = %e, "Failed to configure metrics exporter");
            return;
        }
    };

    match builder.install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_route(service: &str, outcome: &RouteOutcome, start: Instant) {
    let (service, label) = match outcome {
        Ok(_) => (service, "ok"),
        Err(GatewayError::ServiceNotFound(_)) => (UNKNOWN_SERVICE, "service_not_found"),
        Err(e) => (service, e.kind()),
    };
    let service = service.to_owned();

    metrics::counter!("gateway_requests_total", "service" => service.clone(), "outcome" => label)
        .increment(1);
    metrics::histogram!("gateway_request_duration_seconds", "service" => service)
        .record(start.elapsed().as_secs_f64());
}

pub fn record_rate_limited(service: &str) {
    metrics::counter!("gateway_rate_limited_total", "service" => service.to_owned()).increment(1);
}

pub fn record_circuit_transition(service: &str, state: CircuitState) {
    let level = match state {
        CircuitState::Closed => 0.0,
        CircuitState::HalfOpen => 1.0,
        CircuitState::Open => 2.0,
    };
    metrics::counter!(
        "gateway_circuit_transitions_total",
        "service" => service.to_owned(),
        "state" => state.to_string()
    )
    .increment(1);
    metrics::gauge!("gateway_circuit_state", "service" => service.to_owned()).set(level);
}

pub fn record_service_health(service: &str, healthy: bool) {
    metrics::gauge!("gateway_service_health", "service" => service.to_owned())
        .set(if healthy { 1.0 } else { 0.0 });
}

pub fn record_limiter_sweep(evicted: usize, tracked: usize) {
    metrics::counter!("gateway_limiter_evictions_total").increment(evicted as u64);
    metrics::gauge!("gateway_limiter_tracked_identities").set(tracked as f64);
}
