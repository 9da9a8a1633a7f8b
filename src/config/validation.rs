//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Service names unique, base addresses usable as http prefixes
//! - Validate value ranges (windows, capacities, thresholds > 0)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: GatewayConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::collections::HashSet;
use std::net::SocketAddr;
use thiserror::Error;
use url::Url;

use crate::config::schema::{CircuitBreakerConfig, GatewayConfig, RateLimitStrategy};

/// A single semantic problem in a configuration.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("invalid bind address for {field}: {value}")]
    BindAddress { field: &'static str, value: String },

    #[error("service name must not be empty or contain '/': {0:?}")]
    ServiceName(String),

    #[error("duplicate service name: {0}")]
    DuplicateService(String),

    #[error("service {service}: invalid base address {address}: {reason}")]
    BaseAddress {
        service: String,
        address: String,
        reason: String,
    },

    #[error("{0} must be greater than zero")]
    Zero(&'static str),

    #[error("health check path must start with '/': {0}")]
    HealthPath(String),

    #[error("header name is not valid: {0}")]
    HeaderName(String),
}

/// Validate a whole configuration, collecting every error.
pub fn validate_config(config: &GatewayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    check_bind(&mut errors, "listener.bind_address", &config.listener.bind_address);
    if config.admin.enabled {
        check_bind(&mut errors, "admin.bind_address", &config.admin.bind_address);
    }
    if config.observability.metrics_enabled {
        check_bind(
            &mut errors,
            "observability.metrics_address",
            &config.observability.metrics_address,
        );
    }

    for header in [
        &config.listener.client_id_header,
        &config.forwarding.identity_header,
    ] {
        if axum::http::HeaderName::from_bytes(header.as_bytes()).is_err() {
            errors.push(ValidationError::HeaderName(header.clone()));
        }
    }

    let mut seen = HashSet::new();
    for service in &config.services {
        if service.name.is_empty() || service.name.contains('/') {
            errors.push(ValidationError::ServiceName(service.name.clone()));
        }
        if !seen.insert(service.name.as_str()) {
            errors.push(ValidationError::DuplicateService(service.name.clone()));
        }
        if let Err(reason) = check_base_address(&service.base_address) {
            errors.push(ValidationError::BaseAddress {
                service: service.name.clone(),
                address: service.base_address.clone(),
                reason,
            });
        }
        if let Some(cb) = &service.circuit_breaker {
            check_breaker(&mut errors, cb);
        }
    }

    let rl = &config.rate_limit;
    if matches!(rl.strategy, RateLimitStrategy::SlidingWindow | RateLimitStrategy::Hybrid) {
        if rl.max_requests == 0 {
            errors.push(ValidationError::Zero("rate_limit.max_requests"));
        }
        if rl.window_ms == 0 {
            errors.push(ValidationError::Zero("rate_limit.window_ms"));
        }
    }
    if rl.strategy == RateLimitStrategy::TokenBucket {
        if rl.capacity == 0 {
            errors.push(ValidationError::Zero("rate_limit.capacity"));
        }
        if rl.refill_per_sec <= 0.0 {
            errors.push(ValidationError::Zero("rate_limit.refill_per_sec"));
        }
    }
    if rl.strategy == RateLimitStrategy::Hybrid && rl.burst_size == 0 {
        errors.push(ValidationError::Zero("rate_limit.burst_size"));
    }

    check_breaker(&mut errors, &config.circuit_breaker);

    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::Zero("timeouts.request_secs"));
    }
    if config.timeouts.connect_secs == 0 {
        errors.push(ValidationError::Zero("timeouts.connect_secs"));
    }

    let hc = &config.health_check;
    if !hc.path.starts_with('/') {
        errors.push(ValidationError::HealthPath(hc.path.clone()));
    }
    if hc.enabled {
        if hc.interval_secs == 0 {
            errors.push(ValidationError::Zero("health_check.interval_secs"));
        }
        if hc.timeout_secs == 0 {
            errors.push(ValidationError::Zero("health_check.timeout_secs"));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Parse and check a base address. Only absolute http URLs without a
/// query or fragment can act as a path prefix. TLS to backends is left to
/// the surrounding environment.
pub fn check_base_address(address: &str) -> Result<Url, String> {
    let url = Url::parse(address).map_err(|e| e.to_string())?;
    if url.scheme() != "http" {
        return Err(format!("unsupported scheme {}", url.scheme()));
    }
    if url.host_str().is_none() {
        return Err("missing host".to_string());
    }
    if url.query().is_some() || url.fragment().is_some() {
        return Err("query and fragment are not allowed".to_string());
    }
    Ok(url)
}

fn check_bind(errors: &mut Vec<ValidationError>, field: &'static str, value: &str) {
    if value.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::BindAddress {
            field,
            value: value.to_string(),
        });
    }
}

fn check_breaker(errors: &mut Vec<ValidationError>, cb: &CircuitBreakerConfig) {
    if cb.failure_threshold == 0 {
        errors.push(ValidationError::Zero("circuit_breaker.failure_threshold"));
    }
}
