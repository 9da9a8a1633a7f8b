//! Gateway error taxonomy.
//!
//! Every failure of `route` is one of these; none is retried internally and
//! none is fatal to the process.

use axum::http::StatusCode;
use thiserror::Error;

use crate::upstream::TransportError;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum GatewayError {
    /// Unknown service name. Permanent until configuration changes.
    #[error("service {0} not found")]
    ServiceNotFound(String),

    /// The caller exceeded its admission quota.
    #[error("rate limit exceeded")]
    RateLimited,

    /// The backend is presumed unhealthy and was not called.
    #[error("circuit breaker for {0} is open")]
    CircuitOpen(String),

    /// The backend call itself failed.
    #[error("upstream unavailable: {0}")]
    UpstreamUnavailable(#[source] TransportError),
}

impl GatewayError {
    /// HTTP status reported to an inbound caller.
    pub fn status_code(&self) -> StatusCode {
        match self {
            GatewayError::ServiceNotFound(_) => StatusCode::NOT_FOUND,
            GatewayError::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            GatewayError::CircuitOpen(_) => StatusCode::SERVICE_UNAVAILABLE,
            GatewayError::UpstreamUnavailable(e) if e.is_timeout() => StatusCode::GATEWAY_TIMEOUT,
            GatewayError::UpstreamUnavailable(_) => StatusCode::BAD_GATEWAY,
        }
    }

    /// Short label for metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            GatewayError::ServiceNotFound(_) => "service_not_found",
            GatewayError::RateLimited => "rate_limited",
            GatewayError::CircuitOpen(_) => "circuit_open",
            GatewayError::UpstreamUnavailable(_) => "upstream_unavailable",
        }
    }

    /// Whether trying again later may succeed.
    pub fn is_transient(&self) -> bool {
        !matches!(self, GatewayError::ServiceNotFound(_))
    }
}

/// Rejected service registration.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RegistrationError {
    #[error("invalid service name: {0:?}")]
    InvalidName(String),

    #[error("invalid base address for {service}: {reason}")]
    InvalidAddress { service: String, reason: String },
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_status_codes() {
        assert_eq!(
            GatewayError::ServiceNotFound("x".into()).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(GatewayError::RateLimited.status_code(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(
            GatewayError::CircuitOpen("x".into()).status_code(),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            GatewayError::UpstreamUnavailable(TransportError::Connect("refused".into())).status_code(),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            GatewayError::UpstreamUnavailable(TransportError::Timeout(Duration::from_secs(1)))
                .status_code(),
            StatusCode::GATEWAY_TIMEOUT
        );
    }

    #[test]
    fn test_only_not_found_is_permanent() {
        assert!(!GatewayError::ServiceNotFound("x".into()).is_transient());
        assert!(GatewayError::RateLimited.is_transient());
        assert!(GatewayError::CircuitOpen("x".into()).is_transient());
    }
}
