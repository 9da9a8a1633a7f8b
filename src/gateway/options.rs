//! Per-call request options.

use axum::body::Bytes;
use axum::http::{HeaderMap, HeaderName, HeaderValue, Method};
use std::time::Duration;

use crate::config::{CircuitBreakerConfig, ServiceConfig};

/// How to build the backend request for one `route` call.
#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
    pub method: Method,
    pub headers: HeaderMap,
    pub body: Option<Bytes>,
    /// Overrides the configured request timeout.
    pub timeout: Option<Duration>,
    /// Propagated as `x-request-id`.
    pub request_id: Option<String>,
}

impl RequestOptions {
    pub fn new(method: Method) -> Self {
        Self {
            method,
            ..Default::default()
        }
    }

    pub fn header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = Some(body.into());
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn request_id(mut self, id: impl Into<String>) -> Self {
        self.request_id = Some(id.into());
        self
    }
}

/// Settings supplied when a service is registered.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ServiceOptions {
    /// Breaker thresholds for this service; gateway defaults when `None`.
    pub circuit_breaker: Option<CircuitBreakerConfig>,
}

impl From<&ServiceConfig> for ServiceOptions {
    fn from(config: &ServiceConfig) -> Self {
        Self {
            circuit_breaker: config.circuit_breaker,
        }
    }
}
