//! Outbound calls to backend services.
//!
//! # Data Flow
//! ```text
//! Gateway::route
//!     → target.rs (join base address and path)
//!     → headers.rs (strip hop-by-hop, inject identity + request id)
//!     → Transport::send (client.rs: hyper-util legacy client)
//!     → UpstreamResponse or TransportError
//! ```
//!
//! # Design Decisions
//! - One request, one response; the body is buffered up to a limit
//! - Any HTTP status is a response; only transport problems are errors
//! - The transport is a trait so the engine can be exercised without sockets

pub mod client;
pub mod headers;
pub mod target;

use async_trait::async_trait;
use axum::body::Bytes;
use axum::http::{HeaderMap, Method, StatusCode};
use std::time::Duration;
use thiserror::Error;
use url::Url;

pub use client::HttpTransport;

/// A fully built backend request.
#[derive(Debug, Clone)]
pub struct UpstreamRequest {
    pub method: Method,
    pub url: Url,
    pub headers: HeaderMap,
    pub body: Bytes,
}

/// A backend response, passed back to the caller unchanged.
#[derive(Debug, Clone, PartialEq)]
pub struct UpstreamResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

/// Transport-level failure: no usable response was received.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TransportError {
    #[error("invalid upstream target: {0}")]
    InvalidTarget(String),

    #[error("connection failed: {0}")]
    Connect(String),

    #[error("request failed: {0}")]
    Request(String),

    #[error("timed out after {0:?}")]
    Timeout(Duration),

    #[error("malformed response body: {0}")]
    Body(String),
}

impl TransportError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, TransportError::Timeout(_))
    }
}

/// Performs one request/response exchange with a backend.
#[async_trait]
pub trait Transport: Send + Sync + std::fmt::Debug {
    async fn send(&self, request: UpstreamRequest) -> Result<UpstreamResponse, TransportError>;
}
