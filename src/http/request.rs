//! Inbound request handling.
//!
//! # Responsibilities
//! - Generate a request ID (UUID v4) when the caller sent none
//! - Derive the target service, path and caller identity
//!
//! # Design Decisions
//! - Request ID added as early as possible for tracing
//! - The first path segment names the service; the rest is forwarded verbatim

use axum::http::{HeaderMap, HeaderName, HeaderValue, Request, Uri};
use tower_http::request_id::{MakeRequestId, RequestId};

use crate::gateway::Identity;

pub use crate::upstream::headers::X_REQUEST_ID;

/// Generates UUID v4 request IDs.
#[derive(Debug, Clone, Copy, Default)]
pub struct MakeRequestUuid;

impl MakeRequestId for MakeRequestUuid {
    fn make_request_id<B>(&mut self, _request: &Request<B>) -> Option<RequestId> {
        let id = uuid::Uuid::new_v4().to_string();
        HeaderValue::from_str(&id).ok().map(RequestId::new)
    }
}

/// Request ID set by the request-id layer, if any.
pub fn request_id(headers: &HeaderMap) -> Option<String> {
    headers
        .get(X_REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .map(str::to_owned)
}

/// Split `/service/rest?query` into the service name and the path forwarded
/// to it. A bare `/service` forwards `/`.
pub fn split_target(uri: &Uri) -> Option<(&str, String)> {
    let trimmed = uri.path().strip_prefix('/')?;
    let (service, rest) = match trimmed.split_once('/') {
        Some((service, rest)) => (service, rest),
        None => (trimmed, ""),
    };
    if service.is_empty() {
        return None;
    }

    let mut path = format!("/{rest}");
    if let Some(query) = uri.query() {
        path.push('?');
        path.push_str(query);
    }
    Some((service, path))
}

/// Caller identity from the configured client-id header. Values with
/// non-ASCII bytes are decoded lossily rather than treated as anonymous.
pub fn identity(headers: &HeaderMap, header: &HeaderName) -> Identity {
    let Some(value) = headers.get(header) else {
        return Identity::Anonymous;
    };
    match value.to_str() {
        Ok(v) => Identity::from_header(Some(v)),
        Err(_) => {
            let decoded = String::from_utf8_lossy(value.as_bytes());
            tracing::debug!(header = %header, client = %decoded, "Client id is not visible ASCII");
            Identity::from_header(Some(&decoded))
        }
    }
}
