//! Response handling.
//!
//! # Responsibilities
//! - Turn a backend response into the client response
//! - Map gateway errors to HTTP status codes with a JSON body
//!
//! # Design Decisions
//! - Backend status, headers and body pass through unchanged apart from
//!   hop-by-hop headers
//! - Backend timeouts result in 504 Gateway Timeout

use axum::body::Body;
use axum::http::{HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use crate::gateway::{GatewayError, RouteResponse};
use crate::upstream::headers;

pub const X_RATELIMIT_REMAINING: &str = "x-ratelimit-remaining";

/// Build the client response from a backend response.
pub fn from_upstream(upstream: RouteResponse, remaining: Option<u32>) -> Response {
    let mut response = Response::new(Body::from(upstream.body));
    *response.status_mut() = upstream.status;
    *response.headers_mut() = upstream.headers;
    headers::strip_hop_by_hop(response.headers_mut());
    if let Some(remaining) = remaining {
        response
            .headers_mut()
            .insert(X_RATELIMIT_REMAINING, HeaderValue::from(remaining));
    }
    response
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = Json(json!({
            "error": self.kind(),
            "message": self.to_string(),
        }));
        (status, body).into_response()
    }
}

/// Response for an inbound body over the configured limit.
pub fn payload_too_large() -> Response {
    (
        StatusCode::PAYLOAD_TOO_LARGE,
        Json(json!({
            "error": "payload_too_large",
            "message": "request body exceeds the configured limit",
        })),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Bytes;
    use axum::http::{header, HeaderMap};

    #[test]
    fn test_from_upstream_passes_status_and_headers() {
        let mut upstream_headers = HeaderMap::new();
        upstream_headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("text/plain"));
        upstream_headers.insert(header::CONNECTION, HeaderValue::from_static("keep-alive"));

        let response = from_upstream(
            RouteResponse {
                status: StatusCode::IM_A_TEAPOT,
                headers: upstream_headers,
                body: Bytes::from_static(b"short and stout"),
            },
            Some(7),
        );

        assert_eq!(response.status(), StatusCode::IM_A_TEAPOT);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "text/plain");
        assert_eq!(response.headers()[X_RATELIMIT_REMAINING], "7");
        assert!(!response.headers().contains_key(header::CONNECTION));
    }

    #[test]
    fn test_error_status() {
        let response = GatewayError::RateLimited.into_response();
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);

        let response = GatewayError::ServiceNotFound("x".into()).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
