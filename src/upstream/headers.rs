//! Header manipulation for forwarded requests.
//!
//! # Responsibilities
//! - Strip hop-by-hop headers and headers the client recomputes
//! - Set the forwarded-identity header
//! - Propagate the request id
//!
//! # Design Decisions
//! - The identity header is always overwritten, never appended, so a caller
//!   cannot smuggle a different identity to the backend

use axum::http::header::{self, HeaderMap, HeaderName, HeaderValue};

pub const X_REQUEST_ID: &str = "x-request-id";

const HOP_BY_HOP: [HeaderName; 8] = [
    header::CONNECTION,
    header::PROXY_AUTHENTICATE,
    header::PROXY_AUTHORIZATION,
    header::TE,
    header::TRAILER,
    header::TRANSFER_ENCODING,
    header::UPGRADE,
    header::HOST,
];

/// Remove headers that must not be forwarded as-is.
pub fn strip_hop_by_hop(headers: &mut HeaderMap) {
    for name in HOP_BY_HOP.iter() {
        headers.remove(name);
    }
    headers.remove("keep-alive");
    headers.remove(header::CONTENT_LENGTH);
}

/// Set `name` to `value`, replacing any existing values. Non-ASCII text is
/// sent as raw UTF-8 bytes; control characters are dropped with a warning.
pub fn set(headers: &mut HeaderMap, name: &HeaderName, value: &str) {
    match HeaderValue::from_bytes(value.as_bytes()) {
        Ok(v) => {
            headers.insert(name.clone(), v);
        }
        Err(_) => {
            headers.remove(name);
            tracing::warn!(header = %name, "Dropping header with invalid value");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_hop_by_hop() {
        let mut headers = HeaderMap::new();
        headers.insert(header::CONNECTION, HeaderValue::from_static("keep-alive"));
        headers.insert("keep-alive", HeaderValue::from_static("timeout=5"));
        headers.insert(header::HOST, HeaderValue::from_static("gateway.local"));
        headers.insert(header::CONTENT_LENGTH, HeaderValue::from_static("12"));
        headers.insert(header::ACCEPT, HeaderValue::from_static("application/json"));

        strip_hop_by_hop(&mut headers);

        assert_eq!(headers.len(), 1);
        assert!(headers.contains_key(header::ACCEPT));
    }

    #[test]
    fn test_set_overwrites() {
        let name = HeaderName::from_static("x-forwarded-for");
        let mut headers = HeaderMap::new();
        headers.append(&name, HeaderValue::from_static("spoofed"));
        headers.append(&name, HeaderValue::from_static("twice"));

        set(&mut headers, &name, "client-1");
        let values: Vec<_> = headers.get_all(&name).iter().collect();
        assert_eq!(values, [&HeaderValue::from_static("client-1")]);
    }

    #[test]
    fn test_set_rejects_invalid_value() {
        let name = HeaderName::from_static("x-forwarded-for");
        let mut headers = HeaderMap::new();
        headers.insert(&name, HeaderValue::from_static("old"));

        set(&mut headers, &name, "bad\nvalue");
        assert!(!headers.contains_key(&name));
    }

    #[test]
    fn test_set_keeps_non_ascii_value() {
        let name = HeaderName::from_static("x-forwarded-for");
        let mut headers = HeaderMap::new();

        set(&mut headers, &name, "ren\u{e9}");
        assert_eq!(headers[&name].as_bytes(), "ren\u{e9}".as_bytes());
    }
}
