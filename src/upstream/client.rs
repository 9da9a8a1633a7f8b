//! HTTP transport backed by hyper-util's pooled client.

use async_trait::async_trait;
use axum::body::Body;
use axum::http::Request;
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::TokioExecutor,
};
use std::time::Duration;

use crate::upstream::{Transport, TransportError, UpstreamRequest, UpstreamResponse};

#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client<HttpConnector, Body>,
    max_body_bytes: usize,
}

impl HttpTransport {
    pub fn new(connect_timeout: Duration, max_body_bytes: usize) -> Self {
        let mut connector = HttpConnector::new();
        connector.set_connect_timeout(Some(connect_timeout));
        connector.set_nodelay(true);

        let client = Client::builder(TokioExecutor::new()).build(connector);

        Self {
            client,
            max_body_bytes,
        }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, request: UpstreamRequest) -> Result<UpstreamResponse, TransportError> {
        let mut outbound = Request::builder()
            .method(request.method)
            .uri(request.url.as_str())
            .body(Body::from(request.body))
            .map_err(|e| TransportError::InvalidTarget(e.to_string()))?;
        *outbound.headers_mut() = request.headers;

        let response = self.client.request(outbound).await.map_err(|e| {
            if e.is_connect() {
                TransportError::Connect(e.to_string())
            } else {
                TransportError::Request(e.to_string())
            }
        })?;

        let (parts, body) = response.into_parts();
        let body = axum::body::to_bytes(Body::new(body), self.max_body_bytes)
            .await
            .map_err(|e| TransportError::Body(e.to_string()))?;

        Ok(UpstreamResponse {
            status: parts.status,
            headers: parts.headers,
            body,
        })
    }
}
