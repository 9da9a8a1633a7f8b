//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum Router for the proxy surface
//! - Wire up middleware (tracing, body limit, request ID)
//! - Translate inbound requests into `Gateway::route` calls
//! - Serve until the shutdown signal fires

use axum::{
    body::Body,
    extract::State,
    http::{HeaderName, Request},
    response::{IntoResponse, Response},
    routing::any,
    Router,
};
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{
    limit::RequestBodyLimitLayer,
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};

use crate::config::GatewayConfig;
use crate::gateway::{Gateway, RequestOptions};
use crate::http::request::{self, MakeRequestUuid, X_REQUEST_ID};
use crate::http::response;

const DEFAULT_CLIENT_ID_HEADER: &str = "x-client-id";

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub gateway: Arc<Gateway>,
    pub client_id_header: HeaderName,
    pub max_body_bytes: usize,
}

/// HTTP front end for the gateway.
pub struct HttpServer {
    router: Router,
}

impl HttpServer {
    pub fn new(gateway: Arc<Gateway>, config: &GatewayConfig) -> Self {
        let client_id_header = HeaderName::from_bytes(config.listener.client_id_header.as_bytes())
            .unwrap_or_else(|_| {
                tracing::warn!(
                    header = %config.listener.client_id_header,
                    "Invalid client id header name, using default"
                );
                HeaderName::from_static(DEFAULT_CLIENT_ID_HEADER)
            });

        let state = AppState {
            gateway,
            client_id_header,
            max_body_bytes: config.limits.max_request_body_bytes,
        };

        Self {
            router: Self::build_router(state),
        }
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(state: AppState) -> Router {
        let request_id = HeaderName::from_static(X_REQUEST_ID);
        let max_body_bytes = state.max_body_bytes;

        Router::new()
            .route("/{service}", any(proxy_handler))
            .route("/{service}/{*path}", any(proxy_handler))
            .with_state(state)
            .layer(RequestBodyLimitLayer::new(max_body_bytes))
            .layer(PropagateRequestIdLayer::new(request_id.clone()))
            .layer(TraceLayer::new_for_http())
            .layer(SetRequestIdLayer::new(request_id, MakeRequestUuid))
    }

    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Serve on `listener` until `shutdown` fires.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Forward `/{service}/{path}` to the named service.
async fn proxy_handler(State(state): State<AppState>, request: Request<Body>) -> Response {
    let (parts, body) = request.into_parts();

    let Some((service, path)) = request::split_target(&parts.uri) else {
        return crate::gateway::GatewayError::ServiceNotFound(String::new()).into_response();
    };
    let identity = request::identity(&parts.headers, &state.client_id_header);
    let request_id = request::request_id(&parts.headers);

    tracing::debug!(
        request_id = request_id.as_deref().unwrap_or("none"),
        method = %parts.method,
        service = %service,
        path = %path,
        "Proxying request"
    );

    let body = match axum::body::to_bytes(body, state.max_body_bytes).await {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::warn!(service = %service, error = %e, "Rejected inbound body");
            return response::payload_too_large();
        }
    };

    let mut options = RequestOptions::new(parts.method);
    options.headers = parts.headers;
    options.body = Some(body);
    options.request_id = request_id;

    match state.gateway.route(service, &path, &identity, options).await {
        Ok(upstream) => response::from_upstream(upstream, state.gateway.remaining(&identity)),
        Err(e) => e.into_response(),
    }
}
