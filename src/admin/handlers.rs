use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::admin::AdminState;
use crate::gateway::{GatewayError, GatewayStatus, Identity};

#[derive(Serialize)]
pub struct SystemStatus {
    pub version: &'static str,
    #[serde(flatten)]
    pub gateway: GatewayStatus,
}

#[derive(Serialize)]
pub struct CheckResult {
    pub service: String,
    pub healthy: bool,
}

#[derive(Serialize)]
pub struct ResetResult {
    pub identity: String,
    pub reset: bool,
}

pub async fn get_status(State(state): State<AdminState>) -> Json<SystemStatus> {
    Json(SystemStatus {
        version: env!("CARGO_PKG_VERSION"),
        gateway: state.gateway.status(),
    })
}

/// Run one health probe now.
pub async fn check_service(
    State(state): State<AdminState>,
    Path(name): Path<String>,
) -> Response {
    if !state.gateway.registry().contains(&name) {
        return GatewayError::ServiceNotFound(name).into_response();
    }
    let healthy = state.gateway.health_check(&name).await;
    Json(CheckResult {
        service: name,
        healthy,
    })
    .into_response()
}

/// Clear rate-limit state for callers that sent no identity.
pub async fn reset_anonymous(State(state): State<AdminState>) -> (StatusCode, Json<ResetResult>) {
    reset(&state, Identity::Anonymous)
}

/// Clear rate-limit state for one client id. Any id is accepted,
/// including the word `anonymous`.
pub async fn reset_client(
    State(state): State<AdminState>,
    Path(id): Path<String>,
) -> (StatusCode, Json<ResetResult>) {
    reset(&state, Identity::Client(id))
}

fn reset(state: &AdminState, identity: Identity) -> (StatusCode, Json<ResetResult>) {
    state.gateway.reset_identity(&identity);
    (
        StatusCode::OK,
        Json(ResetResult {
            identity: identity.limiter_key().into_owned(),
            reset: true,
        }),
    )
}
