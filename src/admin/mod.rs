//! Admin API: status snapshot, on-demand health checks, limiter resets.

pub mod auth;
pub mod handlers;

use axum::{
    middleware,
    routing::{delete, get, post},
    Router,
};
use std::sync::Arc;

use self::auth::admin_auth_middleware;
use self::handlers::*;
use crate::gateway::Gateway;

#[derive(Clone)]
pub struct AdminState {
    pub gateway: Arc<Gateway>,
    pub api_key: Arc<str>,
}

pub fn setup_admin_router(gateway: Arc<Gateway>, api_key: &str) -> Router {
    let state = AdminState {
        gateway,
        api_key: Arc::from(api_key),
    };

    Router::new()
        .route("/admin/status", get(get_status))
        .route("/admin/services/{name}/check", post(check_service))
        .route("/admin/limits/anonymous", delete(reset_anonymous))
        .route("/admin/limits/clients/{id}", delete(reset_client))
        .layer(middleware::from_fn_with_state(state.clone(), admin_auth_middleware))
        .with_state(state)
}
