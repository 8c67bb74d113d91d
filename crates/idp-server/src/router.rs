//! Router configuration.
//!
//! This module creates the main Axum router that combines all endpoints.

use axum::{Router, http::StatusCode, response::Json, routing::get};
use idp_protocol_oidc::{OidcState, oidc_router};
use serde::Serialize;
use tower_http::trace::TraceLayer;

/// Creates the main application router.
pub fn create_router(state: OidcState) -> Router {
    let oidc = oidc_router().with_state(state);

    let health = Router::new()
        .route("/health", get(health_check))
        .route("/health/live", get(liveness_check));

    Router::new()
        .merge(oidc)
        .merge(health)
        .route("/", get(root))
        .layer(TraceLayer::new_for_http())
}

/// Root endpoint handler.
async fn root() -> Json<ServerInfo> {
    Json(ServerInfo {
        name: "idp-server".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Health check response.
#[derive(Serialize)]
pub struct HealthResponse {
    status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    version: Option<String>,
}

/// Server information response.
#[derive(Serialize)]
pub struct ServerInfo {
    name: String,
    version: String,
}

/// Basic health check.
async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        version: Some(env!("CARGO_PKG_VERSION").to_string()),
    })
}

/// Liveness probe.
async fn liveness_check() -> StatusCode {
    StatusCode::OK
}
