//! Health check endpoint

use axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;

use crate::AppState;

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub module: String,
    pub version: String,
    /// Artifact backend in use ("portable", "remote")
    pub backend: String,
    /// Number of catalog entries across both feature counts
    pub models: usize,
}

/// GET /health
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        module: "cqp-web".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        backend: state.handler.store().backend().to_string(),
        models: state.handler.catalog().iter().count(),
    })
}

/// Build health check routes
pub fn health_routes() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}
