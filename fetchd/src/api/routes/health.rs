//! Health check routes.

use axum::{
    Json, Router, extract::State, http::StatusCode, response::IntoResponse, routing::get,
};

use crate::api::models::HealthResponse;
use crate::api::server::AppState;

/// Create the health router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(health_check))
        .route("/live", get(liveness_check))
}

/// Health check endpoint.
async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_secs: state.start_time.elapsed().as_secs(),
        active_jobs: state.store.len(),
    })
}

/// Liveness check - is the service alive?
async fn liveness_check(State(state): State<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(serde_json::json!({
            "status": "alive",
            "uptime_secs": state.start_time.elapsed().as_secs()
        })),
    )
}
