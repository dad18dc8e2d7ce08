//! Media analysis route.

use axum::{Json, Router, extract::State, routing::post};
use tracing::debug;

use crate::api::error::{ApiError, ApiResult};
use crate::api::models::{AnalyzeRequest, AnalyzeResponse};
use crate::api::routes::validate_url;
use crate::api::server::AppState;

/// Create the analyze router.
pub fn router() -> Router<AppState> {
    Router::new().route("/", post(analyze))
}

/// Probe a URL for its title, duration, thumbnail, and selectable formats.
///
/// Metadata only: no media is downloaded here, and nothing is cached; each
/// call produces a fresh format list.
async fn analyze(
    State(state): State<AppState>,
    Json(request): Json<AnalyzeRequest>,
) -> ApiResult<Json<AnalyzeResponse>> {
    let url = validate_url(&request.url)?;
    debug!(url = %url, "analyze requested");

    let info = state
        .extractor
        .probe(url.as_str())
        .await
        .map_err(ApiError::from)?;

    Ok(Json(AnalyzeResponse::from(info)))
}
