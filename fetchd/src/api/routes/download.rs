//! Download job creation route.

use axum::{Json, Router, extract::State, routing::post};
use ytdlp::OutputKind;

use crate::api::error::{ApiError, ApiResult};
use crate::api::models::{DownloadRequest, DownloadResponse};
use crate::api::routes::validate_url;
use crate::api::server::AppState;

/// Create the download router.
pub fn router() -> Router<AppState> {
    Router::new().route("/", post(start_download))
}

/// Create a download job and return its id.
///
/// Validation failures are rejected here, before any job record exists;
/// everything after job creation is reported through status polling.
async fn start_download(
    State(state): State<AppState>,
    Json(request): Json<DownloadRequest>,
) -> ApiResult<Json<DownloadResponse>> {
    let url = validate_url(&request.url)?;

    if request.format_id.trim().is_empty() {
        return Err(ApiError::validation("format_id must not be empty"));
    }

    let output_kind: OutputKind = request
        .output_format
        .parse()
        .map_err(ApiError::validation)?;

    let job_id = state
        .manager
        .start(String::from(url), request.format_id, output_kind)
        .map_err(ApiError::from)?;

    Ok(Json(DownloadResponse {
        success: true,
        job_id,
        message: "Download started".to_string(),
    }))
}
