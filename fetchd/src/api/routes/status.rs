//! Job status polling route.

use axum::{
    Json, Router,
    extract::{Path, State},
    routing::get,
};

use crate::api::error::{ApiError, ApiResult};
use crate::api::models::StatusResponse;
use crate::api::server::AppState;
use crate::error::Error;

/// Create the status router.
pub fn router() -> Router<AppState> {
    Router::new().route("/{id}", get(get_status))
}

/// Latest known state of a job.
///
/// Never fails for an in-progress job; failures that happened in the
/// background show up here in the `error` field.
async fn get_status(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<StatusResponse>> {
    let job = state
        .store
        .get(&id)
        .ok_or_else(|| ApiError::from(Error::not_found(id.as_str())))?;

    Ok(Json(StatusResponse::from_job(&job)))
}
