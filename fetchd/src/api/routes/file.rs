//! Artifact delivery route.
//!
//! Streams a completed job's file to the caller exactly once. The on-disk
//! artifact is removed when the transfer ends, whether it completed or was
//! aborted mid-stream; a second request for the same job gets `EXPIRED`.

use std::path::PathBuf;

use axum::Router;
use axum::body::Body;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, HeaderValue, header};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use futures::StreamExt;
use tokio_util::io::ReaderStream;
use tracing::{debug, warn};

use crate::api::error::{ApiError, ApiResult};
use crate::api::server::AppState;
use crate::error::Error;
use crate::jobs::{JobStatus, JobStore};

/// Create the file router.
pub fn router() -> Router<AppState> {
    Router::new().route("/{id}", get(get_file))
}

/// Resolve a job into a deliverable artifact, consuming its filepath.
///
/// The take is atomic: of two racing deliveries, or a delivery racing the
/// safety-net cleanup, only one obtains the path; the other sees `Expired`.
fn claim_artifact(store: &JobStore, id: &str) -> crate::Result<(PathBuf, String)> {
    let job = store.get(id).ok_or_else(|| Error::not_found(id))?;

    if job.status != JobStatus::Completed {
        return Err(Error::NotReady {
            status: job.status.to_string(),
        });
    }

    let filename = job.filename.unwrap_or_else(|| "download".to_string());
    let path = store.take_filepath(id).ok_or(Error::Expired)?;
    if !path.exists() {
        return Err(Error::Expired);
    }

    Ok((path, filename))
}

/// Stream a completed artifact to the caller and delete it afterwards.
async fn get_file(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Response> {
    let (path, filename) = claim_artifact(&state.store, &id).map_err(ApiError::from)?;

    let file = tokio::fs::File::open(&path).await.map_err(|error| {
        warn!(job_id = %id, path = %path.display(), %error, "artifact vanished before delivery");
        ApiError::from(Error::Expired)
    })?;
    let size = file.metadata().await.map(|m| m.len()).ok();

    debug!(job_id = %id, file = %filename, "delivering artifact");

    // The guard rides along with the stream; its drop deletes the artifact
    // once the transfer ends, finished or aborted.
    let guard = RemoveOnDrop {
        path,
        job_id: id,
    };
    let stream = ReaderStream::new(file).map(move |chunk| {
        let _ = &guard;
        chunk
    });

    let mut headers = HeaderMap::new();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("application/octet-stream"),
    );
    if let Some(size) = size {
        headers.insert(header::CONTENT_LENGTH, HeaderValue::from(size));
    }
    let disposition = format!("attachment; filename=\"{filename}\"");
    headers.insert(
        header::CONTENT_DISPOSITION,
        HeaderValue::from_str(&disposition)
            .map_err(|e| ApiError::internal(format!("unusable filename header: {e}")))?,
    );

    Ok((headers, Body::from_stream(stream)).into_response())
}

/// Deletes the artifact when the delivery stream is dropped.
///
/// Deletion is best-effort: a failure is logged, never surfaced to the
/// caller.
struct RemoveOnDrop {
    path: PathBuf,
    job_id: String,
}

impl Drop for RemoveOnDrop {
    fn drop(&mut self) {
        if let Err(error) = std::fs::remove_file(&self.path) {
            warn!(
                job_id = %self.job_id,
                path = %self.path.display(),
                %error,
                "failed to remove delivered artifact"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jobs::Job;

    fn completed_job(store: &JobStore, id: &str, path: PathBuf) {
        store.create(id).unwrap();
        store.update(id, |job: &mut Job| {
            job.status = JobStatus::Completed;
            job.filepath = Some(path);
            job.filename = Some("My Video.mp4".to_string());
            job.filesize = Some(4);
            job.progress = "100%".to_string();
        });
    }

    #[test]
    fn test_claim_unknown_job_is_not_found() {
        let store = JobStore::new();
        assert!(matches!(
            claim_artifact(&store, "missing"),
            Err(Error::NotFound { .. })
        ));
    }

    #[test]
    fn test_claim_pending_job_is_not_ready() {
        let store = JobStore::new();
        store.create("a").unwrap();

        let err = claim_artifact(&store, "a").unwrap_err();
        assert!(matches!(err, Error::NotReady { ref status } if status == "pending"));
    }

    #[test]
    fn test_claim_succeeds_once_then_expires() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.mp4");
        std::fs::write(&path, b"data").unwrap();

        let store = JobStore::new();
        completed_job(&store, "a", path.clone());

        let (claimed, filename) = claim_artifact(&store, "a").unwrap();
        assert_eq!(claimed, path);
        assert_eq!(filename, "My Video.mp4");

        assert!(matches!(claim_artifact(&store, "a"), Err(Error::Expired)));
    }

    #[test]
    fn test_claim_with_missing_file_is_expired() {
        let dir = tempfile::tempdir().unwrap();
        let store = JobStore::new();
        completed_job(&store, "a", dir.path().join("never-written.mp4"));

        assert!(matches!(claim_artifact(&store, "a"), Err(Error::Expired)));
    }

    #[test]
    fn test_remove_on_drop_deletes_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.mp4");
        std::fs::write(&path, b"data").unwrap();

        drop(RemoveOnDrop {
            path: path.clone(),
            job_id: "a".to_string(),
        });

        assert!(!path.exists());
    }
}
