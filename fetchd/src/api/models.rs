//! Request and response bodies for the API.

use serde::{Deserialize, Serialize};
use ytdlp::{FormatDescriptor, MediaInfo};

use crate::jobs::Job;

/// Body for `POST /api/analyze`.
#[derive(Debug, Clone, Deserialize)]
pub struct AnalyzeRequest {
    pub url: String,
}

/// Successful analyze result.
#[derive(Debug, Clone, Serialize)]
pub struct AnalyzeResponse {
    pub success: bool,
    pub title: String,
    /// Duration in whole seconds.
    pub duration: u64,
    pub thumbnail: String,
    pub formats: Vec<FormatDescriptor>,
}

impl From<MediaInfo> for AnalyzeResponse {
    fn from(info: MediaInfo) -> Self {
        Self {
            success: true,
            title: info.title,
            duration: info.duration,
            thumbnail: info.thumbnail,
            formats: info.formats,
        }
    }
}

/// Body for `POST /api/download`.
#[derive(Debug, Clone, Deserialize)]
pub struct DownloadRequest {
    pub url: String,
    /// Probe-selected format identifier.
    pub format_id: String,
    /// Requested delivery container: mp4, m4a, webm, or mp3.
    pub output_format: String,
}

/// Body returned when a download job is accepted.
#[derive(Debug, Clone, Serialize)]
pub struct DownloadResponse {
    pub success: bool,
    pub job_id: String,
    pub message: String,
}

/// Body for `GET /api/status/{id}`.
#[derive(Debug, Clone, Serialize)]
pub struct StatusResponse {
    pub job_id: String,
    pub status: String,
    pub progress: String,
    pub speed: String,
    pub filename: String,
    pub filesize: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl StatusResponse {
    /// Latest known state of a job, with empty-string/zero defaults for
    /// fields the job has not reached yet.
    pub fn from_job(job: &Job) -> Self {
        Self {
            job_id: job.id.clone(),
            status: job.status.to_string(),
            progress: job.progress.clone(),
            speed: job.speed.clone(),
            filename: job.filename.clone().unwrap_or_default(),
            filesize: job.filesize.unwrap_or(0),
            error: job.error.clone(),
        }
    }
}

/// Service banner for `GET /`.
#[derive(Debug, Clone, Serialize)]
pub struct ServiceInfo {
    pub service: &'static str,
    pub version: &'static str,
    pub status: &'static str,
}

/// Health payload.
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_secs: u64,
    /// Jobs currently tracked by the store, any state.
    pub active_jobs: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jobs::JobStatus;

    #[test]
    fn test_status_response_defaults_for_fresh_job() {
        let job = Job::new("abc".to_string());
        let response = StatusResponse::from_job(&job);

        assert_eq!(response.job_id, "abc");
        assert_eq!(response.status, "pending");
        assert_eq!(response.progress, "0%");
        assert_eq!(response.filename, "");
        assert_eq!(response.filesize, 0);
        assert!(response.error.is_none());
    }

    #[test]
    fn test_status_response_error_omitted_when_absent() {
        let mut job = Job::new("abc".to_string());
        job.status = JobStatus::Downloading;
        job.progress = "42.1%".to_string();

        let json = serde_json::to_value(StatusResponse::from_job(&job)).unwrap();

        assert_eq!(json["status"], "downloading");
        assert_eq!(json["progress"], "42.1%");
        assert!(json.get("error").is_none());
    }

    #[test]
    fn test_analyze_response_from_media_info() {
        let info = MediaInfo {
            title: "A Video".to_string(),
            duration: 120,
            thumbnail: "https://example.com/t.jpg".to_string(),
            formats: vec![],
        };

        let response = AnalyzeResponse::from(info);

        assert!(response.success);
        assert_eq!(response.title, "A Video");
        assert_eq!(response.duration, 120);
    }
}
