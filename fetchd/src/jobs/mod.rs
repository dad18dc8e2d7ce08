//! Job records and lifecycle state.

pub mod manager;
pub mod store;

pub use manager::JobManager;
pub use store::JobStore;

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle state of a download job.
///
/// Transitions are monotonic: `pending → downloading → {completed | failed}`.
/// Terminal states are never left, even after the artifact is cleaned up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Pending,
    Downloading,
    Completed,
    Failed,
}

impl JobStatus {
    /// Whether the state admits no further transitions.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Downloading => "downloading",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One tracked download request.
#[derive(Debug, Clone)]
pub struct Job {
    /// Opaque identifier; also keys the artifact name in the scratch
    /// directory. Never reused.
    pub id: String,
    pub status: JobStatus,
    /// Human-readable percentage, updated only while downloading.
    pub progress: String,
    /// Human-readable transfer rate, same update window as `progress`.
    pub speed: String,
    pub created_at: DateTime<Utc>,
    /// Artifact path; present only after successful completion and until the
    /// first of delivery or safety-net cleanup consumes it.
    pub filepath: Option<PathBuf>,
    /// Sanitized display name presented to the client on delivery.
    pub filename: Option<String>,
    pub filesize: Option<u64>,
    /// Failure reason; present only on failed jobs.
    pub error: Option<String>,
}

impl Job {
    /// Create a pending job record.
    pub fn new(id: String) -> Self {
        Self {
            id,
            status: JobStatus::Pending,
            progress: "0%".to_string(),
            speed: String::new(),
            created_at: Utc::now(),
            filepath: None,
            filename: None,
            filesize: None,
            error: None,
        }
    }
}

/// Reduce a source title to a display-safe filename stem.
///
/// Keeps letters, digits, spaces, and hyphens; trims surrounding whitespace.
/// An empty result falls back to `"download"`.
pub fn sanitize_title(title: &str) -> String {
    let kept: String = title
        .chars()
        .filter(|c| c.is_alphanumeric() || *c == ' ' || *c == '-')
        .collect();
    let trimmed = kept.trim();
    if trimmed.is_empty() {
        "download".to_string()
    } else {
        trimmed.to_string()
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[test]
    fn test_new_job_is_pending() {
        let job = Job::new("abc".to_string());

        assert_eq!(job.status, JobStatus::Pending);
        assert_eq!(job.progress, "0%");
        assert!(job.speed.is_empty());
        assert!(job.filepath.is_none());
        assert!(job.filename.is_none());
        assert!(job.filesize.is_none());
        assert!(job.error.is_none());
    }

    #[test]
    fn test_terminal_states() {
        assert!(!JobStatus::Pending.is_terminal());
        assert!(!JobStatus::Downloading.is_terminal());
        assert!(JobStatus::Completed.is_terminal());
        assert!(JobStatus::Failed.is_terminal());
    }

    #[test]
    fn test_status_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&JobStatus::Downloading).unwrap(),
            "\"downloading\""
        );
    }

    #[rstest]
    #[case("Cool Video! #1 (2024)", "Cool Video 1 2024")]
    #[case("  spaced out  ", "spaced out")]
    #[case("dash-ed title", "dash-ed title")]
    #[case("???", "download")]
    #[case("", "download")]
    #[case("观看一只青蛙", "观看一只青蛙")]
    fn test_sanitize_title(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(sanitize_title(input), expected);
    }
}
