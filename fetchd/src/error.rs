//! Application-wide error types.

use std::path::PathBuf;

use thiserror::Error;

/// Application-wide result type.
pub type Result<T> = std::result::Result<T, Error>;

/// Application-wide error type.
#[derive(Error, Debug)]
pub enum Error {
    /// Malformed request input, rejected before any job is created.
    #[error("Validation error: {0}")]
    Validation(String),

    #[error(transparent)]
    Extract(#[from] ytdlp::ExtractError),

    #[error("Job not found: {id}")]
    NotFound { id: String },

    /// The job exists but has not reached `completed`.
    #[error("Download not ready. Status: {status}")]
    NotReady { status: String },

    /// The artifact was already delivered or reclaimed by cleanup.
    #[error("File expired")]
    Expired,

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("{op} {path}: {source}")]
    Io {
        op: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{0}")]
    Other(String),
}

impl Error {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn not_found(id: impl Into<String>) -> Self {
        Self::NotFound { id: id.into() }
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    pub fn io_path(op: &'static str, path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            op,
            path: path.into(),
            source,
        }
    }
}
