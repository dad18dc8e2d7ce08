//! Adapter error types.

use std::path::PathBuf;

use thiserror::Error;

/// Adapter result type.
pub type Result<T> = std::result::Result<T, ExtractError>;

/// Failures surfaced by the adapter.
#[derive(Error, Debug)]
pub enum ExtractError {
    /// Metadata extraction failed: unreachable URL, unsupported site,
    /// restricted content, or an unusable tool response.
    #[error("probe failed: {0}")]
    ProbeFailed(String),

    /// The download failed in the network, extraction, or post-processing
    /// stage.
    #[error("fetch failed: {0}")]
    FetchFailed(String),

    /// The finished artifact exceeds the configured maximum. The file has
    /// already been removed by the time this is returned.
    #[error("artifact size {size} bytes exceeds the maximum of {max} bytes")]
    SizeExceeded { size: u64, max: u64 },

    /// The tool reported success but no file keyed by the job id exists.
    #[error("the tool reported success but produced no artifact")]
    NoArtifactProduced,

    #[error("{op} {path}: {source}")]
    Io {
        op: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ExtractError {
    pub fn probe(msg: impl Into<String>) -> Self {
        Self::ProbeFailed(msg.into())
    }

    pub fn fetch(msg: impl Into<String>) -> Self {
        Self::FetchFailed(msg.into())
    }

    pub fn io(op: &'static str, path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            op,
            path: path.into(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_size_exceeded_message_names_both_sizes() {
        let err = ExtractError::SizeExceeded {
            size: 2048,
            max: 1024,
        };
        let msg = err.to_string();
        assert!(msg.contains("2048"));
        assert!(msg.contains("1024"));
    }

    #[test]
    fn test_helper_constructors() {
        assert!(matches!(
            ExtractError::probe("no formats"),
            ExtractError::ProbeFailed(_)
        ));
        assert!(matches!(
            ExtractError::fetch("connection reset"),
            ExtractError::FetchFailed(_)
        ));
    }
}
