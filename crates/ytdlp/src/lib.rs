//! Adapter around the external `yt-dlp` binary.
//!
//! Exposes two operations behind the [`Extractor`] trait: a metadata-only
//! [`Extractor::probe`] that returns the title and a filtered list of
//! selectable formats, and an [`Extractor::fetch`] that downloads one media
//! item into a scratch directory under a job-keyed name, reporting transfer
//! progress over a channel.

pub mod command;
pub mod error;
pub mod fetch;
pub mod format;
pub mod probe;

use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::mpsc;

pub use error::{ExtractError, Result};
pub use fetch::{ArtifactRef, FetchOutcome, FetchRequest, ProgressUpdate, find_artifact};
pub use format::{DEFAULT_TARGET_HEIGHTS, FormatDescriptor, MAX_FORMATS, OutputKind, RawFormat};
pub use probe::MediaInfo;

/// Configuration for the adapter.
#[derive(Debug, Clone)]
pub struct YtdlpConfig {
    /// Path or name of the tool binary.
    pub bin: String,
    /// Overall bound on a probe subprocess before it is killed.
    pub probe_timeout: Duration,
    /// Socket timeout handed to the tool during probes, in seconds.
    pub probe_socket_timeout_secs: u32,
    /// Socket timeout handed to the tool during downloads, in seconds.
    pub socket_timeout_secs: u32,
    /// Transient-failure retry count for downloads.
    pub retries: u32,
    /// Number of fragments the tool downloads concurrently.
    pub concurrent_fragments: u32,
    /// HTTP chunk size in bytes.
    pub http_chunk_size: u64,
    /// Maximum allowed artifact size in bytes, enforced after the download
    /// has fully completed.
    pub max_artifact_size: u64,
    /// Video heights eligible for probe responses.
    pub target_heights: Vec<u32>,
}

impl Default for YtdlpConfig {
    fn default() -> Self {
        Self {
            bin: "yt-dlp".to_string(),
            probe_timeout: Duration::from_secs(30),
            probe_socket_timeout_secs: 10,
            socket_timeout_secs: 30,
            retries: 3,
            concurrent_fragments: 4,
            http_chunk_size: 10 * 1024 * 1024,
            max_artifact_size: 2000 * 1024 * 1024,
            target_heights: DEFAULT_TARGET_HEIGHTS.to_vec(),
        }
    }
}

/// Boundary to the external media tool.
#[async_trait]
pub trait Extractor: Send + Sync {
    /// Fetch metadata and selectable formats without downloading any media.
    async fn probe(&self, url: &str) -> Result<MediaInfo>;

    /// Download one media item into the scratch directory, reporting
    /// transfer progress on `progress_tx` while bytes are moving.
    async fn fetch(
        &self,
        request: FetchRequest,
        progress_tx: mpsc::UnboundedSender<ProgressUpdate>,
    ) -> Result<FetchOutcome>;
}

/// [`Extractor`] implementation that shells out to the `yt-dlp` binary.
#[derive(Debug, Clone)]
pub struct YtdlpExtractor {
    config: YtdlpConfig,
}

impl YtdlpExtractor {
    /// Create an extractor with the given configuration.
    pub fn new(config: YtdlpConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &YtdlpConfig {
        &self.config
    }
}

#[async_trait]
impl Extractor for YtdlpExtractor {
    async fn probe(&self, url: &str) -> Result<MediaInfo> {
        probe::run(&self.config, url).await
    }

    async fn fetch(
        &self,
        request: FetchRequest,
        progress_tx: mpsc::UnboundedSender<ProgressUpdate>,
    ) -> Result<FetchOutcome> {
        fetch::run(&self.config, request, progress_tx).await
    }
}
