//! Metadata-only extraction via the tool's JSON dump.

use std::process::Stdio;

use serde::Deserialize;
use tracing::debug;

use crate::YtdlpConfig;
use crate::command::{failure_reason, tool_command};
use crate::error::{ExtractError, Result};
use crate::format::{self, FormatDescriptor, RawFormat};

/// Metadata returned by a probe.
#[derive(Debug, Clone)]
pub struct MediaInfo {
    pub title: String,
    /// Duration in whole seconds; zero when the tool does not report one.
    pub duration: u64,
    pub thumbnail: String,
    /// Filtered, client-facing format list; at most
    /// [`MAX_FORMATS`](crate::format::MAX_FORMATS) entries.
    pub formats: Vec<FormatDescriptor>,
}

/// The subset of the tool's JSON dump the probe consumes.
#[derive(Debug, Deserialize)]
struct InfoDump {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    duration: Option<f64>,
    #[serde(default)]
    thumbnail: Option<String>,
    #[serde(default)]
    formats: Vec<RawFormat>,
}

/// Run a metadata probe against `url`.
///
/// Never downloads media. The subprocess is killed if it outlives
/// `config.probe_timeout`; every failure mode collapses into
/// [`ExtractError::ProbeFailed`].
pub(crate) async fn run(config: &YtdlpConfig, url: &str) -> Result<MediaInfo> {
    let mut cmd = tool_command(&config.bin);
    cmd.arg("--dump-single-json")
        .arg("--skip-download")
        .arg("--no-playlist")
        .arg("--no-warnings")
        .arg("--socket-timeout")
        .arg(config.probe_socket_timeout_secs.to_string())
        .arg("--")
        .arg(url)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    debug!(url, "probing media metadata");

    let output = tokio::time::timeout(config.probe_timeout, cmd.output())
        .await
        .map_err(|_| {
            ExtractError::probe(format!(
                "probe timed out after {}s",
                config.probe_timeout.as_secs()
            ))
        })?
        .map_err(|e| ExtractError::probe(format!("failed to run {}: {e}", config.bin)))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(ExtractError::probe(failure_reason(&stderr, output.status)));
    }

    parse_dump(&output.stdout, &config.target_heights)
}

fn parse_dump(stdout: &[u8], target_heights: &[u32]) -> Result<MediaInfo> {
    let dump: InfoDump = serde_json::from_slice(stdout)
        .map_err(|e| ExtractError::probe(format!("unparseable metadata dump: {e}")))?;

    Ok(MediaInfo {
        title: dump.title.unwrap_or_else(|| "Unknown".to_string()),
        duration: dump.duration.unwrap_or(0.0).round() as u64,
        thumbnail: dump.thumbnail.unwrap_or_default(),
        formats: format::filter_formats(&dump.formats, target_heights),
    })
}
