//! Download invocation: progress parsing, title capture, artifact resolution.

use std::path::{Path, PathBuf};
use std::process::Stdio;

use tokio::io::{AsyncBufReadExt, AsyncReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::YtdlpConfig;
use crate::command::{failure_reason, tool_command};
use crate::error::{ExtractError, Result};
use crate::format::OutputKind;

/// Tag the progress template puts on each transfer update line so it can be
/// told apart from the title print on the same stdout.
const PROGRESS_TAG: &str = "PROGRESS ";

/// One transfer progress sample.
///
/// Emitted only while bytes are actively moving; the post-processing phase
/// produces no samples. Samples from one transfer arrive in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressUpdate {
    /// Human-readable percentage, e.g. `"42.1%"`.
    pub percent: String,
    /// Human-readable rate, e.g. `"1.24MiB/s"`.
    pub speed: String,
}

/// A download request handed to the adapter.
#[derive(Debug, Clone)]
pub struct FetchRequest {
    pub url: String,
    /// Probe-selected format identifier, used for container passthrough.
    pub format_id: String,
    pub output_kind: OutputKind,
    /// Scratch directory the artifact is written into.
    pub scratch_dir: PathBuf,
    /// Job identifier keying the artifact name. Naming by id rather than by
    /// title keeps concurrent jobs from colliding.
    pub job_id: String,
}

/// Artifact location resolved once a fetch completes.
///
/// The tool substitutes the real container extension into its output
/// template, so the extension is only knowable after the fact; this type is
/// the resolved answer the rest of the system works with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactRef {
    pub path: PathBuf,
    pub extension: String,
}

/// Result of a successful fetch.
#[derive(Debug, Clone)]
pub struct FetchOutcome {
    /// Source title as reported by the tool after the final file move.
    pub title: String,
    pub artifact: ArtifactRef,
    /// Artifact size in bytes, already validated against the maximum.
    pub size: u64,
}

/// Download one media item, streaming progress samples to `progress_tx`.
pub(crate) async fn run(
    config: &YtdlpConfig,
    request: FetchRequest,
    progress_tx: mpsc::UnboundedSender<ProgressUpdate>,
) -> Result<FetchOutcome> {
    let output_template = request
        .scratch_dir
        .join(format!("{}.%(ext)s", request.job_id));
    let selector = request.output_kind.selector(&request.format_id);

    let mut cmd = tool_command(&config.bin);
    cmd.arg("--no-playlist")
        .arg("--no-warnings")
        .arg("--quiet")
        .arg("--no-simulate")
        .arg("--newline")
        .arg("--progress")
        .arg("--progress-template")
        .arg(format!(
            "download:{PROGRESS_TAG}%(progress._percent_str)s|%(progress._speed_str)s"
        ))
        .arg("--print")
        .arg("after_move:title")
        .arg("--socket-timeout")
        .arg(config.socket_timeout_secs.to_string())
        .arg("--retries")
        .arg(config.retries.to_string())
        .arg("--concurrent-fragments")
        .arg(config.concurrent_fragments.to_string())
        .arg("--http-chunk-size")
        .arg(config.http_chunk_size.to_string())
        .arg("-f")
        .arg(&selector)
        .arg("-o")
        .arg(&output_template);

    if request.output_kind.needs_transcode() {
        cmd.arg("--extract-audio")
            .arg("--audio-format")
            .arg("mp3")
            .arg("--audio-quality")
            .arg("192K");
    }

    cmd.arg("--")
        .arg(&request.url)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    debug!(job_id = %request.job_id, %selector, "starting download");

    let mut child = cmd
        .spawn()
        .map_err(|e| ExtractError::fetch(format!("failed to run {}: {e}", config.bin)))?;

    let stdout = child
        .stdout
        .take()
        .ok_or_else(|| ExtractError::fetch("tool stdout was not captured"))?;
    let stderr = child
        .stderr
        .take()
        .ok_or_else(|| ExtractError::fetch("tool stderr was not captured"))?;

    let stderr_task = tokio::spawn(async move {
        let mut buf = String::new();
        let _ = BufReader::new(stderr).read_to_string(&mut buf).await;
        buf
    });

    let mut lines = BufReader::new(stdout).lines();
    let mut title: Option<String> = None;
    while let Some(line) = lines
        .next_line()
        .await
        .map_err(|e| ExtractError::fetch(format!("reading tool output: {e}")))?
    {
        if let Some(update) = parse_progress_line(&line) {
            // The receiving side may already be gone; progress is best-effort.
            let _ = progress_tx.send(update);
        } else if !line.trim().is_empty() {
            // The only other stdout line is the post-move title print.
            title = Some(line.trim().to_string());
        }
    }

    let status = child
        .wait()
        .await
        .map_err(|e| ExtractError::fetch(format!("waiting for tool: {e}")))?;
    let stderr_text = stderr_task.await.unwrap_or_default();

    if !status.success() {
        return Err(ExtractError::fetch(failure_reason(&stderr_text, status)));
    }

    let artifact = find_artifact(&request.scratch_dir, &request.job_id)?
        .ok_or(ExtractError::NoArtifactProduced)?;

    let size = enforce_max_size(&artifact, config.max_artifact_size).await?;

    Ok(FetchOutcome {
        title: title.unwrap_or_else(|| "video".to_string()),
        artifact,
        size,
    })
}

/// Validate the finished artifact against the configured maximum.
///
/// The size check runs only after the file is fully written; an oversized
/// artifact is removed on the spot rather than left to the delayed cleanup.
async fn enforce_max_size(artifact: &ArtifactRef, max: u64) -> Result<u64> {
    let size = tokio::fs::metadata(&artifact.path)
        .await
        .map_err(|e| ExtractError::io("stat artifact", &artifact.path, e))?
        .len();

    if size > max {
        if let Err(error) = tokio::fs::remove_file(&artifact.path).await {
            warn!(
                path = %artifact.path.display(),
                %error,
                "failed to remove oversized artifact"
            );
        }
        return Err(ExtractError::SizeExceeded { size, max });
    }

    Ok(size)
}

/// Parse one stdout line emitted by the progress template.
///
/// Transfer lines look like `PROGRESS  42.1%|  1.24MiB/s`; anything else is
/// not a progress sample.
fn parse_progress_line(line: &str) -> Option<ProgressUpdate> {
    let rest = line.strip_prefix(PROGRESS_TAG)?;
    let (percent, speed) = rest.split_once('|')?;
    Some(ProgressUpdate {
        percent: percent.trim().to_string(),
        speed: speed.trim().to_string(),
    })
}

/// Locate the artifact for a job by identifier-prefix scan.
///
/// In-flight downloads keep a `.part` suffix, which is never a finished
/// artifact. Subdirectories are ignored.
pub fn find_artifact(dir: &Path, job_id: &str) -> Result<Option<ArtifactRef>> {
    let prefix = format!("{job_id}.");
    let entries =
        std::fs::read_dir(dir).map_err(|e| ExtractError::io("listing scratch directory", dir, e))?;

    for entry in entries {
        let entry =
            entry.map_err(|e| ExtractError::io("listing scratch directory", dir, e))?;
        let name = entry.file_name();
        let Some(name) = name.to_str() else {
            continue;
        };
        let Some(extension) = name.strip_prefix(&prefix) else {
            continue;
        };
        if extension.ends_with("part") {
            continue;
        }
        let is_file = entry.file_type().map(|t| t.is_file()).unwrap_or(false);
        if !is_file {
            continue;
        }
        return Ok(Some(ArtifactRef {
            path: entry.path(),
            extension: extension.to_string(),
        }));
    }

    Ok(None)
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case("PROGRESS  42.1%|  1.24MiB/s", Some(("42.1%", "1.24MiB/s")))]
    #[case("PROGRESS 100.0%|Unknown B/s", Some(("100.0%", "Unknown B/s")))]
    #[case("Some Video Title", None)]
    #[case("", None)]
    #[case("PROGRESS no-separator", None)]
    fn test_parse_progress_line(#[case] line: &str, #[case] expected: Option<(&str, &str)>) {
        let parsed = parse_progress_line(line);
        match expected {
            Some((percent, speed)) => {
                let update = parsed.unwrap();
                assert_eq!(update.percent, percent);
                assert_eq!(update.speed, speed);
            }
            None => assert!(parsed.is_none()),
        }
    }

    #[test]
    fn test_find_artifact_resolves_extension() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("job-1.mp4"), b"data").unwrap();
        std::fs::write(dir.path().join("job-2.webm"), b"other").unwrap();

        let artifact = find_artifact(dir.path(), "job-1").unwrap().unwrap();

        assert_eq!(artifact.extension, "mp4");
        assert_eq!(artifact.path, dir.path().join("job-1.mp4"));
    }

    #[test]
    fn test_find_artifact_ignores_partials_and_misses() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("job-1.mp4.part"), b"half").unwrap();

        assert!(find_artifact(dir.path(), "job-1").unwrap().is_none());
        assert!(find_artifact(dir.path(), "job-9").unwrap().is_none());
    }

    #[test]
    fn test_find_artifact_requires_exact_id_prefix() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("job-10.mp4"), b"data").unwrap();

        // "job-1" must not match "job-10.mp4": the prefix includes the dot.
        assert!(find_artifact(dir.path(), "job-1").unwrap().is_none());
    }

    #[tokio::test]
    async fn test_enforce_max_size_accepts_within_limit() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("job-1.mp4");
        std::fs::write(&path, b"small enough").unwrap();
        let artifact = ArtifactRef {
            path: path.clone(),
            extension: "mp4".to_string(),
        };

        let size = enforce_max_size(&artifact, 1024).await.unwrap();

        assert_eq!(size, 12);
        assert!(path.exists());
    }

    #[tokio::test]
    async fn test_enforce_max_size_deletes_oversized_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("job-1.mp4");
        std::fs::write(&path, vec![0u8; 64]).unwrap();
        let artifact = ArtifactRef {
            path: path.clone(),
            extension: "mp4".to_string(),
        };

        let err = enforce_max_size(&artifact, 16).await.unwrap_err();

        assert!(matches!(
            err,
            ExtractError::SizeExceeded { size: 64, max: 16 }
        ));
        assert!(!path.exists());
    }

    #[test]
    fn test_find_artifact_skips_directories() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("job-1.mp4")).unwrap();

        assert!(find_artifact(dir.path(), "job-1").unwrap().is_none());
    }
}
