//! Runtime configuration loaded from the environment.

use std::path::PathBuf;
use std::time::Duration;

use ytdlp::YtdlpConfig;

/// Job lifecycle tuning.
#[derive(Debug, Clone)]
pub struct JobConfig {
    /// Delay before the safety-net cleanup removes a finished job record and
    /// any artifact the client never collected.
    pub cleanup_delay: Duration,
    /// Maximum number of downloads running at once; further jobs queue in
    /// the `pending` state.
    pub max_concurrent_downloads: usize,
}

impl Default for JobConfig {
    fn default() -> Self {
        Self {
            cleanup_delay: Duration::from_secs(3600),
            max_concurrent_downloads: 4,
        }
    }
}

/// Application configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Scratch directory for in-flight and completed artifacts.
    pub scratch_dir: PathBuf,
    pub jobs: JobConfig,
    pub ytdlp: YtdlpConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            scratch_dir: std::env::temp_dir().join("fetchd-scratch"),
            jobs: JobConfig::default(),
            ytdlp: YtdlpConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables, falling back to
    /// defaults for anything unset or unparseable.
    pub fn from_env_or_default() -> Self {
        let mut config = Self::default();

        if let Ok(dir) = std::env::var("FETCHD_SCRATCH_DIR")
            && !dir.trim().is_empty()
        {
            config.scratch_dir = PathBuf::from(dir);
        }

        if let Some(secs) = env_parse::<u64>("FETCHD_CLEANUP_DELAY_SECS") {
            config.jobs.cleanup_delay = Duration::from_secs(secs);
        }
        if let Some(n) = env_parse::<usize>("FETCHD_MAX_CONCURRENT_DOWNLOADS") {
            config.jobs.max_concurrent_downloads = n.max(1);
        }

        if let Ok(bin) = std::env::var("YTDLP_BIN")
            && !bin.trim().is_empty()
        {
            config.ytdlp.bin = bin;
        }
        if let Some(bytes) = env_parse::<u64>("FETCHD_MAX_ARTIFACT_SIZE") {
            config.ytdlp.max_artifact_size = bytes;
        }
        if let Some(secs) = env_parse::<u64>("YTDLP_PROBE_TIMEOUT_SECS") {
            config.ytdlp.probe_timeout = Duration::from_secs(secs);
        }
        if let Some(secs) = env_parse::<u32>("YTDLP_SOCKET_TIMEOUT_SECS") {
            config.ytdlp.socket_timeout_secs = secs;
        }
        if let Some(n) = env_parse::<u32>("YTDLP_RETRIES") {
            config.ytdlp.retries = n;
        }
        if let Some(n) = env_parse::<u32>("YTDLP_CONCURRENT_FRAGMENTS") {
            config.ytdlp.concurrent_fragments = n.max(1);
        }
        if let Some(bytes) = env_parse::<u64>("YTDLP_HTTP_CHUNK_SIZE") {
            config.ytdlp.http_chunk_size = bytes;
        }
        if let Ok(heights) = std::env::var("FETCHD_TARGET_HEIGHTS") {
            let parsed: Vec<u32> = heights
                .split(',')
                .filter_map(|h| h.trim().parse().ok())
                .collect();
            if !parsed.is_empty() {
                config.ytdlp.target_heights = parsed;
            }
        }

        config
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.trim().parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();

        assert_eq!(config.jobs.cleanup_delay, Duration::from_secs(3600));
        assert_eq!(config.jobs.max_concurrent_downloads, 4);
        assert_eq!(config.ytdlp.bin, "yt-dlp");
        assert_eq!(config.ytdlp.max_artifact_size, 2000 * 1024 * 1024);
        assert_eq!(config.ytdlp.retries, 3);
        assert!(config.scratch_dir.ends_with("fetchd-scratch"));
    }
}
