//! Process-owned scratch directory for in-flight and completed artifacts.

use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::error::{Error, Result};

/// Owns the scratch directory for the process lifetime.
///
/// Files inside are keyed by job id, so concurrent jobs never collide; the
/// directory listing itself is the only cross-job shared state, and it is
/// only ever scanned by id prefix.
#[derive(Debug, Clone)]
pub struct ScratchWorkspace {
    dir: PathBuf,
}

impl ScratchWorkspace {
    /// Create the workspace, ensuring the directory exists and purging any
    /// files a previous run left behind.
    pub async fn init(dir: PathBuf) -> Result<Self> {
        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(|e| Error::io_path("creating scratch directory", &dir, e))?;

        let workspace = Self { dir };
        workspace.purge_stale().await?;
        Ok(workspace)
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Unlink every regular file in the scratch directory.
    ///
    /// Subdirectories are left alone, and individual unlink failures are
    /// logged and skipped so a partially locked leftover cannot block
    /// startup.
    pub async fn purge_stale(&self) -> Result<()> {
        let mut entries = tokio::fs::read_dir(&self.dir)
            .await
            .map_err(|e| Error::io_path("listing scratch directory", &self.dir, e))?;

        let mut removed = 0usize;
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| Error::io_path("listing scratch directory", &self.dir, e))?
        {
            let is_file = entry
                .file_type()
                .await
                .map(|file_type| file_type.is_file())
                .unwrap_or(false);
            if !is_file {
                continue;
            }
            let path = entry.path();
            match tokio::fs::remove_file(&path).await {
                Ok(()) => removed += 1,
                Err(error) => {
                    warn!(path = %path.display(), %error, "could not remove stale scratch file");
                }
            }
        }

        if removed > 0 {
            debug!(removed, dir = %self.dir.display(), "purged stale scratch files");
        }
        Ok(())
    }

    /// Best-effort removal of the entire scratch directory.
    pub async fn teardown(&self) {
        if let Err(error) = tokio::fs::remove_dir_all(&self.dir).await {
            warn!(dir = %self.dir.display(), %error, "could not remove scratch directory");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_init_creates_dir_and_purges_files() {
        let root = tempfile::tempdir().unwrap();
        let dir = root.path().join("scratch");
        std::fs::create_dir(&dir).unwrap();
        std::fs::write(dir.join("stale-1.mp4"), b"old").unwrap();
        std::fs::write(dir.join("stale-2.mp3"), b"old").unwrap();
        std::fs::create_dir(dir.join("keep-me")).unwrap();

        let workspace = ScratchWorkspace::init(dir.clone()).await.unwrap();

        assert!(workspace.dir().exists());
        assert!(!dir.join("stale-1.mp4").exists());
        assert!(!dir.join("stale-2.mp3").exists());
        assert!(dir.join("keep-me").exists());
    }

    #[tokio::test]
    async fn test_init_on_missing_dir_creates_it() {
        let root = tempfile::tempdir().unwrap();
        let dir = root.path().join("nested").join("scratch");

        let workspace = ScratchWorkspace::init(dir.clone()).await.unwrap();

        assert!(workspace.dir().is_dir());
    }

    #[tokio::test]
    async fn test_teardown_removes_everything() {
        let root = tempfile::tempdir().unwrap();
        let dir = root.path().join("scratch");
        let workspace = ScratchWorkspace::init(dir.clone()).await.unwrap();
        std::fs::write(dir.join("artifact.mp4"), b"data").unwrap();

        workspace.teardown().await;

        assert!(!dir.exists());
    }
}
