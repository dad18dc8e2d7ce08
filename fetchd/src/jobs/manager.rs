//! Job lifecycle manager: background execution and deferred cleanup.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Semaphore, mpsc};
use tracing::{debug, info, warn};
use uuid::Uuid;
use ytdlp::{Extractor, FetchRequest, OutputKind, ProgressUpdate};

use crate::config::JobConfig;
use crate::jobs::store::JobStore;
use crate::jobs::{JobStatus, sanitize_title};
use crate::workspace::ScratchWorkspace;

/// Creates jobs, runs them in the background, and schedules their cleanup.
///
/// Exactly one background task is spawned per job. It owns the job record
/// until its terminal transition, then sleeps out the safety-net delay and
/// reclaims whatever the client never collected. Download concurrency is
/// bounded by a semaphore; queued jobs stay `pending` until a slot frees up.
#[derive(Clone)]
pub struct JobManager {
    store: JobStore,
    extractor: Arc<dyn Extractor>,
    workspace: ScratchWorkspace,
    slots: Arc<Semaphore>,
    cleanup_delay: Duration,
}

impl JobManager {
    pub fn new(
        store: JobStore,
        extractor: Arc<dyn Extractor>,
        workspace: ScratchWorkspace,
        config: &JobConfig,
    ) -> Self {
        Self {
            store,
            extractor,
            workspace,
            slots: Arc::new(Semaphore::new(config.max_concurrent_downloads)),
            cleanup_delay: config.cleanup_delay,
        }
    }

    /// Create a job record and spawn its background execution.
    ///
    /// Returns the new job id immediately; all failures past this point are
    /// recorded on the job and surfaced through status polling, never thrown.
    pub fn start(
        &self,
        url: String,
        format_id: String,
        output_kind: OutputKind,
    ) -> crate::Result<String> {
        let id = Uuid::new_v4().to_string();
        self.store.create(&id)?;

        info!(job_id = %id, %output_kind, "download job created");

        let manager = self.clone();
        let job_id = id.clone();
        tokio::spawn(async move {
            manager.run(job_id, url, format_id, output_kind).await;
        });

        Ok(id)
    }

    async fn run(self, id: String, url: String, format_id: String, output_kind: OutputKind) {
        self.execute(&id, url, format_id, output_kind).await;

        // Safety net: whatever the outcome, the record and any uncollected
        // artifact are gone cleanup_delay after the job finished.
        tokio::time::sleep(self.cleanup_delay).await;
        self.cleanup(&id).await;
    }

    async fn execute(&self, id: &str, url: String, format_id: String, output_kind: OutputKind) {
        // The slot is held for the whole fetch; the job stays pending while
        // it waits in line.
        let _permit = match Arc::clone(&self.slots).acquire_owned().await {
            Ok(permit) => permit,
            Err(_) => return,
        };

        self.store
            .update(id, |job| job.status = JobStatus::Downloading);

        let (progress_tx, mut progress_rx) = mpsc::unbounded_channel::<ProgressUpdate>();
        let progress_store = self.store.clone();
        let progress_id = id.to_string();
        let drain = tokio::spawn(async move {
            while let Some(update) = progress_rx.recv().await {
                progress_store.update(&progress_id, |job| {
                    job.progress = update.percent;
                    job.speed = update.speed;
                });
            }
        });

        let request = FetchRequest {
            url,
            format_id,
            output_kind,
            scratch_dir: self.workspace.dir().to_path_buf(),
            job_id: id.to_string(),
        };

        let result = self.extractor.fetch(request, progress_tx).await;

        // The sender side is gone once fetch returns; joining the drain task
        // here guarantees every progress write lands before the terminal one.
        let _ = drain.await;

        match result {
            Ok(outcome) => {
                let filename = format!(
                    "{}.{}",
                    sanitize_title(&outcome.title),
                    outcome.artifact.extension
                );
                info!(job_id = %id, size = outcome.size, file = %filename, "download completed");
                self.store.update(id, |job| {
                    job.filepath = Some(outcome.artifact.path);
                    job.filename = Some(filename);
                    job.filesize = Some(outcome.size);
                    job.progress = "100%".to_string();
                    job.status = JobStatus::Completed;
                });
            }
            Err(error) => {
                warn!(job_id = %id, %error, "download failed");
                self.store.update(id, |job| {
                    job.error = Some(error.to_string());
                    job.status = JobStatus::Failed;
                });
            }
        }
    }

    /// Remove the job record and any artifact the client never collected.
    async fn cleanup(&self, id: &str) {
        if let Some(path) = self.store.take_filepath(id) {
            match tokio::fs::remove_file(&path).await {
                Ok(()) => debug!(job_id = %id, "safety-net cleanup removed artifact"),
                Err(error) => warn!(
                    job_id = %id,
                    path = %path.display(),
                    %error,
                    "safety-net cleanup could not remove artifact"
                ),
            }
        }
        self.store.delete(id);
    }
}
