//! In-memory job store.

use std::path::PathBuf;
use std::sync::Arc;

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;

use super::Job;
use crate::error::{Error, Result};

/// Concurrency-safe mapping from job id to job record.
///
/// The store is the only shared mutable structure in the system. All
/// mutation goes through [`JobStore::update`] and
/// [`JobStore::take_filepath`], which hold the entry lock for the duration
/// of the mutation, so readers never observe a half-applied update.
#[derive(Debug, Default, Clone)]
pub struct JobStore {
    jobs: Arc<DashMap<String, Job>>,
}

impl JobStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Initialize a pending job. Fails if the id is already present, which
    /// identifier generation makes unreachable in practice.
    pub fn create(&self, id: &str) -> Result<Job> {
        match self.jobs.entry(id.to_string()) {
            Entry::Occupied(_) => Err(Error::validation(format!("job id {id} already exists"))),
            Entry::Vacant(entry) => {
                let job = Job::new(id.to_string());
                entry.insert(job.clone());
                Ok(job)
            }
        }
    }

    /// Snapshot a job by id.
    pub fn get(&self, id: &str) -> Option<Job> {
        self.jobs.get(id).map(|job| job.clone())
    }

    /// Apply a mutation atomically. Returns false when the job is gone.
    pub fn update(&self, id: &str, mutation: impl FnOnce(&mut Job)) -> bool {
        match self.jobs.get_mut(id) {
            Some(mut job) => {
                mutation(&mut job);
                true
            }
            None => false,
        }
    }

    /// Atomically detach the artifact path from a job.
    ///
    /// Whichever of delivery and the safety-net cleanup gets here first owns
    /// the file; the loser sees `None`.
    pub fn take_filepath(&self, id: &str) -> Option<PathBuf> {
        self.jobs.get_mut(id).and_then(|mut job| job.filepath.take())
    }

    /// Remove a job record. No-op when absent.
    pub fn delete(&self, id: &str) {
        self.jobs.remove(id);
    }

    /// Number of tracked jobs.
    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;
    use crate::jobs::JobStatus;

    #[test]
    fn test_create_and_get() {
        let store = JobStore::new();
        store.create("a").unwrap();

        let job = store.get("a").unwrap();
        assert_eq!(job.id, "a");
        assert_eq!(job.status, JobStatus::Pending);
        assert!(store.get("missing").is_none());
    }

    #[test]
    fn test_create_rejects_duplicate_id() {
        let store = JobStore::new();
        store.create("a").unwrap();

        assert!(store.create("a").is_err());
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_update_applies_mutation() {
        let store = JobStore::new();
        store.create("a").unwrap();

        let applied = store.update("a", |job| {
            job.status = JobStatus::Downloading;
            job.progress = "10.0%".to_string();
        });

        assert!(applied);
        let job = store.get("a").unwrap();
        assert_eq!(job.status, JobStatus::Downloading);
        assert_eq!(job.progress, "10.0%");
    }

    #[test]
    fn test_update_missing_returns_false() {
        let store = JobStore::new();
        assert!(!store.update("missing", |_| {}));
    }

    #[test]
    fn test_take_filepath_consumes_once() {
        let store = JobStore::new();
        store.create("a").unwrap();
        store.update("a", |job| {
            job.filepath = Some(PathBuf::from("/tmp/a.mp4"));
        });

        assert_eq!(store.take_filepath("a"), Some(PathBuf::from("/tmp/a.mp4")));
        assert_eq!(store.take_filepath("a"), None);
        // The record itself survives the take.
        assert!(store.get("a").is_some());
    }

    #[test]
    fn test_delete_is_idempotent() {
        let store = JobStore::new();
        store.create("a").unwrap();

        store.delete("a");
        store.delete("a");

        assert!(store.is_empty());
    }
}
