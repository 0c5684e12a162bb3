//! In-memory job store.
//!
//! Single source of truth for job state: written by the background fetch task
//! of each job and by the expiry sweeper, read by pollers. Every write replaces
//! the whole record under the write lock, so readers never see a half-applied
//! update. Records share their log buffer with the record they replace, so a
//! replacement costs the size of the new output, not of the whole log.

pub mod log;
pub mod types;

pub use log::JobLog;
pub use types::*;

use types::unix_millis;

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Errors from store writes.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    #[error("job {0} not found")]
    NotFound(JobId),
    #[error("job {id}: invalid transition {from} -> {to}")]
    InvalidTransition {
        id: JobId,
        from: JobState,
        to: JobState,
    },
}

/// Concurrency-safe map from job id to record.
#[derive(Debug, Default)]
pub struct JobStore {
    jobs: RwLock<HashMap<JobId, JobRecord>>,
    next_seq: AtomicU64,
}

impl JobStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, HashMap<JobId, JobRecord>> {
        self.jobs.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<JobId, JobRecord>> {
        self.jobs.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Insert a new Queued record and return its freshly allocated id.
    /// Ids embed a process-wide sequence number, so they are never reused.
    pub fn create(&self, url: &str, quality: Quality) -> JobId {
        let seq = self.next_seq.fetch_add(1, Ordering::Relaxed);
        let id = JobId::new(unix_millis(), seq);
        let record = JobRecord::queued(id.clone(), seq, url, quality);
        self.write().insert(id.clone(), record);
        id
    }

    /// Snapshot of a record. None means the job never existed or has expired.
    pub fn get(&self, id: &JobId) -> Option<JobRecord> {
        self.read().get(id).cloned()
    }

    /// Replace a record with `f(current)` atomically.
    ///
    /// The replacement must be a legal forward transition; records in a
    /// terminal state can only be deleted.
    pub fn update<F>(&self, id: &JobId, f: F) -> Result<JobRecord, StoreError>
    where
        F: FnOnce(&JobRecord) -> JobRecord,
    {
        let mut jobs = self.write();
        let current = jobs
            .get_mut(id)
            .ok_or_else(|| StoreError::NotFound(id.clone()))?;
        let next = f(current);
        if !current.state.can_transition_to(next.state) {
            return Err(StoreError::InvalidTransition {
                id: id.clone(),
                from: current.state,
                to: next.state,
            });
        }
        debug_assert_eq!(next.id, *id, "update must not change the job id");
        *current = next;
        Ok(current.clone())
    }

    /// Status view of a record, built under the read lock.
    pub fn status(&self, id: &JobId) -> Option<JobStatus> {
        self.read().get(id).map(JobStatus::from)
    }

    /// Copy of a record's log text.
    pub fn log(&self, id: &JobId) -> Option<String> {
        self.read().get(id).map(|r| r.log.to_string())
    }

    /// Remove a record. Returns whether it existed.
    pub fn delete(&self, id: &JobId) -> bool {
        self.write().remove(id).is_some()
    }

    /// Snapshots of all records, newest first.
    pub fn list(&self) -> Vec<JobRecord> {
        let mut jobs: Vec<JobRecord> = self.read().values().cloned().collect();
        jobs.sort_by(|a, b| b.seq.cmp(&a.seq));
        jobs
    }

    /// Status views of all records, newest first.
    pub fn statuses(&self) -> Vec<JobStatus> {
        let jobs = self.read();
        let mut records: Vec<&JobRecord> = jobs.values().collect();
        records.sort_by(|a, b| b.seq.cmp(&a.seq));
        records.into_iter().map(JobStatus::from).collect()
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }
}
