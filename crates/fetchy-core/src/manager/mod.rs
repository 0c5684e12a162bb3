//! Job lifecycle manager.
//!
//! Owns the job store and expiry queue, starts one background task per job,
//! and answers status/log/artifact queries from the store. Queries never touch
//! the fetcher.
//!
//! States: Queued -> Downloading -> {Completed, Failed}. A failed job is not
//! retried; callers resubmit. There is no cancellation and no subprocess
//! timeout: a hung fetch tool leaves its job in Downloading.

mod error;
mod task;

pub use error::{ArtifactError, ValidationError};

use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, SystemTime};

use serde::{Deserialize, Serialize};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

use crate::cleanup::{sweep_stale_files, SweepReport};
use crate::config::FetchyConfig;
use crate::expiry::ExpiryQueue;
use crate::fetch::{FetchRequest, Fetcher, InvocationSettings, ProcessFetcher};
use crate::store::{Artifact, JobId, JobState, JobStatus, JobStore, Quality};

use self::task::{supervise, JobTask};

/// Timing and defaults for the manager.
#[derive(Debug, Clone)]
pub struct ManagerSettings {
    /// Shared directory swept for stale files.
    pub download_dir: PathBuf,
    pub default_quality: Quality,
    /// How long terminal job records and produced files are kept.
    pub retention: Duration,
    pub expiry_check_interval: Duration,
    pub sweep_interval: Duration,
    pub progress_channel_capacity: usize,
}

impl ManagerSettings {
    pub fn from_config(cfg: &FetchyConfig) -> Result<Self, ValidationError> {
        Ok(Self {
            download_dir: cfg.resolved_download_dir(),
            default_quality: cfg.default_quality.parse()?,
            retention: cfg.retention(),
            expiry_check_interval: cfg.expiry_check_interval(),
            sweep_interval: cfg.sweep_interval(),
            progress_channel_capacity: cfg.progress_channel_capacity,
        })
    }
}

/// Response to a successful job submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatedJob {
    pub id: JobId,
    pub state: JobState,
}

/// Creates jobs and serves their state. Cheap to clone; clones share state.
pub struct JobManager<F = ProcessFetcher> {
    store: Arc<JobStore>,
    expiry: Arc<ExpiryQueue>,
    fetcher: Arc<F>,
    settings: Arc<ManagerSettings>,
}

impl<F> Clone for JobManager<F> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            expiry: Arc::clone(&self.expiry),
            fetcher: Arc::clone(&self.fetcher),
            settings: Arc::clone(&self.settings),
        }
    }
}

impl<F> std::fmt::Debug for JobManager<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JobManager")
            .field("jobs", &self.store.len())
            .field("pending_expiry", &self.expiry.len())
            .field("settings", &self.settings)
            .finish()
    }
}

impl JobManager<ProcessFetcher> {
    /// Manager driving the configured fetch tool, with a fresh store.
    pub fn from_config(cfg: &FetchyConfig) -> Result<Self, ValidationError> {
        let settings = ManagerSettings::from_config(cfg)?;
        let fetcher = ProcessFetcher::new(InvocationSettings::from_config(cfg));
        Ok(Self::new(Arc::new(JobStore::new()), fetcher, settings))
    }
}

impl<F: Fetcher> JobManager<F> {
    pub fn new(store: Arc<JobStore>, fetcher: F, settings: ManagerSettings) -> Self {
        Self {
            store,
            expiry: Arc::new(ExpiryQueue::new()),
            fetcher: Arc::new(fetcher),
            settings: Arc::new(settings),
        }
    }

    pub fn store(&self) -> &Arc<JobStore> {
        &self.store
    }

    pub fn settings(&self) -> &ManagerSettings {
        &self.settings
    }

    /// Validate the request, record a Queued job and start its fetch in the
    /// background. Returns without waiting for the fetch. Must be called from
    /// within a Tokio runtime.
    pub fn create(&self, url: &str, quality: Option<&str>) -> Result<CreatedJob, ValidationError> {
        let url = validate_url(url)?;
        let quality = match quality.map(str::trim) {
            Some(q) if !q.is_empty() => q.parse::<Quality>()?,
            _ => self.settings.default_quality,
        };

        let id = self.store.create(&url, quality);
        tracing::info!(job_id = %id, url = %url, quality = %quality, "job queued");

        let task = JobTask {
            store: Arc::clone(&self.store),
            expiry: Arc::clone(&self.expiry),
            fetcher: Arc::clone(&self.fetcher),
            settings: Arc::clone(&self.settings),
            request: FetchRequest {
                job_id: id.clone(),
                url,
                quality,
            },
        };
        tokio::spawn(supervise(task));

        Ok(CreatedJob {
            id,
            state: JobState::Queued,
        })
    }

    /// Current status, or None for an unknown or expired id.
    pub fn status(&self, id: &JobId) -> Option<JobStatus> {
        self.store.status(id)
    }

    /// Raw tool output collected so far, or None for an unknown or expired id.
    pub fn log(&self, id: &JobId) -> Option<String> {
        self.store.log(id)
    }

    /// The produced file of a completed job, if it is still on disk.
    pub async fn artifact(&self, id: &JobId) -> Result<Artifact, ArtifactError> {
        let record = self
            .store
            .get(id)
            .ok_or_else(|| ArtifactError::NotFound(id.clone()))?;
        let artifact = match (record.state, record.artifact) {
            (JobState::Completed, Some(a)) => a,
            (state, _) => {
                return Err(ArtifactError::NotReady {
                    id: id.clone(),
                    state,
                })
            }
        };
        match tokio::fs::metadata(&artifact.path).await {
            Ok(meta) if meta.is_file() => Ok(artifact),
            _ => Err(ArtifactError::Missing {
                id: id.clone(),
                path: artifact.path,
            }),
        }
    }

    /// Status of every tracked job, newest first.
    pub fn list(&self) -> Vec<JobStatus> {
        self.store.statuses()
    }

    /// Poll until the job reaches a terminal state. None if it disappears first.
    pub async fn wait_for_terminal(&self, id: &JobId, poll: Duration) -> Option<JobStatus> {
        loop {
            let status = self.status(id)?;
            if status.state.is_terminal() {
                return Some(status);
            }
            tokio::time::sleep(poll).await;
        }
    }

    /// Delete records whose retention has elapsed by `now`. Returns how many were removed.
    pub fn expire_due(&self, now: Instant) -> usize {
        let mut removed = 0;
        for id in self.expiry.drain_due(now) {
            if self.store.delete(&id) {
                tracing::debug!(job_id = %id, "job record expired");
                removed += 1;
            }
        }
        removed
    }

    /// Delete produced files older than the retention window.
    pub async fn sweep_files(&self) -> SweepReport {
        let report = sweep_stale_files(
            &self.settings.download_dir,
            self.settings.retention,
            SystemTime::now(),
        )
        .await;
        if report.removed > 0 || report.errors > 0 {
            tracing::info!(
                removed = report.removed,
                kept = report.kept,
                errors = report.errors,
                "file sweep finished"
            );
        }
        report
    }

    /// Start the background sweeper: expires due job records every
    /// `expiry_check_interval` and sweeps stale files every `sweep_interval`
    /// (the first file sweep runs immediately).
    pub fn spawn_sweeper(&self) -> JoinHandle<()> {
        let manager = self.clone();
        tokio::spawn(async move {
            let mut expiry_tick = tokio::time::interval(manager.settings.expiry_check_interval);
            let mut sweep_tick = tokio::time::interval(manager.settings.sweep_interval);
            expiry_tick.set_missed_tick_behavior(MissedTickBehavior::Delay);
            sweep_tick.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    _ = expiry_tick.tick() => {
                        manager.expire_due(Instant::now());
                    }
                    _ = sweep_tick.tick() => {
                        manager.sweep_files().await;
                    }
                }
            }
        })
    }
}

fn validate_url(raw: &str) -> Result<String, ValidationError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::MissingUrl);
    }
    let parsed = url::Url::parse(trimmed).map_err(|source| ValidationError::InvalidUrl {
        url: trimmed.to_string(),
        source,
    })?;
    match parsed.scheme() {
        "http" | "https" => Ok(trimmed.to_string()),
        other => Err(ValidationError::UnsupportedScheme(other.to_string())),
    }
}
