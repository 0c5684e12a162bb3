//! Types held by the job store.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::progress::{Phase, ProgressEvent};

use super::log::JobLog;

/// Opaque job identifier handed to clients, e.g. `job-1718000000000-3`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(String);

impl JobId {
    pub(crate) fn new(millis: u64, seq: u64) -> Self {
        JobId(format!("job-{millis}-{seq}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for JobId {
    fn from(s: &str) -> Self {
        JobId(s.to_string())
    }
}

impl From<String> for JobId {
    fn from(s: String) -> Self {
        JobId(s)
    }
}

/// Lifecycle state of a job. Completed and Failed are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobState {
    Queued,
    Downloading,
    Completed,
    Failed,
}

impl JobState {
    pub fn as_str(self) -> &'static str {
        match self {
            JobState::Queued => "queued",
            JobState::Downloading => "downloading",
            JobState::Completed => "completed",
            JobState::Failed => "failed",
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, JobState::Completed | JobState::Failed)
    }

    /// Whether a record in `self` may be replaced by one in `next`.
    /// Staying in a non-terminal state is allowed (progress updates).
    pub fn can_transition_to(self, next: JobState) -> bool {
        use JobState::*;
        match (self, next) {
            (Queued, Queued | Downloading | Failed) => true,
            (Downloading, Downloading | Completed | Failed) => true,
            _ => false,
        }
    }
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Requested quality tier: a maximum video height, or the best available.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Quality {
    Height(u32),
    Best,
}

impl Quality {
    /// Format selector: best video at or below the tier plus best audio, else best single file.
    pub fn format_selector(self) -> String {
        match self {
            Quality::Height(h) => format!("bestvideo[height<={h}]+bestaudio/best"),
            Quality::Best => "bestvideo+bestaudio/best".to_string(),
        }
    }
}

impl fmt::Display for Quality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Quality::Height(h) => write!(f, "{h}p"),
            Quality::Best => f.write_str("best"),
        }
    }
}

/// Error returned when a quality string is not a tier like "720p" or "best".
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid quality tier {0:?} (expected e.g. \"720p\" or \"best\")")]
pub struct ParseQualityError(pub String);

impl FromStr for Quality {
    type Err = ParseQualityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.eq_ignore_ascii_case("best") {
            return Ok(Quality::Best);
        }
        let digits = trimmed
            .strip_suffix('p')
            .or_else(|| trimmed.strip_suffix('P'))
            .unwrap_or(trimmed);
        match digits.parse::<u32>() {
            Ok(h) if h > 0 => Ok(Quality::Height(h)),
            _ => Err(ParseQualityError(s.to_string())),
        }
    }
}

/// A produced file referenced by a completed job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Artifact {
    pub path: PathBuf,
    /// Suggested download filename.
    pub name: String,
}

/// Full job record. Replaced as a whole on every update.
#[derive(Debug, Clone, PartialEq)]
pub struct JobRecord {
    pub id: JobId,
    /// Creation order within this process; newer jobs have larger values.
    pub seq: u64,
    pub url: String,
    pub quality: Quality,
    pub state: JobState,
    /// Fraction complete in [0.0, 1.0]. Last parsed value wins.
    pub progress: f64,
    pub phase: Option<Phase>,
    /// All tool output seen so far.
    pub log: JobLog,
    pub artifact: Option<Artifact>,
    pub failure_reason: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
    /// Unix seconds at which the job reached Completed or Failed.
    pub finished_at: Option<i64>,
}

impl JobRecord {
    pub(crate) fn queued(id: JobId, seq: u64, url: &str, quality: Quality) -> Self {
        let now = unix_timestamp();
        Self {
            id,
            seq,
            url: url.to_string(),
            quality,
            state: JobState::Queued,
            progress: 0.0,
            phase: None,
            log: JobLog::new(),
            artifact: None,
            failure_reason: None,
            created_at: now,
            updated_at: now,
            finished_at: None,
        }
    }

    /// Copy of this record moved into Downloading with progress reset.
    pub fn started(&self) -> Self {
        Self {
            state: JobState::Downloading,
            progress: 0.0,
            phase: None,
            ..self.touched()
        }
    }

    /// Copy with one line of output appended and, if present, the parsed progress applied.
    pub fn with_output(&self, line: &str, progress: Option<ProgressEvent>) -> Self {
        let mut next = self.touched();
        next.log = self.log.with_line(line);
        if let Some(ev) = progress {
            next.progress = ev.fraction;
            next.phase = Some(ev.phase);
        }
        next
    }

    pub fn completed(&self, artifact: Artifact) -> Self {
        let next = self.touched();
        Self {
            state: JobState::Completed,
            progress: 1.0,
            artifact: Some(artifact),
            failure_reason: None,
            finished_at: Some(next.updated_at),
            ..next
        }
    }

    /// Replace the log with the fetcher's full transcript, if it returned one.
    pub fn with_final_log(mut self, log: String) -> Self {
        if !log.is_empty() {
            self.log = JobLog::from(log);
        }
        self
    }

    /// Copy moved into Failed; `detail` (full error chain or panic text) is appended to the log.
    pub fn failed(&self, reason: &str, detail: &str) -> Self {
        let mut next = self.touched();
        next.state = JobState::Failed;
        next.artifact = None;
        next.failure_reason = Some(reason.to_string());
        next.finished_at = Some(next.updated_at);
        next.log = self.log.with_line(&format!("ERROR: {detail}"));
        next
    }

    fn touched(&self) -> Self {
        let mut next = self.clone();
        next.updated_at = unix_timestamp();
        next
    }
}

/// Point-in-time status view returned to pollers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobStatus {
    pub id: JobId,
    pub state: JobState,
    pub progress: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phase: Option<Phase>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub artifact: Option<Artifact>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure_reason: Option<String>,
}

impl From<&JobRecord> for JobStatus {
    fn from(r: &JobRecord) -> Self {
        Self {
            id: r.id.clone(),
            state: r.state,
            progress: r.progress,
            phase: r.phase,
            artifact: if r.state == JobState::Completed {
                r.artifact.clone()
            } else {
                None
            },
            failure_reason: if r.state == JobState::Failed {
                r.failure_reason.clone()
            } else {
                None
            },
        }
    }
}

/// Current time as Unix seconds.
pub(crate) fn unix_timestamp() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs() as i64
}

/// Current time as Unix milliseconds (for job ids).
pub(crate) fn unix_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}
