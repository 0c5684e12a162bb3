//! Control protocol between a running `fetchy serve` and its clients.
//!
//! One request per line (`create <url> [quality]`, `status <id>`, `log <id>`,
//! `artifact <id>`, `list`, `ping`), one JSON response per line. Unknown or expired
//! ids come back as a `not_found` error, never as a server fault.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::fetch::Fetcher;
use crate::manager::{ArtifactError, CreatedJob, JobManager};
use crate::store::{Artifact, JobId, JobStatus};

/// A parsed request line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControlRequest {
    Create { url: String, quality: Option<String> },
    Status { id: JobId },
    Log { id: JobId },
    Artifact { id: JobId },
    List,
    /// Liveness check.
    Ping,
}

/// Malformed request line.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ControlError {
    #[error("empty request")]
    Empty,
    #[error("unknown command {0:?}")]
    UnknownCommand(String),
    #[error("{command}: {problem}")]
    BadArguments {
        command: &'static str,
        problem: &'static str,
    },
}

impl FromStr for ControlRequest {
    type Err = ControlError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let mut words = line.split_whitespace();
        let command = words.next().ok_or(ControlError::Empty)?;
        let args: Vec<&str> = words.collect();
        let single_id = |command: &'static str| match args.as_slice() {
            [id] => Ok(JobId::from(*id)),
            _ => Err(ControlError::BadArguments {
                command,
                problem: "expected exactly one job id",
            }),
        };
        match command {
            "create" => match args.as_slice() {
                [url] => Ok(ControlRequest::Create {
                    url: url.to_string(),
                    quality: None,
                }),
                [url, quality] => Ok(ControlRequest::Create {
                    url: url.to_string(),
                    quality: Some(quality.to_string()),
                }),
                _ => Err(ControlError::BadArguments {
                    command: "create",
                    problem: "expected <url> [quality]",
                }),
            },
            "status" => Ok(ControlRequest::Status {
                id: single_id("status")?,
            }),
            "log" => Ok(ControlRequest::Log {
                id: single_id("log")?,
            }),
            "artifact" => Ok(ControlRequest::Artifact {
                id: single_id("artifact")?,
            }),
            "list" if args.is_empty() => Ok(ControlRequest::List),
            "list" => Err(ControlError::BadArguments {
                command: "list",
                problem: "takes no arguments",
            }),
            "ping" if args.is_empty() => Ok(ControlRequest::Ping),
            "ping" => Err(ControlError::BadArguments {
                command: "ping",
                problem: "takes no arguments",
            }),
            other => Err(ControlError::UnknownCommand(other.to_string())),
        }
    }
}

impl fmt::Display for ControlRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ControlRequest::Create { url, quality: None } => write!(f, "create {url}"),
            ControlRequest::Create {
                url,
                quality: Some(q),
            } => write!(f, "create {url} {q}"),
            ControlRequest::Status { id } => write!(f, "status {id}"),
            ControlRequest::Log { id } => write!(f, "log {id}"),
            ControlRequest::Artifact { id } => write!(f, "artifact {id}"),
            ControlRequest::List => f.write_str("list"),
            ControlRequest::Ping => f.write_str("ping"),
        }
    }
}

/// Error category carried in an error response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Unknown or expired job.
    NotFound,
    /// Job exists but has no artifact yet (or failed).
    NotReady,
    /// Job completed but its file is gone.
    Missing,
    /// Malformed request or rejected input.
    Invalid,
}

impl ErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::NotFound => "not_found",
            ErrorKind::NotReady => "not_ready",
            ErrorKind::Missing => "missing",
            ErrorKind::Invalid => "invalid",
        }
    }
}

/// One response line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ControlResponse {
    /// Answer to `ping`.
    Ok,
    Created(CreatedJob),
    Status(JobStatus),
    Log { id: JobId, log: String },
    Artifact { id: JobId, path: PathBuf, name: String },
    Jobs { jobs: Vec<JobStatus> },
    Error { error: ErrorKind, message: String },
}

impl ControlResponse {
    fn error(error: ErrorKind, message: impl fmt::Display) -> Self {
        ControlResponse::Error {
            error,
            message: message.to_string(),
        }
    }

    fn not_found(id: &JobId) -> Self {
        Self::error(ErrorKind::NotFound, format_args!("job {id} not found"))
    }
}

/// Parse and answer one request line.
pub async fn handle_line<F: Fetcher>(manager: &JobManager<F>, line: &str) -> ControlResponse {
    match line.parse::<ControlRequest>() {
        Ok(request) => handle(manager, request).await,
        Err(e) => ControlResponse::error(ErrorKind::Invalid, e),
    }
}

/// Answer one request against the manager.
pub async fn handle<F: Fetcher>(manager: &JobManager<F>, request: ControlRequest) -> ControlResponse {
    match request {
        ControlRequest::Create { url, quality } => match manager.create(&url, quality.as_deref()) {
            Ok(created) => ControlResponse::Created(created),
            Err(e) => ControlResponse::error(ErrorKind::Invalid, e),
        },
        ControlRequest::Status { id } => match manager.status(&id) {
            Some(status) => ControlResponse::Status(status),
            None => ControlResponse::not_found(&id),
        },
        ControlRequest::Log { id } => match manager.log(&id) {
            Some(log) => ControlResponse::Log { id, log },
            None => ControlResponse::not_found(&id),
        },
        ControlRequest::Artifact { id } => match manager.artifact(&id).await {
            Ok(Artifact { path, name }) => ControlResponse::Artifact { id, path, name },
            Err(e @ ArtifactError::NotFound(_)) => ControlResponse::error(ErrorKind::NotFound, e),
            Err(e @ ArtifactError::NotReady { .. }) => ControlResponse::error(ErrorKind::NotReady, e),
            Err(e @ ArtifactError::Missing { .. }) => ControlResponse::error(ErrorKind::Missing, e),
        },
        ControlRequest::List => ControlResponse::Jobs {
            jobs: manager.list(),
        },
        ControlRequest::Ping => ControlResponse::Ok,
    }
}

/// Default path for the control socket (same XDG state dir as the log file).
pub fn default_control_socket_path() -> std::io::Result<PathBuf> {
    let dir = xdg::BaseDirectories::with_prefix("fetchy")?.get_state_home();
    Ok(dir.join("fetchy").join("control.sock"))
}
