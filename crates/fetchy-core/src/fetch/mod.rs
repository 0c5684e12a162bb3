//! Fetch invoker: runs the external media fetch tool for one job.
//!
//! The tool is an opaque subprocess. Each output line (stdout and stderr) is
//! forwarded as a [`FetchEvent`] as soon as it is read, with any progress parsed
//! from it. On success the produced file is located by its job-id prefix.

mod artifact;
mod command;
mod error;
mod process;

use std::future::Future;

use tokio::sync::mpsc;

use crate::progress::ProgressEvent;
use crate::store::{Artifact, JobId, Quality};

pub use command::InvocationSettings;
pub use error::FetchError;
pub use process::ProcessFetcher;

/// What to fetch.
#[derive(Debug, Clone)]
pub struct FetchRequest {
    pub job_id: JobId,
    pub url: String,
    pub quality: Quality,
}

/// One line of tool output and the progress parsed from it, if any.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchEvent {
    pub line: String,
    pub progress: Option<ProgressEvent>,
}

/// Result of a successful fetch.
#[derive(Debug, Clone)]
pub struct FetchOutcome {
    pub artifact: Artifact,
    /// Everything the tool printed.
    pub log: String,
}

/// Runs one fetch to completion, streaming events into `events`.
///
/// Implementations must not return before the last event has been sent.
/// A closed `events` receiver is not an error; the fetch keeps running.
pub trait Fetcher: Send + Sync + 'static {
    fn fetch(
        &self,
        request: FetchRequest,
        events: mpsc::Sender<FetchEvent>,
    ) -> impl Future<Output = Result<FetchOutcome, FetchError>> + Send;
}
