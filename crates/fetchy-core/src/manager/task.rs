//! Background task for one job: mark Downloading, stream progress into the
//! store, then write the terminal record and schedule its expiry.

use std::any::Any;
use std::error::Error;
use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::time::Instant;

use crate::expiry::ExpiryQueue;
use crate::fetch::{FetchError, FetchEvent, FetchOutcome, FetchRequest, Fetcher};
use crate::store::{JobId, JobStore};

use super::ManagerSettings;

/// Everything a job task needs; moved into the spawned task.
pub(super) struct JobTask<F> {
    pub(super) store: Arc<JobStore>,
    pub(super) expiry: Arc<ExpiryQueue>,
    pub(super) fetcher: Arc<F>,
    pub(super) settings: Arc<ManagerSettings>,
    pub(super) request: FetchRequest,
}

/// Runs the fetch pipeline in its own task so that a panic inside the fetcher
/// still ends with a Failed record instead of a job stuck in Downloading.
pub(super) async fn supervise<F: Fetcher>(task: JobTask<F>) {
    let JobTask {
        store,
        expiry,
        fetcher,
        settings,
        request,
    } = task;
    let id = request.job_id.clone();
    let capacity = settings.progress_channel_capacity;

    let pipeline = tokio::spawn(run_pipeline(Arc::clone(&store), fetcher, request, capacity));

    let terminal = match pipeline.await {
        Ok(Ok(outcome)) => {
            tracing::info!(job_id = %id, path = %outcome.artifact.path.display(), "job completed");
            let FetchOutcome { artifact, log } = outcome;
            store.update(&id, |r| r.completed(artifact).with_final_log(log))
        }
        Ok(Err(e)) => {
            let reason = error_chain(&e);
            tracing::warn!(job_id = %id, "job failed: {}", reason);
            store.update(&id, |r| r.failed(&reason, &reason))
        }
        Err(join_err) => {
            let detail = if join_err.is_panic() {
                panic_message(join_err.into_panic())
            } else {
                join_err.to_string()
            };
            tracing::error!(job_id = %id, "fetch task aborted: {}", detail);
            store.update(&id, |r| r.failed("fetch task panicked", &detail))
        }
    };

    match terminal {
        Ok(_) => expiry.schedule(id, Instant::now() + settings.retention),
        Err(e) => tracing::warn!(job_id = %id, "terminal update not applied: {}", e),
    }
}

async fn run_pipeline<F: Fetcher>(
    store: Arc<JobStore>,
    fetcher: Arc<F>,
    request: FetchRequest,
    capacity: usize,
) -> Result<FetchOutcome, FetchError> {
    if let Err(e) = store.update(&request.job_id, |r| r.started()) {
        tracing::warn!(job_id = %request.job_id, "mark downloading: {}", e);
    }

    let (tx, rx) = mpsc::channel(capacity.max(1));
    let updater = tokio::spawn(apply_progress(
        Arc::clone(&store),
        request.job_id.clone(),
        rx,
    ));

    let result = fetcher.fetch(request, tx).await;

    // The sender is gone once fetch returns; wait for the last updates to land
    // before the caller writes the terminal record.
    if let Err(e) = updater.await {
        tracing::warn!("progress updater join: {}", e);
    }
    result
}

/// Applies each event as one whole-record replacement. Stops when the record
/// is gone or already terminal.
async fn apply_progress(store: Arc<JobStore>, id: JobId, mut rx: mpsc::Receiver<FetchEvent>) {
    while let Some(event) = rx.recv().await {
        if let Err(e) = store.update(&id, |r| r.with_output(&event.line, event.progress)) {
            tracing::debug!(job_id = %id, "progress update dropped: {}", e);
            break;
        }
    }
}

/// `err: cause: cause` for an error and its sources.
pub(crate) fn error_chain(err: &dyn Error) -> String {
    let mut out = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        out.push_str(": ");
        out.push_str(&cause.to_string());
        source = cause.source();
    }
    out
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
