//! Periodic reclamation of produced files in the shared download directory.
//!
//! Independent of job-record expiry: any regular file whose mtime is older than
//! the retention window is deleted. Per-file errors are logged and skipped.

use std::future::Future;
use std::io;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

/// Outcome of one sweep.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SweepReport {
    pub removed: usize,
    pub kept: usize,
    pub errors: usize,
}

/// Delete files in `dir` last modified more than `retention` before `now`.
/// A missing directory is an empty sweep.
pub async fn sweep_stale_files(dir: &Path, retention: Duration, now: SystemTime) -> SweepReport {
    sweep_with(dir, retention, now, |path: PathBuf| tokio::fs::remove_file(path)).await
}

async fn sweep_with<R, Fut>(
    dir: &Path,
    retention: Duration,
    now: SystemTime,
    mut remove: R,
) -> SweepReport
where
    R: FnMut(PathBuf) -> Fut,
    Fut: Future<Output = io::Result<()>>,
{
    let mut report = SweepReport::default();
    let mut entries = match tokio::fs::read_dir(dir).await {
        Ok(e) => e,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return report,
        Err(e) => {
            tracing::warn!(path = %dir.display(), "sweep: read dir: {}", e);
            report.errors += 1;
            return report;
        }
    };

    loop {
        let entry = match entries.next_entry().await {
            Ok(Some(entry)) => entry,
            Ok(None) => break,
            Err(e) => {
                tracing::warn!(path = %dir.display(), "sweep: list entry: {}", e);
                report.errors += 1;
                break;
            }
        };
        let meta = entry.metadata().await;
        sweep_entry(entry.path(), meta, retention, now, &mut remove, &mut report).await;
    }
    report
}

/// Stat result, then age check, then delete, for one directory entry.
/// Failures are counted in `report` and never stop the sweep.
async fn sweep_entry<R, Fut>(
    path: PathBuf,
    meta: io::Result<std::fs::Metadata>,
    retention: Duration,
    now: SystemTime,
    remove: &mut R,
    report: &mut SweepReport,
) where
    R: FnMut(PathBuf) -> Fut,
    Fut: Future<Output = io::Result<()>>,
{
    let meta = match meta {
        Ok(m) => m,
        Err(e) => {
            tracing::warn!(path = %path.display(), "sweep: stat: {}", e);
            report.errors += 1;
            return;
        }
    };
    if !meta.is_file() {
        return;
    }
    let age = meta
        .modified()
        .ok()
        .and_then(|m| now.duration_since(m).ok())
        .unwrap_or_default();
    if age <= retention {
        report.kept += 1;
        return;
    }
    match remove(path.clone()).await {
        Ok(()) => {
            tracing::info!(path = %path.display(), age_secs = age.as_secs(), "sweep: deleted stale file");
            report.removed += 1;
        }
        Err(e) => {
            tracing::warn!(path = %path.display(), "sweep: delete: {}", e);
            report.errors += 1;
        }
    }
}
