//! Subprocess-backed fetcher.

use std::io;
use std::process::Stdio;

use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;
use tokio::sync::mpsc;

use crate::progress::parse_progress;

use super::artifact::find_artifact;
use super::command::{build_args, InvocationSettings};
use super::{FetchError, FetchEvent, FetchOutcome, FetchRequest, Fetcher};

/// Runs the configured fetch tool (`yt-dlp` by default) as a child process.
#[derive(Debug, Clone)]
pub struct ProcessFetcher {
    settings: InvocationSettings,
}

impl ProcessFetcher {
    pub fn new(settings: InvocationSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &InvocationSettings {
        &self.settings
    }

    async fn run(
        &self,
        request: FetchRequest,
        events: mpsc::Sender<FetchEvent>,
    ) -> Result<FetchOutcome, FetchError> {
        let dir = &self.settings.download_dir;
        tokio::fs::create_dir_all(dir).await?;

        let args = build_args(&self.settings, &request.job_id, &request.url, request.quality);
        tracing::info!(
            job_id = %request.job_id,
            url = %request.url,
            quality = %request.quality,
            program = %self.settings.program,
            "starting fetch tool"
        );

        let mut child = Command::new(&self.settings.program)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| FetchError::Spawn {
                program: self.settings.program.clone(),
                source,
            })?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| io::Error::other("fetch tool stdout not captured"))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| io::Error::other("fetch tool stderr not captured"))?;

        let log = pump_output(&request, stdout, stderr, &events).await?;

        let status = child.wait().await?;
        if !status.success() {
            tracing::warn!(job_id = %request.job_id, code = ?status.code(), "fetch tool failed");
            return Err(FetchError::ProcessExit {
                code: status.code(),
            });
        }

        let artifact = find_artifact(dir, &request.job_id, &self.settings.accepted_extensions)
            .await?
            .ok_or_else(|| FetchError::ArtifactNotFound { dir: dir.clone() })?;
        tracing::info!(job_id = %request.job_id, path = %artifact.path.display(), "fetch finished");
        Ok(FetchOutcome { artifact, log })
    }
}

impl Fetcher for ProcessFetcher {
    fn fetch(
        &self,
        request: FetchRequest,
        events: mpsc::Sender<FetchEvent>,
    ) -> impl std::future::Future<Output = Result<FetchOutcome, FetchError>> + Send {
        self.run(request, events)
    }
}

/// Read both streams line by line until both close. Each line is appended to the
/// returned log and sent as an event immediately.
async fn pump_output<O, E>(
    request: &FetchRequest,
    stdout: O,
    stderr: E,
    events: &mpsc::Sender<FetchEvent>,
) -> io::Result<String>
where
    O: AsyncRead + Unpin,
    E: AsyncRead + Unpin,
{
    let mut out = BufReader::new(stdout).split(b'\n');
    let mut err = BufReader::new(stderr).split(b'\n');
    let (mut out_done, mut err_done) = (false, false);
    let mut log = String::new();
    let mut receiver_gone = false;

    while !(out_done && err_done) {
        let (from_stdout, segment) = tokio::select! {
            seg = out.next_segment(), if !out_done => (true, seg?),
            seg = err.next_segment(), if !err_done => (false, seg?),
        };
        let Some(bytes) = segment else {
            if from_stdout {
                out_done = true;
            } else {
                err_done = true;
            }
            continue;
        };
        let line = String::from_utf8_lossy(&bytes)
            .trim_end_matches('\r')
            .to_string();
        tracing::trace!(job_id = %request.job_id, "{}", line);
        log.push_str(&line);
        log.push('\n');
        if receiver_gone {
            continue;
        }
        let event = FetchEvent {
            progress: parse_progress(&line),
            line,
        };
        if events.send(event).await.is_err() {
            tracing::debug!(job_id = %request.job_id, "progress receiver closed");
            receiver_gone = true;
        }
    }
    Ok(log)
}
