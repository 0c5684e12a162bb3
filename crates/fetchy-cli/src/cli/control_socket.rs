//! Control socket: server (during `fetchy serve`) and client (for `add`, `status`, ...).
//! Protocol: one request line in, one JSON line out; see `fetchy_core::control`.

use anyhow::{bail, Context, Result};
use fetchy_core::control::{self, ControlRequest, ControlResponse};
use fetchy_core::fetch::Fetcher;
use fetchy_core::manager::JobManager;
use std::path::Path;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{UnixListener, UnixStream};

/// Binds `path` and spawns a task answering requests against `manager`.
/// A stale socket file from a previous run is replaced.
pub fn spawn_control_listener<F: Fetcher>(
    manager: JobManager<F>,
    path: impl AsRef<Path>,
) -> Result<tokio::task::JoinHandle<()>> {
    let path = path.as_ref().to_path_buf();
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create socket dir {}", parent.display()))?;
    }
    let _ = std::fs::remove_file(&path);
    let listener = UnixListener::bind(&path)
        .with_context(|| format!("bind control socket {}", path.display()))?;

    let handle = tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((stream, _)) => {
                    let manager = manager.clone();
                    tokio::spawn(async move {
                        if let Err(e) = serve_connection(&manager, stream).await {
                            tracing::debug!("control connection: {}", e);
                        }
                    });
                }
                Err(e) => tracing::debug!("control socket accept: {}", e),
            }
        }
    });
    Ok(handle)
}

async fn serve_connection<F: Fetcher>(manager: &JobManager<F>, stream: UnixStream) -> Result<()> {
    let (read, mut write) = stream.into_split();
    let mut lines = BufReader::new(read).lines();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let response = control::handle_line(manager, line).await;
        let mut out = serde_json::to_string(&response)?;
        out.push('\n');
        write.write_all(out.as_bytes()).await?;
    }
    Ok(())
}

/// Sends one request and reads one response.
pub async fn send_request(socket_path: &Path, request: &ControlRequest) -> Result<ControlResponse> {
    let stream = UnixStream::connect(socket_path).await.with_context(|| {
        format!(
            "connect to {} (is `fetchy serve` running?)",
            socket_path.display()
        )
    })?;
    let (read, mut write) = stream.into_split();
    write.write_all(format!("{request}\n").as_bytes()).await?;
    write.shutdown().await?;

    let mut lines = BufReader::new(read).lines();
    let Some(line) = lines.next_line().await? else {
        bail!("control socket closed without a response");
    };
    serde_json::from_str(&line).with_context(|| format!("malformed response: {line}"))
}

/// Like `send_request`, but an error response becomes `Err`.
pub async fn request_ok(socket_path: &Path, request: &ControlRequest) -> Result<ControlResponse> {
    match send_request(socket_path, request).await? {
        ControlResponse::Error { error, message } => {
            bail!("{} ({})", message, error.as_str())
        }
        other => Ok(other),
    }
}
