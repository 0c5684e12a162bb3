//! `fetchy serve` – run the job manager behind the control socket.

use anyhow::{Context, Result};
use fetchy_core::config::FetchyConfig;
use fetchy_core::manager::JobManager;
use std::path::Path;

use crate::cli::control_socket;

pub async fn run_serve(cfg: &FetchyConfig, socket_path: &Path) -> Result<()> {
    let manager = JobManager::from_config(cfg)?;
    let download_dir = manager.settings().download_dir.clone();
    tokio::fs::create_dir_all(&download_dir)
        .await
        .with_context(|| format!("create download dir {}", download_dir.display()))?;

    let sweeper = manager.spawn_sweeper();
    let listener = control_socket::spawn_control_listener(manager.clone(), socket_path)?;
    tracing::info!(
        socket = %socket_path.display(),
        download_dir = %download_dir.display(),
        "fetchy serving"
    );
    println!(
        "Listening on {} (downloads in {}). Press Ctrl-C to stop.",
        socket_path.display(),
        download_dir.display()
    );

    tokio::signal::ctrl_c().await.context("wait for Ctrl-C")?;

    listener.abort();
    sweeper.abort();
    let _ = std::fs::remove_file(socket_path);
    tracing::info!(jobs = manager.store().len(), "fetchy stopped");
    Ok(())
}
