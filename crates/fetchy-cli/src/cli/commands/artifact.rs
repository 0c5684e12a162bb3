//! `fetchy artifact <id>` – show or copy out the file of a completed job.

use anyhow::{Context, Result};
use fetchy_core::control::{ControlRequest, ControlResponse};
use fetchy_core::store::JobId;
use std::path::Path;

use super::unexpected;
use crate::cli::control_socket;

pub async fn run_artifact(socket_path: &Path, id: String, output: Option<&Path>) -> Result<()> {
    let request = ControlRequest::Artifact {
        id: JobId::from(id),
    };
    let (path, name) = match control_socket::request_ok(socket_path, &request).await? {
        ControlResponse::Artifact { path, name, .. } => (path, name),
        other => return Err(unexpected(other)),
    };

    let Some(dir) = output else {
        println!("{}", path.display());
        return Ok(());
    };
    tokio::fs::create_dir_all(dir)
        .await
        .with_context(|| format!("create output dir {}", dir.display()))?;
    let dest = dir.join(&name);
    let bytes = tokio::fs::copy(&path, &dest)
        .await
        .with_context(|| format!("copy {} to {}", path.display(), dest.display()))?;
    tracing::info!(src = %path.display(), dest = %dest.display(), bytes, "artifact copied");
    println!("Saved {} ({} bytes)", dest.display(), bytes);
    Ok(())
}
