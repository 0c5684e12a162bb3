//! `fetchy add <url>` – submit a job to the running service.

use anyhow::Result;
use fetchy_core::control::{ControlRequest, ControlResponse};
use std::path::Path;

use super::unexpected;
use crate::cli::control_socket;

pub async fn run_add(socket_path: &Path, url: &str, quality: Option<String>) -> Result<()> {
    let request = ControlRequest::Create {
        url: url.to_string(),
        quality,
    };
    match control_socket::request_ok(socket_path, &request).await? {
        ControlResponse::Created(created) => {
            println!("Queued job {} for URL: {url}", created.id);
            Ok(())
        }
        other => Err(unexpected(other)),
    }
}
