//! `fetchy log <id>` – print the raw tool output of a job.

use anyhow::Result;
use fetchy_core::control::{ControlRequest, ControlResponse};
use fetchy_core::store::JobId;
use std::path::Path;

use super::unexpected;
use crate::cli::control_socket;

pub async fn run_log(socket_path: &Path, id: String) -> Result<()> {
    let request = ControlRequest::Log {
        id: JobId::from(id),
    };
    match control_socket::request_ok(socket_path, &request).await? {
        ControlResponse::Log { log, .. } => {
            print!("{log}");
            Ok(())
        }
        other => Err(unexpected(other)),
    }
}
