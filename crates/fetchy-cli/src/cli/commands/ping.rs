//! `fetchy ping` – check that the service answers.

use anyhow::Result;
use fetchy_core::control::{ControlRequest, ControlResponse};
use std::path::Path;

use super::unexpected;
use crate::cli::control_socket;

pub async fn run_ping(socket_path: &Path) -> Result<()> {
    match control_socket::request_ok(socket_path, &ControlRequest::Ping).await? {
        ControlResponse::Ok => {
            println!("ok");
            Ok(())
        }
        other => Err(unexpected(other)),
    }
}
