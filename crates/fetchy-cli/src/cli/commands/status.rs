//! `fetchy status [id]` – show one job or all jobs.

use anyhow::Result;
use fetchy_core::control::{ControlRequest, ControlResponse};
use fetchy_core::store::{JobId, JobStatus};
use std::path::Path;

use super::{percent, unexpected};
use crate::cli::control_socket;

pub async fn run_status(socket_path: &Path, id: Option<String>) -> Result<()> {
    let request = match id {
        Some(id) => ControlRequest::Status {
            id: JobId::from(id),
        },
        None => ControlRequest::List,
    };
    match control_socket::request_ok(socket_path, &request).await? {
        ControlResponse::Status(status) => print_one(&status),
        ControlResponse::Jobs { jobs } => print_table(&jobs),
        other => return Err(unexpected(other)),
    }
    Ok(())
}

fn print_one(s: &JobStatus) {
    println!("Job:      {}", s.id);
    println!("State:    {}", s.state);
    println!("Progress: {}", percent(s.progress));
    if let Some(phase) = s.phase {
        println!("Phase:    {phase}");
    }
    if let Some(a) = &s.artifact {
        println!("File:     {} ({})", a.name, a.path.display());
    }
    if let Some(reason) = &s.failure_reason {
        println!("Reason:   {reason}");
    }
}

fn print_table(jobs: &[JobStatus]) {
    if jobs.is_empty() {
        println!("No jobs.");
        return;
    }
    println!("{:<28} {:<12} {:<8} {}", "ID", "STATE", "PROGRESS", "DETAIL");
    for j in jobs {
        let detail = match (&j.artifact, &j.failure_reason, j.phase) {
            (Some(a), _, _) => a.name.clone(),
            (_, Some(reason), _) => reason.clone(),
            (_, _, Some(phase)) => phase.to_string(),
            _ => "-".to_string(),
        };
        println!(
            "{:<28} {:<12} {:<8} {}",
            j.id,
            j.state,
            percent(j.progress),
            detail
        );
    }
}
