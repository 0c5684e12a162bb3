//! Tests for the socket client subcommands.

use super::{parse, parse_cli};
use crate::cli::{Cli, CliCommand};
use clap::Parser;

#[test]
fn cli_parse_add() {
    match parse(&["fetchy", "add", "https://v.example/watch?v=abc"]) {
        CliCommand::Add { url, quality } => {
            assert_eq!(url, "https://v.example/watch?v=abc");
            assert!(quality.is_none());
        }
        _ => panic!("expected Add"),
    }
}

#[test]
fn cli_parse_add_quality() {
    match parse(&["fetchy", "add", "https://v.example/a", "--quality", "720p"]) {
        CliCommand::Add { quality, .. } => assert_eq!(quality.as_deref(), Some("720p")),
        _ => panic!("expected Add with --quality"),
    }
    match parse(&["fetchy", "add", "https://v.example/a", "-q", "best"]) {
        CliCommand::Add { quality, .. } => assert_eq!(quality.as_deref(), Some("best")),
        _ => panic!("expected Add with -q"),
    }
}

#[test]
fn cli_parse_status_all_and_one() {
    match parse(&["fetchy", "status"]) {
        CliCommand::Status { id } => assert!(id.is_none()),
        _ => panic!("expected Status"),
    }
    match parse(&["fetchy", "status", "job-1-0"]) {
        CliCommand::Status { id } => assert_eq!(id.as_deref(), Some("job-1-0")),
        _ => panic!("expected Status with id"),
    }
}

#[test]
fn cli_parse_ping() {
    assert!(matches!(parse(&["fetchy", "ping"]), CliCommand::Ping));
    assert!(Cli::try_parse_from(["fetchy", "ping", "extra"]).is_err());
}

#[test]
fn cli_parse_log() {
    match parse(&["fetchy", "log", "job-1-0"]) {
        CliCommand::Log { id } => assert_eq!(id, "job-1-0"),
        _ => panic!("expected Log"),
    }
}

#[test]
fn cli_parse_log_requires_id() {
    assert!(Cli::try_parse_from(["fetchy", "log"]).is_err());
}

#[test]
fn cli_parse_artifact_output() {
    match parse(&["fetchy", "artifact", "job-1-0", "--output", "/tmp/out"]) {
        CliCommand::Artifact { id, output } => {
            assert_eq!(id, "job-1-0");
            assert_eq!(output.as_deref(), Some(std::path::Path::new("/tmp/out")));
        }
        _ => panic!("expected Artifact"),
    }
}

#[test]
fn cli_parse_global_socket() {
    let cli = parse_cli(&["fetchy", "status", "--socket", "/run/fetchy.sock"]);
    assert_eq!(cli.socket.as_deref(), Some(std::path::Path::new("/run/fetchy.sock")));
    let cli = parse_cli(&["fetchy", "status"]);
    assert!(cli.socket.is_none());
}
