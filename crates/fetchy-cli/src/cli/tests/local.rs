//! Tests for the in-process subcommands (serve, fetch).

use super::parse;
use crate::cli::{Cli, CliCommand};
use clap::Parser;

#[test]
fn cli_parse_serve() {
    match parse(&["fetchy", "serve"]) {
        CliCommand::Serve { download_dir } => assert!(download_dir.is_none()),
        _ => panic!("expected Serve"),
    }
}

#[test]
fn cli_parse_serve_download_dir() {
    match parse(&["fetchy", "serve", "--download-dir", "/var/tmp/fetchy"]) {
        CliCommand::Serve { download_dir } => {
            assert_eq!(
                download_dir.as_deref(),
                Some(std::path::Path::new("/var/tmp/fetchy"))
            );
        }
        _ => panic!("expected Serve with --download-dir"),
    }
}

#[test]
fn cli_parse_fetch() {
    match parse(&["fetchy", "fetch", "https://v.example/a", "-q", "480p"]) {
        CliCommand::Fetch {
            url,
            quality,
            download_dir,
        } => {
            assert_eq!(url, "https://v.example/a");
            assert_eq!(quality.as_deref(), Some("480p"));
            assert!(download_dir.is_none());
        }
        _ => panic!("expected Fetch"),
    }
}

#[test]
fn cli_rejects_unknown_subcommand() {
    assert!(Cli::try_parse_from(["fetchy", "pause", "1"]).is_err());
}
