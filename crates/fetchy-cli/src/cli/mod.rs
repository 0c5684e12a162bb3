//! CLI for the Fetchy job service.

mod commands;
mod control_socket;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use fetchy_core::config;
use std::path::PathBuf;

use commands::{run_add, run_artifact, run_fetch, run_log, run_ping, run_serve, run_status};

/// Top-level CLI for Fetchy.
#[derive(Debug, Parser)]
#[command(name = "fetchy")]
#[command(about = "Fetchy: background media fetch jobs with progress tracking", long_about = None)]
pub struct Cli {
    /// Control socket path (default: $XDG_STATE_HOME/fetchy/control.sock).
    #[arg(long, global = true, value_name = "PATH")]
    pub socket: Option<PathBuf>,

    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Run the job service: accept requests on the control socket until Ctrl-C.
    Serve {
        /// Directory for produced files (overrides config).
        #[arg(long, value_name = "DIR")]
        download_dir: Option<PathBuf>,
    },

    /// Check that a service is answering on the control socket.
    Ping,

    /// Submit a new fetch job to a running service.
    Add {
        /// Media page URL.
        url: String,
        /// Quality tier, e.g. 720p, 1080p or best (default from config).
        #[arg(long, short)]
        quality: Option<String>,
    },

    /// Show status of one job, or of all jobs.
    Status {
        /// Job identifier.
        id: Option<String>,
    },

    /// Print the raw fetch tool output of a job.
    Log {
        /// Job identifier.
        id: String,
    },

    /// Show (and optionally copy out) the file produced by a completed job.
    Artifact {
        /// Job identifier.
        id: String,
        /// Copy the file into this directory under its suggested name.
        #[arg(long, short, value_name = "DIR")]
        output: Option<PathBuf>,
    },

    /// Fetch one URL in-process and wait for it, printing progress.
    Fetch {
        /// Media page URL.
        url: String,
        /// Quality tier, e.g. 720p, 1080p or best (default from config).
        #[arg(long, short)]
        quality: Option<String>,
        /// Directory for the produced file (overrides config).
        #[arg(long, value_name = "DIR")]
        download_dir: Option<PathBuf>,
    },
}

impl CliCommand {
    pub async fn run_from_args() -> Result<()> {
        let cli = Cli::parse();
        let mut cfg = config::load_or_init()?;
        tracing::debug!("loaded config: {:?}", cfg);
        let socket_path = match cli.socket {
            Some(p) => p,
            None => fetchy_core::control::default_control_socket_path()
                .context("resolve control socket path")?,
        };

        match cli.command {
            CliCommand::Serve { download_dir } => {
                if download_dir.is_some() {
                    cfg.download_dir = download_dir;
                }
                run_serve(&cfg, &socket_path).await?
            }
            CliCommand::Ping => run_ping(&socket_path).await?,
            CliCommand::Add { url, quality } => run_add(&socket_path, &url, quality).await?,
            CliCommand::Status { id } => run_status(&socket_path, id).await?,
            CliCommand::Log { id } => run_log(&socket_path, id).await?,
            CliCommand::Artifact { id, output } => {
                run_artifact(&socket_path, id, output.as_deref()).await?
            }
            CliCommand::Fetch {
                url,
                quality,
                download_dir,
            } => {
                if download_dir.is_some() {
                    cfg.download_dir = download_dir;
                }
                run_fetch(&cfg, &url, quality.as_deref()).await?
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests;
