//! Fetch pipeline error type.

use std::io;
use std::path::PathBuf;

/// Why a fetch did not produce an artifact. Every variant ends the job as Failed.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    /// The tool binary could not be started (missing, not executable, ...).
    #[error("failed to start fetch tool {program}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },
    /// The tool ran and exited unsuccessfully. `code` is None when it was killed by a signal.
    #[error("{}", exit_message(.code))]
    ProcessExit { code: Option<i32> },
    /// The tool reported success but no matching file was found.
    #[error("fetch tool succeeded but no output file was found in {}", .dir.display())]
    ArtifactNotFound { dir: PathBuf },
    /// Reading tool output or waiting on the process failed.
    #[error("fetch tool I/O: {0}")]
    Io(#[from] io::Error),
}

fn exit_message(code: &Option<i32>) -> String {
    match *code {
        Some(c) => format!("fetch tool exited with code {c}"),
        None => "fetch tool terminated by signal".to_string(),
    }
}
