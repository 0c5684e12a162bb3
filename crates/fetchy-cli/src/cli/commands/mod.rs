//! CLI command handlers. Each command is in its own file.

mod add;
mod artifact;
mod fetch;
mod log;
mod ping;
mod serve;
mod status;

pub use add::run_add;
pub use artifact::run_artifact;
pub use fetch::run_fetch;
pub use log::run_log;
pub use ping::run_ping;
pub use serve::run_serve;
pub use status::run_status;

use anyhow::anyhow;
use fetchy_core::control::ControlResponse;

/// Response variant a command did not ask for.
pub(crate) fn unexpected(resp: ControlResponse) -> anyhow::Error {
    anyhow!("unexpected response from server: {:?}", resp)
}

pub(crate) fn percent(progress: f64) -> String {
    format!("{:.1}%", progress * 100.0)
}
