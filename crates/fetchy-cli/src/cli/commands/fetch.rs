//! `fetchy fetch <url>` – run one job in-process and wait for it.

use anyhow::{bail, Result};
use fetchy_core::config::FetchyConfig;
use fetchy_core::manager::JobManager;
use fetchy_core::store::JobState;
use std::time::Duration;

use super::percent;

const PROGRESS_INTERVAL: Duration = Duration::from_millis(500);

pub async fn run_fetch(cfg: &FetchyConfig, url: &str, quality: Option<&str>) -> Result<()> {
    let manager = JobManager::from_config(cfg)?;
    let created = manager.create(url, quality)?;
    println!("Started job {}", created.id);

    let mut last_line = String::new();
    let status = loop {
        let Some(status) = manager.status(&created.id) else {
            bail!("job {} disappeared", created.id);
        };
        if status.state.is_terminal() {
            break status;
        }
        let line = match status.phase {
            Some(phase) => format!("  {} {} {}", status.state, phase, percent(status.progress)),
            None => format!("  {}", status.state),
        };
        if line != last_line {
            println!("{line}");
            last_line = line;
        }
        tokio::time::sleep(PROGRESS_INTERVAL).await;
    };

    match (status.state, status.artifact, status.failure_reason) {
        (JobState::Completed, Some(artifact), _) => {
            println!("Done: {}", artifact.path.display());
            Ok(())
        }
        (_, _, reason) => {
            if let Some(log) = manager.log(&created.id) {
                eprint!("{log}");
            }
            bail!(
                "job {} failed: {}",
                created.id,
                reason.unwrap_or_else(|| "unknown error".to_string())
            )
        }
    }
}
