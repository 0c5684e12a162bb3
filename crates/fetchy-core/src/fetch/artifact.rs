//! Locate the file a finished fetch produced.

use std::path::Path;

use crate::store::{Artifact, JobId};

use super::command::artifact_prefix;

/// First regular file in `dir` whose name starts with the job's prefix and whose
/// extension is accepted. Files of other jobs sharing the directory never match.
pub(crate) async fn find_artifact(
    dir: &Path,
    job_id: &JobId,
    accepted_extensions: &[String],
) -> std::io::Result<Option<Artifact>> {
    let prefix = artifact_prefix(job_id);
    let mut entries = tokio::fs::read_dir(dir).await?;
    let mut found: Vec<Artifact> = Vec::new();
    while let Some(entry) = entries.next_entry().await? {
        let name = entry.file_name().to_string_lossy().into_owned();
        if !name.starts_with(&prefix) {
            continue;
        }
        let ext_ok = Path::new(&name)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| accepted_extensions.iter().any(|a| a.eq_ignore_ascii_case(e)))
            .unwrap_or(false);
        if !ext_ok {
            continue;
        }
        if !entry.file_type().await?.is_file() {
            continue;
        }
        found.push(Artifact {
            path: entry.path(),
            name,
        });
    }
    // Directory order is unspecified; pick deterministically.
    found.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(found.into_iter().next())
}
