//! Build the fetch tool command line.

use std::path::{Path, PathBuf};

use crate::store::{JobId, Quality};

/// Settings shared by every invocation of the tool.
#[derive(Debug, Clone)]
pub struct InvocationSettings {
    pub program: String,
    /// Leading arguments, before the generated ones.
    pub program_args: Vec<String>,
    pub download_dir: PathBuf,
    pub merge_format: String,
    pub accepted_extensions: Vec<String>,
    pub extra_args: Vec<String>,
}

impl InvocationSettings {
    pub fn from_config(cfg: &crate::config::FetchyConfig) -> Self {
        Self {
            program: cfg.fetch_tool.clone(),
            program_args: cfg.fetch_tool_args.clone(),
            download_dir: cfg.resolved_download_dir(),
            merge_format: cfg.merge_format.clone(),
            accepted_extensions: cfg.accepted_extensions.clone(),
            extra_args: cfg.extra_args.clone(),
        }
    }
}

/// Filename prefix that ties produced files to their job.
pub(crate) fn artifact_prefix(job_id: &JobId) -> String {
    format!("{job_id}-")
}

/// Output template: `<dir>/<job-id>-<media-id>.<ext>`. Unique per job, stable per media id.
pub(crate) fn output_template(dir: &Path, job_id: &JobId) -> String {
    dir.join(format!("{}%(id)s.%(ext)s", artifact_prefix(job_id)))
        .to_string_lossy()
        .into_owned()
}

/// Arguments for one fetch: output template, format selector, merge and single-item
/// flags, line-buffered progress, extra args, then the URL after `--`.
///
/// `--no-mtime` keeps the file's mtime at write time; the file sweep ages files by mtime.
pub(crate) fn build_args(
    settings: &InvocationSettings,
    job_id: &JobId,
    url: &str,
    quality: Quality,
) -> Vec<String> {
    let mut args = settings.program_args.clone();
    args.extend([
        "-o".to_string(),
        output_template(&settings.download_dir, job_id),
        "--format".to_string(),
        quality.format_selector(),
        "--merge-output-format".to_string(),
        settings.merge_format.clone(),
        "--no-playlist".to_string(),
        "--no-mtime".to_string(),
        "--newline".to_string(),
        "--progress".to_string(),
    ]);
    args.extend(settings.extra_args.iter().cloned());
    args.push("--".to_string());
    args.push(url.to_string());
    args
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings() -> InvocationSettings {
        InvocationSettings {
            program: "yt-dlp".to_string(),
            program_args: Vec::new(),
            download_dir: PathBuf::from("/tmp/fetchy-downloads"),
            merge_format: "mp4".to_string(),
            accepted_extensions: vec!["mp4".to_string()],
            extra_args: vec!["--referer".to_string(), "https://www.youtube.com/embed/".to_string()],
        }
    }

    #[test]
    fn args_contain_template_selector_and_flags() {
        let id = JobId::from("job-1-2");
        let args = build_args(&settings(), &id, "https://v.example/watch?v=abc", Quality::Height(720));
        let pos = |flag: &str| args.iter().position(|a| a == flag).unwrap();
        assert_eq!(args[pos("-o") + 1], "/tmp/fetchy-downloads/job-1-2-%(id)s.%(ext)s");
        assert_eq!(args[pos("--format") + 1], "bestvideo[height<=720]+bestaudio/best");
        assert_eq!(args[pos("--merge-output-format") + 1], "mp4");
        assert!(args.contains(&"--no-playlist".to_string()));
        assert!(args.contains(&"--newline".to_string()));
        assert!(pos("--referer") < pos("--"));
        assert_eq!(args.last().unwrap(), "https://v.example/watch?v=abc");
        assert_eq!(args[args.len() - 2], "--");
    }

    #[test]
    fn server_mtime_is_not_applied() {
        let mut s = settings();
        s.extra_args.clear();
        let args = build_args(&s, &JobId::from("job-1-2"), "https://v.example/a", Quality::Best);
        let no_mtime = args.iter().position(|a| a == "--no-mtime").unwrap();
        let separator = args.iter().position(|a| a == "--").unwrap();
        assert!(no_mtime < separator);
        assert!(!args.iter().any(|a| a == "--mtime"));
    }

    #[test]
    fn program_args_come_first() {
        let mut s = settings();
        s.program_args = vec!["-m".to_string(), "yt_dlp".to_string()];
        let args = build_args(&s, &JobId::from("job-1-2"), "https://v.example/a", Quality::Best);
        assert_eq!(&args[..3], ["-m", "yt_dlp", "-o"]);
    }

    #[test]
    fn url_starting_with_dash_stays_positional() {
        let args = build_args(&settings(), &JobId::from("job-1-2"), "-weird", Quality::Best);
        assert_eq!(&args[args.len() - 2..], ["--", "-weird"]);
    }
}
