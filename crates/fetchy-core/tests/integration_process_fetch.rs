//! Integration test: the job manager driving a real subprocess.
//!
//! A shell script stands in for the fetch tool; it prints progress on stdout
//! and stderr, writes the file named by the output template, and exits with a
//! chosen code.
#![cfg(unix)]

mod common;

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use common::fake_tool::FakeTool;
use fetchy_core::fetch::{InvocationSettings, ProcessFetcher};
use fetchy_core::manager::{JobManager, ManagerSettings};
use fetchy_core::store::{JobId, JobState, JobStatus, JobStore, Quality};
use tempfile::tempdir;

fn manager_for(tool: &FakeTool, work: &Path, downloads: &Path) -> JobManager<ProcessFetcher> {
    let script = tool.install(work);
    let fetcher = ProcessFetcher::new(InvocationSettings {
        program: "/bin/sh".to_string(),
        program_args: vec![script.to_string_lossy().into_owned()],
        download_dir: downloads.to_path_buf(),
        merge_format: "mp4".to_string(),
        accepted_extensions: vec!["mp4".to_string(), "webm".to_string(), "mkv".to_string()],
        extra_args: Vec::new(),
    });
    let settings = ManagerSettings {
        download_dir: downloads.to_path_buf(),
        default_quality: Quality::Height(1080),
        retention: Duration::from_secs(3600),
        expiry_check_interval: Duration::from_secs(60),
        sweep_interval: Duration::from_secs(3600),
        progress_channel_capacity: 16,
    };
    JobManager::new(Arc::new(JobStore::new()), fetcher, settings)
}

async fn wait_terminal(m: &JobManager<ProcessFetcher>, id: &JobId) -> (JobStatus, Vec<JobState>) {
    let mut seen: Vec<JobState> = Vec::new();
    let status = tokio::time::timeout(Duration::from_secs(20), async {
        loop {
            let s = m.status(id).expect("job exists");
            if seen.last() != Some(&s.state) {
                seen.push(s.state);
            }
            if s.state.is_terminal() {
                return s;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("job finished in time");
    (status, seen)
}

#[tokio::test]
async fn successful_fetch_reaches_completed() {
    let work = tempdir().unwrap();
    let downloads = tempdir().unwrap();
    let tool = FakeTool {
        step_delay: "0.2",
        ..FakeTool::default()
    };
    let m = manager_for(&tool, work.path(), downloads.path());

    let created = m.create("https://v.example/watch?v=media", Some("720p")).unwrap();
    assert_eq!(created.state, JobState::Queued);

    let (status, seen) = wait_terminal(&m, &created.id).await;
    assert_eq!(status.state, JobState::Completed);
    assert_eq!(seen.last(), Some(&JobState::Completed));
    assert!(seen.contains(&JobState::Downloading), "states seen: {seen:?}");
    assert!(!seen.contains(&JobState::Failed));

    let artifact = status.artifact.expect("artifact reference");
    assert_eq!(artifact.name, format!("{}-media.mp4", created.id));
    assert_eq!(artifact.path, downloads.path().join(&artifact.name));
    assert_eq!(std::fs::read(&artifact.path).unwrap(), b"video");
    assert_eq!(m.artifact(&created.id).await.unwrap(), artifact);

    let log = m.log(&created.id).unwrap();
    assert!(log.contains("[download]  45.2%"));
    assert!(log.contains("WARNING: fake tool stderr line"));
    assert!(log.contains("bestvideo[height<=720]+bestaudio/best"));
    assert!(log.contains("--no-playlist"));
    assert!(log.contains("--no-mtime"));
    assert!(log.contains("--merge-output-format mp4"));
    assert!(log.contains("-- https://v.example/watch?v=media"));
}

#[tokio::test]
async fn nonzero_exit_reaches_failed_with_code() {
    let work = tempdir().unwrap();
    let downloads = tempdir().unwrap();
    let tool = FakeTool {
        exit_code: 1,
        write_file: false,
        ..FakeTool::default()
    };
    let m = manager_for(&tool, work.path(), downloads.path());

    let created = m.create("https://v.example/watch?v=media", Some("720p")).unwrap();
    let (status, _) = wait_terminal(&m, &created.id).await;
    assert_eq!(status.state, JobState::Failed);
    let reason = status.failure_reason.expect("failure reason");
    assert!(reason.contains("code 1"), "reason: {reason}");
    assert!(status.artifact.is_none());
    assert!(m.artifact(&created.id).await.is_err());

    let log = m.log(&created.id).unwrap();
    assert!(log.contains("[download] 100.0%"));
    assert!(log.contains("ERROR: fetch tool exited with code 1"));
}

#[tokio::test]
async fn clean_exit_without_file_fails() {
    let work = tempdir().unwrap();
    let downloads = tempdir().unwrap();
    let tool = FakeTool {
        write_file: false,
        ..FakeTool::default()
    };
    let m = manager_for(&tool, work.path(), downloads.path());

    let created = m.create("https://v.example/a", None).unwrap();
    let (status, _) = wait_terminal(&m, &created.id).await;
    assert_eq!(status.state, JobState::Failed);
    assert!(status.failure_reason.unwrap().contains("no output file"));
}

#[tokio::test]
async fn missing_binary_fails_job() {
    let downloads = tempdir().unwrap();
    let fetcher = ProcessFetcher::new(InvocationSettings {
        program: "/nonexistent/fetchy-test-tool".to_string(),
        program_args: Vec::new(),
        download_dir: downloads.path().to_path_buf(),
        merge_format: "mp4".to_string(),
        accepted_extensions: vec!["mp4".to_string()],
        extra_args: Vec::new(),
    });
    let settings = ManagerSettings {
        download_dir: downloads.path().to_path_buf(),
        default_quality: Quality::Best,
        retention: Duration::from_secs(3600),
        expiry_check_interval: Duration::from_secs(60),
        sweep_interval: Duration::from_secs(3600),
        progress_channel_capacity: 16,
    };
    let m = JobManager::new(Arc::new(JobStore::new()), fetcher, settings);

    let created = m.create("https://v.example/a", None).unwrap();
    let (status, _) = wait_terminal(&m, &created.id).await;
    assert_eq!(status.state, JobState::Failed);
    let reason = status.failure_reason.unwrap();
    assert!(reason.contains("failed to start fetch tool"), "reason: {reason}");
}

#[tokio::test]
async fn concurrent_jobs_in_shared_directory_keep_their_files() {
    let work = tempdir().unwrap();
    let downloads = tempdir().unwrap();
    let m = manager_for(&FakeTool::default(), work.path(), downloads.path());

    let ids: Vec<JobId> = (0..4)
        .map(|i| m.create(&format!("https://v.example/{i}"), None).unwrap().id)
        .collect();
    for id in &ids {
        let (status, _) = wait_terminal(&m, id).await;
        assert_eq!(status.state, JobState::Completed);
        assert_eq!(status.artifact.unwrap().name, format!("{id}-media.mp4"));
    }
    assert_eq!(std::fs::read_dir(downloads.path()).unwrap().count(), 4);
}
