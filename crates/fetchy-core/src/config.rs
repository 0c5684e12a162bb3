use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

/// Global configuration loaded from `~/.config/fetchy/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchyConfig {
    /// Fetch tool binary (name on PATH or absolute path).
    pub fetch_tool: String,
    /// Arguments placed before the generated ones (e.g. `["-m", "yt_dlp"]` with `fetch_tool = "python3"`).
    pub fetch_tool_args: Vec<String>,
    /// Shared directory for produced files. None = `$TMPDIR/fetchy-downloads`.
    pub download_dir: Option<PathBuf>,
    /// Quality tier used when a request does not name one (e.g. "1080p", "best").
    pub default_quality: String,
    /// Container the tool merges video and audio into.
    pub merge_format: String,
    /// File extensions accepted as a finished artifact.
    pub accepted_extensions: Vec<String>,
    /// Extra arguments passed to the tool before the URL (e.g. `--referer`).
    pub extra_args: Vec<String>,
    /// How long finished jobs and produced files are kept, in seconds.
    pub retention_secs: u64,
    /// Interval between sweeps of stale files in the download directory, in seconds.
    pub sweep_interval_secs: u64,
    /// Interval between checks for expired job records, in seconds.
    pub expiry_check_secs: u64,
    /// Buffered progress events per running job before the reader waits.
    pub progress_channel_capacity: usize,
}

impl Default for FetchyConfig {
    fn default() -> Self {
        Self {
            fetch_tool: "yt-dlp".to_string(),
            fetch_tool_args: Vec::new(),
            download_dir: None,
            default_quality: "1080p".to_string(),
            merge_format: "mp4".to_string(),
            accepted_extensions: vec!["mp4".to_string(), "webm".to_string(), "mkv".to_string()],
            extra_args: Vec::new(),
            retention_secs: 3600,
            sweep_interval_secs: 3600,
            expiry_check_secs: 60,
            progress_channel_capacity: 64,
        }
    }
}

impl FetchyConfig {
    /// Download directory, falling back to the system temp dir.
    pub fn resolved_download_dir(&self) -> PathBuf {
        self.download_dir
            .clone()
            .unwrap_or_else(|| std::env::temp_dir().join("fetchy-downloads"))
    }

    pub fn retention(&self) -> Duration {
        Duration::from_secs(self.retention_secs)
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs.max(1))
    }

    pub fn expiry_check_interval(&self) -> Duration {
        Duration::from_secs(self.expiry_check_secs.max(1))
    }
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("fetchy")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load configuration from disk, creating a default file if none exists.
pub fn load_or_init() -> Result<FetchyConfig> {
    let path = config_path()?;
    if !path.exists() {
        let default_cfg = FetchyConfig::default();
        let toml = toml::to_string_pretty(&default_cfg)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, toml)?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }

    let data = fs::read_to_string(&path)
        .with_context(|| format!("read config {}", path.display()))?;
    let cfg: FetchyConfig =
        toml::from_str(&data).with_context(|| format!("parse config {}", path.display()))?;
    Ok(cfg)
}
