use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use crate::fetcher::FetchOptions;
use crate::pipeline::{ExportMode, PipelineConfigBuilder};
use crate::registry::DefaultCollaborators;

/// Transfer timeouts for the default fetcher (optional section in config.toml).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetchConfig {
    pub connect_timeout_secs: u64,
    /// Abort when the rate stays below this for `low_speed_time_secs`.
    pub low_speed_limit_bytes: u32,
    pub low_speed_time_secs: u64,
    /// Upper bound for a whole transfer.
    pub timeout_secs: u64,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            connect_timeout_secs: 30,
            low_speed_limit_bytes: 1024,
            low_speed_time_secs: 60,
            timeout_secs: 3600,
        }
    }
}

impl FetchConfig {
    pub fn to_options(&self) -> FetchOptions {
        FetchOptions {
            connect_timeout: Duration::from_secs(self.connect_timeout_secs),
            low_speed_limit: self.low_speed_limit_bytes,
            low_speed_time: Duration::from_secs(self.low_speed_time_secs),
            timeout: Duration::from_secs(self.timeout_secs),
        }
    }
}

/// Global configuration loaded from `~/.config/vdl/config.toml`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VdlConfig {
    /// Where videos are saved. Relative paths resolve against the working directory.
    pub video_dir: PathBuf,
    /// Where extracted audio is saved.
    pub audio_dir: PathBuf,
    /// Which artifacts to keep: "video", "audio" or "both".
    #[serde(default)]
    pub export: ExportMode,
    /// Skip jobs whose video file already exists.
    #[serde(default)]
    pub skip_if_exists: bool,
    /// Delete the video after audio extraction even when exporting both.
    #[serde(default)]
    pub cleanup_video_after_audio: bool,
    /// ffmpeg binary used for audio extraction (None = "ffmpeg" on PATH).
    #[serde(default)]
    pub ffmpeg_path: Option<PathBuf>,
    /// Optional transfer timeouts; if missing, built-in defaults are used.
    #[serde(default)]
    pub fetch: Option<FetchConfig>,
}

impl Default for VdlConfig {
    fn default() -> Self {
        Self {
            video_dir: PathBuf::from("videos"),
            audio_dir: PathBuf::from("audio"),
            export: ExportMode::Both,
            skip_if_exists: false,
            cleanup_video_after_audio: false,
            ffmpeg_path: None,
            fetch: None,
        }
    }
}

impl VdlConfig {
    /// Pipeline settings seeded from this file; callers may override before `build()`.
    pub fn pipeline_builder(&self) -> PipelineConfigBuilder {
        PipelineConfigBuilder::new()
            .video_dir(&self.video_dir)
            .audio_dir(&self.audio_dir)
            .export_mode(self.export)
            .skip_if_exists(self.skip_if_exists)
            .cleanup_video_after_audio(self.cleanup_video_after_audio)
    }

    /// libcurl + ffmpeg collaborators with this file's timeouts and ffmpeg path.
    pub fn collaborators(&self) -> DefaultCollaborators {
        DefaultCollaborators {
            fetch: self.fetch.clone().unwrap_or_default().to_options(),
            ffmpeg: self
                .ffmpeg_path
                .clone()
                .unwrap_or_else(|| PathBuf::from("ffmpeg")),
        }
    }
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("vdl")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load configuration from disk, creating a default file if none exists.
pub fn load_or_init() -> Result<VdlConfig> {
    let path = config_path()?;
    if !path.exists() {
        let default_cfg = VdlConfig::default();
        let toml = toml::to_string_pretty(&default_cfg)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, toml)?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }

    let data = fs::read_to_string(&path).with_context(|| format!("read {}", path.display()))?;
    let cfg: VdlConfig =
        toml::from_str(&data).with_context(|| format!("parse {}", path.display()))?;
    Ok(cfg)
}
