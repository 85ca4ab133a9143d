//! Validated pipeline settings shared read-only by every job.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Which artifacts a run keeps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportMode {
    Video,
    Audio,
    #[default]
    Both,
}

impl ExportMode {
    pub fn includes_video(self) -> bool {
        matches!(self, ExportMode::Video | ExportMode::Both)
    }

    pub fn includes_audio(self) -> bool {
        matches!(self, ExportMode::Audio | ExportMode::Both)
    }
}

impl fmt::Display for ExportMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExportMode::Video => f.write_str("video"),
            ExportMode::Audio => f.write_str("audio"),
            ExportMode::Both => f.write_str("both"),
        }
    }
}

impl FromStr for ExportMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "video" => Ok(ExportMode::Video),
            "audio" => Ok(ExportMode::Audio),
            "both" => Ok(ExportMode::Both),
            other => Err(format!(
                "unknown export mode '{}' (expected video, audio or both)",
                other
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DirectoryKind {
    Video,
    Audio,
}

impl fmt::Display for DirectoryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DirectoryKind::Video => f.write_str("video"),
            DirectoryKind::Audio => f.write_str("audio"),
        }
    }
}

/// Invalid settings, raised by [`PipelineConfigBuilder::build`] before any job runs.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("path to the {kind} export directory was not set")]
    MissingDirectory { kind: DirectoryKind },
    #[error("{kind} export directory {path} is invalid: {source}")]
    CreateDirectory {
        kind: DirectoryKind,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("cleanup of the video after audio extraction requires audio in the export mode (got {mode})")]
    CleanupWithoutAudio { mode: ExportMode },
}

/// Settings every job reads. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineConfig {
    video_dir: PathBuf,
    audio_dir: PathBuf,
    export_mode: ExportMode,
    skip_if_exists: bool,
    cleanup_video_after_audio: bool,
}

impl PipelineConfig {
    pub fn builder() -> PipelineConfigBuilder {
        PipelineConfigBuilder::default()
    }

    pub fn video_dir(&self) -> &Path {
        &self.video_dir
    }

    pub fn audio_dir(&self) -> &Path {
        &self.audio_dir
    }

    pub fn export_mode(&self) -> ExportMode {
        self.export_mode
    }

    pub fn skip_if_exists(&self) -> bool {
        self.skip_if_exists
    }

    pub fn cleanup_video_after_audio(&self) -> bool {
        self.cleanup_video_after_audio
    }

    /// Whether the intermediate video is deleted once audio was extracted.
    pub fn removes_video_after_audio(&self) -> bool {
        self.export_mode.includes_audio()
            && (!self.export_mode.includes_video() || self.cleanup_video_after_audio)
    }
}

/// Builder for [`PipelineConfig`]. Defaults: export both, no skip, no cleanup.
#[derive(Debug, Clone, Default)]
pub struct PipelineConfigBuilder {
    video_dir: Option<PathBuf>,
    audio_dir: Option<PathBuf>,
    export_mode: ExportMode,
    skip_if_exists: bool,
    cleanup_video_after_audio: bool,
}

impl PipelineConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn video_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.video_dir = Some(dir.into());
        self
    }

    pub fn audio_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.audio_dir = Some(dir.into());
        self
    }

    pub fn export_mode(mut self, mode: ExportMode) -> Self {
        self.export_mode = mode;
        self
    }

    pub fn skip_if_exists(mut self, skip: bool) -> Self {
        self.skip_if_exists = skip;
        self
    }

    pub fn cleanup_video_after_audio(mut self, cleanup: bool) -> Self {
        self.cleanup_video_after_audio = cleanup;
        self
    }

    /// Validates the settings and creates both export directories if missing.
    pub fn build(self) -> Result<PipelineConfig, ConfigError> {
        if self.cleanup_video_after_audio && !self.export_mode.includes_audio() {
            return Err(ConfigError::CleanupWithoutAudio {
                mode: self.export_mode,
            });
        }
        let audio_dir = ensure_dir(self.audio_dir, DirectoryKind::Audio)?;
        let video_dir = ensure_dir(self.video_dir, DirectoryKind::Video)?;
        Ok(PipelineConfig {
            video_dir,
            audio_dir,
            export_mode: self.export_mode,
            skip_if_exists: self.skip_if_exists,
            cleanup_video_after_audio: self.cleanup_video_after_audio,
        })
    }
}

fn ensure_dir(dir: Option<PathBuf>, kind: DirectoryKind) -> Result<PathBuf, ConfigError> {
    let dir = match dir {
        Some(d) if !d.as_os_str().is_empty() => d,
        _ => return Err(ConfigError::MissingDirectory { kind }),
    };
    fs::create_dir_all(&dir).map_err(|source| ConfigError::CreateDirectory {
        kind,
        path: dir.clone(),
        source,
    })?;
    tracing::debug!(%kind, path = %dir.display(), "export directory ready");
    Ok(dir)
}
