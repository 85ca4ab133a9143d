//! CLI for the VDL bulk video downloader.

mod commands;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use vdl_core::config::{self, VdlConfig};
use vdl_core::{ExportMode, RenditionType};

use commands::{run_batch, run_get, run_show_config};

/// Top-level CLI for VDL.
#[derive(Debug, Parser)]
#[command(name = "vdl")]
#[command(about = "VDL: concurrent bulk video download with optional audio extraction", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Download one or more videos concurrently.
    Get {
        /// Video page or direct media URLs.
        #[arg(required = true, value_name = "URL")]
        urls: Vec<String>,

        /// Output base name (without extension). Only valid with a single URL.
        #[arg(long, value_name = "NAME")]
        name: Option<String>,

        #[command(flatten)]
        flags: RunFlags,
    },

    /// Run every job listed in a TOML batch file (`[[job]]` tables with `url`, `name`, `type`).
    Batch {
        /// Path to the batch file.
        file: PathBuf,

        #[command(flatten)]
        flags: RunFlags,
    },

    /// Print the config file path and the effective configuration.
    Config,
}

/// Settings shared by `get` and `batch`; each one overrides the config file.
#[derive(Debug, Clone, Default, Args)]
pub struct RunFlags {
    /// Rendition type to fetch.
    #[arg(long = "type", value_name = "TYPE")]
    pub rendition_type: Option<RenditionType>,

    /// Directory for saved videos.
    #[arg(long, value_name = "DIR")]
    pub video_dir: Option<PathBuf>,

    /// Directory for extracted audio.
    #[arg(long, value_name = "DIR")]
    pub audio_dir: Option<PathBuf>,

    /// What to keep: video, audio or both.
    #[arg(long, value_name = "MODE")]
    pub export: Option<ExportMode>,

    /// Skip jobs whose video file already exists.
    #[arg(long)]
    pub skip_existing: bool,

    /// Delete the video after audio extraction (with --export both).
    #[arg(long)]
    pub cleanup_video: bool,
}

impl RunFlags {
    /// Applies the flags on top of the file configuration.
    pub fn apply(&self, cfg: &mut VdlConfig) {
        if let Some(dir) = &self.video_dir {
            cfg.video_dir = dir.clone();
        }
        if let Some(dir) = &self.audio_dir {
            cfg.audio_dir = dir.clone();
        }
        if let Some(mode) = self.export {
            cfg.export = mode;
        }
        if self.skip_existing {
            cfg.skip_if_exists = true;
        }
        if self.cleanup_video {
            cfg.cleanup_video_after_audio = true;
        }
    }
}

impl CliCommand {
    pub async fn run_from_args() -> Result<()> {
        let cli = Cli::parse();
        let mut cfg = config::load_or_init()?;
        tracing::debug!("loaded config: {:?}", cfg);

        match cli.command {
            CliCommand::Get { urls, name, flags } => {
                flags.apply(&mut cfg);
                run_get(&cfg, urls, name, flags.rendition_type).await?;
            }
            CliCommand::Batch { file, flags } => {
                flags.apply(&mut cfg);
                run_batch(&cfg, &file, flags.rendition_type).await?;
            }
            CliCommand::Config => run_show_config(&cfg)?,
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests;
