//! Transcoder interface: extracts the audio track of a fetched video.
//!
//! One transcoder instance is owned by exactly one job and is released
//! (dropped) as soon as its conversion returns.

mod ffmpeg;

pub use ffmpeg::{build_ffmpeg_command, parse_progress_line, FfmpegTranscoder, ProgressLine};

use std::path::Path;
use std::time::Duration;

/// Snapshot of a running conversion.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ConvertProgress {
    /// Media time encoded so far.
    pub processed: Duration,
    /// Encoding speed relative to realtime, when reported.
    pub speed: Option<f64>,
}

/// Receives conversion notifications.
pub trait ConvertObserver {
    fn on_progress(&mut self, progress: &ConvertProgress);
    fn on_complete(&mut self, progress: &ConvertProgress);
}

/// Errors from a conversion.
#[derive(Debug, thiserror::Error)]
pub enum TranscodeError {
    #[error("could not start {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },
    #[error("transcoder exited with code {code}: {stderr}")]
    Failed { code: i32, stderr: String },
    #[error("transcoder was terminated by signal")]
    Terminated,
    #[error("transcoder I/O: {0}")]
    Io(#[from] std::io::Error),
}

/// Capability consumed by the pipeline, one instance per job.
pub trait Transcoder: Send {
    /// Converts `input` to audio at `output` (blocking).
    fn convert(
        &mut self,
        input: &Path,
        output: &Path,
        observer: &mut dyn ConvertObserver,
    ) -> Result<(), TranscodeError>;
}
