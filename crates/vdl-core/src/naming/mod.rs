//! Output naming: safe base names and the video/audio path pair for a job.
//!
//! The base name is the caller-supplied name or the rendition title with
//! filesystem-unsafe characters removed. The audio path mirrors the video
//! path under the audio directory with an `.mp3` extension.

mod path;
mod sanitize;

pub use path::{derive_audio_path, replace_last_occurrence, video_path, AUDIO_EXTENSION};
pub use sanitize::{sanitize_file_name, UNSAFE_CHARS};

/// Base name used for a job's files: `output_base_name` when given, else the title.
pub fn base_name(output_base_name: Option<&str>, title: &str) -> String {
    sanitize_file_name(output_base_name.unwrap_or(title))
}
