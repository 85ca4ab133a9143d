//! Video and audio destination paths.

use std::path::{Path, PathBuf};

/// Extension of extracted audio files.
pub const AUDIO_EXTENSION: &str = ".mp3";

/// `video_dir/base_name + extension` (extension includes its leading dot).
pub fn video_path(video_dir: &Path, base_name: &str, extension: &str) -> PathBuf {
    video_dir.join(format!("{}{}", base_name, extension))
}

/// Replaces the last occurrence of `pattern` in `source` with `replacement`.
/// Returns `source` unchanged if `pattern` is empty or absent.
pub fn replace_last_occurrence(source: &str, pattern: &str, replacement: &str) -> String {
    if pattern.is_empty() {
        return source.to_string();
    }
    match source.rfind(pattern) {
        Some(at) => {
            let mut out = String::with_capacity(source.len() + replacement.len());
            out.push_str(&source[..at]);
            out.push_str(replacement);
            out.push_str(&source[at + pattern.len()..]);
            out
        }
        None => source.to_string(),
    }
}

/// Derives the audio path for `video_path`: the `video_dir` prefix becomes
/// `audio_dir` and the last occurrence of `video_extension` becomes `.mp3`.
///
/// Only the file name is rewritten, so directory names containing the
/// extension are left alone. A file name without `video_extension` gets `.mp3`
/// appended. A path outside `video_dir` keeps its own parent.
pub fn derive_audio_path(
    video_path: &Path,
    video_dir: &Path,
    audio_dir: &Path,
    video_extension: &str,
) -> PathBuf {
    let relocated = match video_path.strip_prefix(video_dir) {
        Ok(rest) => audio_dir.join(rest),
        Err(_) => video_path.to_path_buf(),
    };
    let file_name = match relocated.file_name() {
        Some(name) => name.to_string_lossy().into_owned(),
        None => return relocated,
    };
    let audio_name = if !video_extension.is_empty() && file_name.contains(video_extension) {
        replace_last_occurrence(&file_name, video_extension, AUDIO_EXTENSION)
    } else {
        format!("{}{}", file_name, AUDIO_EXTENSION)
    };
    relocated.with_file_name(audio_name)
}
