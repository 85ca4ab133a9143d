//! Filename sanitization for the video/audio export directories.

/// Characters stripped from base names (unsafe on Windows and/or Linux filesystems).
pub const UNSAFE_CHARS: [char; 9] = ['\\', '/', '"', '*', ':', '?', '<', '>', '|'];

/// Removes every character in [`UNSAFE_CHARS`] from `name`.
///
/// Characters are dropped, not replaced; everything else keeps its order.
/// No trimming or truncation is applied.
pub fn sanitize_file_name(name: &str) -> String {
    name.chars().filter(|c| !UNSAFE_CHARS.contains(c)).collect()
}
