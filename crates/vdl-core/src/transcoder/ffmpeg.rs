//! ffmpeg-backed transcoder: MP3 extraction with machine-readable progress.

use super::{ConvertObserver, ConvertProgress, TranscodeError, Transcoder};
use std::io::{BufRead, BufReader, Read};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::time::Duration;

/// Longest stderr tail kept for error messages.
const STDERR_TAIL: usize = 2048;

/// One parsed `-progress` key/value line.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ProgressLine {
    OutTime(Duration),
    Speed(f64),
    /// `progress=continue` (false) or `progress=end` (true).
    Progress { end: bool },
}

/// Parses a line of ffmpeg `-progress` output. Unknown keys and
/// unparseable values (e.g. `out_time_us=N/A`) yield `None`.
pub fn parse_progress_line(line: &str) -> Option<ProgressLine> {
    let (key, value) = line.trim().split_once('=')?;
    match key {
        "out_time_us" | "out_time_ms" => {
            let us: i64 = value.parse().ok()?;
            Some(ProgressLine::OutTime(Duration::from_micros(us.max(0) as u64)))
        }
        "speed" => {
            let v: f64 = value.trim().trim_end_matches('x').parse().ok()?;
            Some(ProgressLine::Speed(v))
        }
        "progress" => Some(ProgressLine::Progress {
            end: value == "end",
        }),
        _ => None,
    }
}

/// Builds the ffmpeg invocation: drop video, encode audio as VBR MP3,
/// overwrite the output, progress on stdout.
pub fn build_ffmpeg_command(program: &Path, input: &Path, output: &Path) -> Command {
    let mut cmd = Command::new(program);
    cmd.arg("-hide_banner")
        .arg("-loglevel")
        .arg("error")
        .arg("-nostats")
        .arg("-y")
        .arg("-i")
        .arg(input)
        .arg("-vn")
        .arg("-codec:a")
        .arg("libmp3lame")
        .arg("-q:a")
        .arg("2")
        .arg("-progress")
        .arg("pipe:1")
        .arg(output);
    cmd
}

/// Runs `ffmpeg` as a child process per conversion.
#[derive(Debug, Clone)]
pub struct FfmpegTranscoder {
    program: PathBuf,
}

impl FfmpegTranscoder {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl Default for FfmpegTranscoder {
    fn default() -> Self {
        Self::new("ffmpeg")
    }
}

impl Transcoder for FfmpegTranscoder {
    fn convert(
        &mut self,
        input: &Path,
        output: &Path,
        observer: &mut dyn ConvertObserver,
    ) -> Result<(), TranscodeError> {
        let mut child = build_ffmpeg_command(&self.program, input, output)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| TranscodeError::Spawn {
                program: self.program.display().to_string(),
                source,
            })?;

        // Drain stderr on its own thread so a chatty ffmpeg cannot block on a full pipe.
        let stderr_handle = child.stderr.take().map(|mut stderr| {
            std::thread::spawn(move || {
                let mut buf = String::new();
                let _ = stderr.read_to_string(&mut buf);
                buf
            })
        });

        let mut current = ConvertProgress::default();
        let mut completed = false;
        if let Some(stdout) = child.stdout.take() {
            for line in BufReader::new(stdout).lines() {
                let line = line?;
                match parse_progress_line(&line) {
                    Some(ProgressLine::OutTime(t)) => current.processed = t,
                    Some(ProgressLine::Speed(s)) => current.speed = Some(s),
                    Some(ProgressLine::Progress { end: false }) => observer.on_progress(&current),
                    Some(ProgressLine::Progress { end: true }) => completed = true,
                    None => {}
                }
            }
        }

        let status = child.wait()?;
        let stderr = stderr_handle
            .and_then(|h| h.join().ok())
            .unwrap_or_default();

        if !status.success() {
            return Err(match status.code() {
                Some(code) => TranscodeError::Failed {
                    code,
                    stderr: tail(&stderr, STDERR_TAIL),
                },
                None => TranscodeError::Terminated,
            });
        }
        if !completed {
            tracing::debug!(output = %output.display(), "ffmpeg exited without a final progress block");
        }
        observer.on_complete(&current);
        Ok(())
    }
}

fn tail(s: &str, max: usize) -> String {
    let s = s.trim();
    if s.len() <= max {
        return s.to_string();
    }
    let mut start = s.len() - max;
    while !s.is_char_boundary(start) {
        start += 1;
    }
    s[start..].to_string()
}
