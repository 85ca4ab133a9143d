//! Per-job outcomes and the aggregated report of a run.

use crate::fetcher::FetchError;
use crate::job::{JobId, RenditionType};
use crate::resolver::ResolveError;
use crate::transcoder::TranscodeError;
use std::fmt;
use std::path::PathBuf;

/// Outcome of one successful or skipped job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobResult {
    pub id: JobId,
    /// Where the video was (or would have been) saved.
    pub video_path: PathBuf,
    /// Set iff audio export was requested and the job was not skipped.
    pub audio_path: Option<PathBuf>,
    pub base_name: String,
    /// The video already existed and the skip policy is on; nothing was fetched.
    pub skipped: bool,
    /// The video was deleted after audio extraction; `video_path` is the path it had.
    pub video_removed: bool,
}

/// Why one job failed. Never aborts sibling jobs.
#[derive(Debug, thiserror::Error)]
pub enum JobError {
    #[error("could not list renditions: {0}")]
    Resolution(#[source] ResolveError),
    #[error("no rendition of type {requested} available")]
    NoMatchingRendition { requested: RenditionType },
    #[error("rendition decryption failed: {0}")]
    DecryptionFailed(#[source] ResolveError),
    #[error("transfer failed: {0}")]
    Transfer(#[source] FetchError),
    #[error("audio conversion failed: {0}")]
    Conversion(#[source] TranscodeError),
    /// Deleting the intermediate video failed; the audio was already produced.
    #[error("could not remove {path}: {source}", path = .result.video_path.display())]
    Cleanup {
        result: Box<JobResult>,
        #[source]
        source: std::io::Error,
    },
    #[error("cancelled")]
    Cancelled,
    #[error("job task panicked: {0}")]
    Panicked(String),
}

impl JobError {
    /// Result already produced before the failure (only for cleanup failures).
    pub fn partial_result(&self) -> Option<&JobResult> {
        match self {
            JobError::Cleanup { result, .. } => Some(result),
            _ => None,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, JobError::Cancelled)
    }
}

/// A failed job and its identity.
#[derive(Debug)]
pub struct JobFailure {
    pub id: JobId,
    pub error: JobError,
}

/// Everything a run produced: results (succeeded or skipped) and failures,
/// each in submission order.
#[derive(Debug, Default)]
pub struct RunReport {
    pub results: Vec<JobResult>,
    pub failures: Vec<JobFailure>,
}

impl RunReport {
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn total(&self) -> usize {
        self.results.len() + self.failures.len()
    }

    pub fn skipped(&self) -> impl Iterator<Item = &JobResult> {
        self.results.iter().filter(|r| r.skipped)
    }

    pub fn completed(&self) -> impl Iterator<Item = &JobResult> {
        self.results.iter().filter(|r| !r.skipped)
    }

    pub fn result_for(&self, id: JobId) -> Option<&JobResult> {
        self.results.iter().find(|r| r.id == id)
    }

    pub fn failure_for(&self, id: JobId) -> Option<&JobFailure> {
        self.failures.iter().find(|f| f.id == id)
    }

    /// `Ok(results)` when no job failed, else the whole report as [`RunFailed`].
    pub fn into_result(self) -> Result<Vec<JobResult>, RunFailed> {
        if self.failures.is_empty() {
            Ok(self.results)
        } else {
            Err(RunFailed {
                results: self.results,
                failures: self.failures,
            })
        }
    }
}

/// Composite failure: every failed job with its error, plus the results of
/// the jobs that did not fail.
#[derive(Debug)]
pub struct RunFailed {
    pub results: Vec<JobResult>,
    pub failures: Vec<JobFailure>,
}

impl fmt::Display for RunFailed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} of {} job(s) failed",
            self.failures.len(),
            self.failures.len() + self.results.len()
        )?;
        for failure in &self.failures {
            write!(f, "; {}: {}", failure.id, failure.error)?;
        }
        Ok(())
    }
}

impl std::error::Error for RunFailed {}
