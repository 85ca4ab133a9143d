//! Fetcher interface: moves a rendition's bytes to a destination path.
//!
//! One fetcher instance is owned by exactly one job. Transport mechanics
//! (retry, resume, chunking) belong to the implementation.

mod curl;

pub use self::curl::{temp_path, CurlFetcher, FetchOptions};

use crate::resolver::Rendition;
use std::ops::ControlFlow;
use std::path::{Path, PathBuf};

/// Receives transfer notifications from a running fetch.
pub trait FetchObserver {
    fn on_started(&mut self);

    /// Called with the completion percentage in `[0, 100]`. Returning
    /// `ControlFlow::Break` asks the fetcher to stop as soon as possible.
    fn on_progress(&mut self, percent: f64) -> ControlFlow<()>;

    fn on_finished(&mut self);

    /// Polled on every transport tick, including ticks with no new
    /// percentage (unknown length or stalled transfer).
    fn stop_requested(&mut self) -> bool {
        false
    }
}

/// Errors from a fetch.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("fetch was not initialized with a rendition and destination")]
    NotInitialized,
    #[error("curl: {0}")]
    Curl(#[from] ::curl::Error),
    #[error("GET {url} returned HTTP {code}")]
    Http { url: String, code: u32 },
    #[error("{path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("transfer stopped by progress listener")]
    Aborted,
}

/// Capability consumed by the pipeline, one instance per job.
pub trait Fetcher: Send {
    /// Prepares a transfer of `rendition` to `dest`.
    fn init(&mut self, rendition: &Rendition, dest: &Path);

    /// Runs the prepared transfer to completion (blocking).
    fn execute(&mut self, observer: &mut dyn FetchObserver) -> Result<(), FetchError>;
}
