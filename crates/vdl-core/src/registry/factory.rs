//! Allocation of per-job fetchers and transcoders.

use crate::fetcher::{CurlFetcher, FetchOptions, Fetcher};
use crate::transcoder::{FfmpegTranscoder, Transcoder};
use std::path::PathBuf;

/// Creates a fresh, unshared fetcher and transcoder for every registered job.
pub trait CollaboratorFactory: Send + Sync {
    fn new_fetcher(&self) -> Box<dyn Fetcher>;
    fn new_transcoder(&self) -> Box<dyn Transcoder>;
}

/// libcurl fetcher + ffmpeg transcoder.
#[derive(Debug, Clone)]
pub struct DefaultCollaborators {
    pub fetch: FetchOptions,
    pub ffmpeg: PathBuf,
}

impl Default for DefaultCollaborators {
    fn default() -> Self {
        Self {
            fetch: FetchOptions::default(),
            ffmpeg: PathBuf::from("ffmpeg"),
        }
    }
}

impl CollaboratorFactory for DefaultCollaborators {
    fn new_fetcher(&self) -> Box<dyn Fetcher> {
        Box::new(CurlFetcher::new(self.fetch))
    }

    fn new_transcoder(&self) -> Box<dyn Transcoder> {
        Box::new(FfmpegTranscoder::new(self.ffmpeg.clone()))
    }
}
