//! Concurrent download-and-convert pipeline.
//!
//! Coordinates jobs end to end: resolve → skip check → fetch → transcode →
//! cleanup, one blocking task per job, all jobs in flight at once. Fan-in
//! collects every outcome so partial failures are reported next to the
//! successful results.

mod builder;
mod config;
mod coordinator;
mod report;
mod step;

pub use builder::{BuildError, Downloader, DownloaderBuilder};
pub use config::{ConfigError, DirectoryKind, ExportMode, PipelineConfig, PipelineConfigBuilder};
pub use coordinator::Coordinator;
pub use report::{JobError, JobFailure, JobResult, RunFailed, RunReport};
