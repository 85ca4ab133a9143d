pub mod config;
pub mod logging;

pub mod control;
pub mod fetcher;
pub mod job;
pub mod naming;
pub mod pipeline;
pub mod registry;
pub mod resolver;
pub mod transcoder;

pub use job::{JobDescriptor, JobId, RenditionType};
pub use pipeline::{
    Downloader, DownloaderBuilder, ExportMode, JobError, JobFailure, JobResult, PipelineConfig,
    PipelineConfigBuilder, RunFailed, RunReport,
};
