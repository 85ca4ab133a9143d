//! `vdl batch` – run a TOML list of jobs.
//!
//! ```toml
//! [[job]]
//! url = "https://example.com/watch/1"
//! name = "intro"
//! type = "webm"
//! ```

use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::Path;
use vdl_core::config::VdlConfig;
use vdl_core::{JobDescriptor, RenditionType};

use super::run::run_jobs;

#[derive(Debug, Deserialize)]
struct BatchFile {
    #[serde(default, rename = "job")]
    jobs: Vec<BatchEntry>,
}

#[derive(Debug, Deserialize)]
struct BatchEntry {
    url: String,
    name: Option<String>,
    #[serde(rename = "type")]
    rendition_type: Option<RenditionType>,
}

pub async fn run_batch(
    cfg: &VdlConfig,
    file: &Path,
    default_type: Option<RenditionType>,
) -> Result<()> {
    let text = fs::read_to_string(file).with_context(|| format!("read {}", file.display()))?;
    let jobs = parse_batch(&text, default_type)
        .with_context(|| format!("parse batch file {}", file.display()))?;
    run_jobs(cfg, jobs).await
}

/// Per-entry `type` wins over the `--type` flag.
fn parse_batch(text: &str, default_type: Option<RenditionType>) -> Result<Vec<JobDescriptor>> {
    let batch: BatchFile = toml::from_str(text)?;
    Ok(batch
        .jobs
        .into_iter()
        .map(|entry| {
            let rendition_type = entry
                .rendition_type
                .or(default_type)
                .unwrap_or_default();
            let job = JobDescriptor::new(entry.url).with_rendition_type(rendition_type);
            match entry.name {
                Some(name) => job.with_output_base_name(name),
                None => job,
            }
        })
        .collect())
}
