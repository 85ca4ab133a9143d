//! `vdl get` – download the given URLs concurrently.

use anyhow::{bail, Result};
use vdl_core::config::VdlConfig;
use vdl_core::{JobDescriptor, RenditionType};

use super::run::run_jobs;

pub async fn run_get(
    cfg: &VdlConfig,
    urls: Vec<String>,
    name: Option<String>,
    rendition_type: Option<RenditionType>,
) -> Result<()> {
    let jobs = descriptors(urls, name, rendition_type)?;
    run_jobs(cfg, jobs).await
}

fn descriptors(
    urls: Vec<String>,
    name: Option<String>,
    rendition_type: Option<RenditionType>,
) -> Result<Vec<JobDescriptor>> {
    if name.is_some() && urls.len() != 1 {
        bail!("--name can only be used with a single URL ({} given)", urls.len());
    }
    let rendition_type = rendition_type.unwrap_or_default();
    Ok(urls
        .into_iter()
        .map(|url| {
            let job = JobDescriptor::new(url).with_rendition_type(rendition_type);
            match &name {
                Some(n) => job.with_output_base_name(n.clone()),
                None => job,
            }
        })
        .collect())
}
