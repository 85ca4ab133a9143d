//! `vdl config` – show where the config lives and what it resolves to.

use anyhow::{Context, Result};
use vdl_core::config::{self, VdlConfig};

pub fn run_show_config(cfg: &VdlConfig) -> Result<()> {
    let path = config::config_path()?;
    let rendered = toml::to_string_pretty(cfg).context("serialize config")?;
    println!("# {}", path.display());
    print!("{}", rendered);
    Ok(())
}
