//! Log setup for the `vdl` binary: an append-only file under the XDG state
//! dir, with stderr as the fallback when that file cannot be opened.

use anyhow::{Context, Result};
use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;

/// Filter used when `RUST_LOG` is unset or does not parse.
pub const DEFAULT_FILTER: &str = "info,vdl=debug,vdl_core=debug";

const LOG_FILE_NAME: &str = "vdl.log";

/// `$XDG_STATE_HOME/vdl/vdl.log`.
pub fn log_file_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("vdl")?;
    Ok(xdg_dirs.get_state_home().join(LOG_FILE_NAME))
}

/// Opens `path` for appending, creating its parent directory.
fn open_log_file(path: &Path) -> Result<File> {
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir).with_context(|| format!("create {}", dir.display()))?;
    }
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("open {}", path.display()))
}

fn filter_from(directives: Option<&str>) -> EnvFilter {
    directives
        .and_then(|d| EnvFilter::try_new(d).ok())
        .unwrap_or_else(|| EnvFilter::new(DEFAULT_FILTER))
}

fn env_filter() -> EnvFilter {
    let from_env = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    filter_from(from_env.as_deref())
}

/// Installs the global subscriber writing to [`log_file_path`] and returns
/// that path. Errors leave no subscriber installed, so the caller can fall
/// back to [`init_logging_stderr`].
pub fn init_logging() -> Result<PathBuf> {
    let path = log_file_path()?;
    let file = open_log_file(&path)?;

    tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .try_init()
        .map_err(|e| anyhow::anyhow!("install log subscriber: {}", e))?;

    tracing::info!(path = %path.display(), "logging to file");
    Ok(path)
}

/// Stderr-only subscriber. A second install attempt is ignored.
pub fn init_logging_stderr() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .try_init();
}
