//! Single-stream HTTP GET fetcher on libcurl.
//!
//! Writes the body sequentially to `<dest>.part` and renames it to `dest`
//! once the transfer completed with a 2xx status.

use super::{FetchError, FetchObserver, Fetcher};
use crate::resolver::Rendition;
use std::fs::{self, File};
use std::io::Write;
use std::ops::ControlFlow;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Temporary file suffix used before atomic rename.
pub const TEMP_SUFFIX: &str = ".part";

/// Path for the temp file: appends `.part` to the final path (e.g. `clip.mp4` → `clip.mp4.part`).
pub fn temp_path(final_path: &Path) -> PathBuf {
    let mut o = final_path.as_os_str().to_owned();
    o.push(TEMP_SUFFIX);
    PathBuf::from(o)
}

/// Transport timeouts for [`CurlFetcher`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchOptions {
    pub connect_timeout: Duration,
    /// Abort when the rate stays below this many bytes/s for `low_speed_time`.
    pub low_speed_limit: u32,
    pub low_speed_time: Duration,
    pub timeout: Duration,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(30),
            low_speed_limit: 1024,
            low_speed_time: Duration::from_secs(60),
            timeout: Duration::from_secs(3600),
        }
    }
}

#[derive(Debug, Clone)]
struct Target {
    url: String,
    dest: PathBuf,
}

/// libcurl-backed [`Fetcher`].
#[derive(Debug, Default)]
pub struct CurlFetcher {
    opts: FetchOptions,
    target: Option<Target>,
}

impl CurlFetcher {
    pub fn new(opts: FetchOptions) -> Self {
        Self { opts, target: None }
    }
}

impl Fetcher for CurlFetcher {
    fn init(&mut self, rendition: &Rendition, dest: &Path) {
        self.target = Some(Target {
            url: rendition.url.clone(),
            dest: dest.to_path_buf(),
        });
    }

    fn execute(&mut self, observer: &mut dyn FetchObserver) -> Result<(), FetchError> {
        let target = self.target.clone().ok_or(FetchError::NotInitialized)?;
        let part = temp_path(&target.dest);
        let result = download_to(&target.url, &part, self.opts, observer);
        match result {
            Ok(()) => {
                fs::rename(&part, &target.dest).map_err(|source| FetchError::Io {
                    path: target.dest.clone(),
                    source,
                })?;
                observer.on_finished();
                Ok(())
            }
            Err(e) => {
                if part.exists() {
                    if let Err(rm) = fs::remove_file(&part) {
                        tracing::warn!(path = %part.display(), "could not remove partial file: {}", rm);
                    }
                }
                Err(e)
            }
        }
    }
}

fn download_to(
    url: &str,
    part: &Path,
    opts: FetchOptions,
    observer: &mut dyn FetchObserver,
) -> Result<(), FetchError> {
    let mut file = File::create(part).map_err(|source| FetchError::Io {
        path: part.to_path_buf(),
        source,
    })?;

    let mut easy = ::curl::easy::Easy::new();
    easy.url(url)?;
    easy.follow_location(true)?;
    easy.max_redirections(10)?;
    easy.connect_timeout(opts.connect_timeout)?;
    easy.low_speed_limit(opts.low_speed_limit)?;
    easy.low_speed_time(opts.low_speed_time)?;
    easy.timeout(opts.timeout)?;
    easy.progress(true)?;

    observer.on_started();

    let mut stopped = false;
    let mut write_error: Option<std::io::Error> = None;
    let mut last_percent = -1.0_f64;
    let performed = {
        let mut transfer = easy.transfer();
        transfer.write_function(|data| match file.write_all(data) {
            Ok(()) => Ok(data.len()),
            Err(e) => {
                write_error = Some(e);
                Ok(0) // abort transfer
            }
        })?;
        transfer.progress_function(|dltotal, dlnow, _, _| {
            if observer.stop_requested() {
                stopped = true;
                return false;
            }
            if dltotal <= 0.0 {
                return true;
            }
            let percent = (dlnow / dltotal * 100.0).clamp(0.0, 100.0);
            if percent <= last_percent {
                return true;
            }
            last_percent = percent;
            match observer.on_progress(percent) {
                ControlFlow::Continue(()) => true,
                ControlFlow::Break(()) => {
                    stopped = true;
                    false
                }
            }
        })?;
        transfer.perform()
    };

    if stopped {
        return Err(FetchError::Aborted);
    }
    if let Some(source) = write_error {
        return Err(FetchError::Io {
            path: part.to_path_buf(),
            source,
        });
    }
    performed?;

    let code = easy.response_code()?;
    if !(200..300).contains(&code) {
        return Err(FetchError::Http {
            url: url.to_string(),
            code,
        });
    }

    file.sync_all().map_err(|source| FetchError::Io {
        path: part.to_path_buf(),
        source,
    })?;
    Ok(())
}
