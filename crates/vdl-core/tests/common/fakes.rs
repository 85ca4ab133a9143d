//! In-process resolver, fetcher and transcoder fakes.
//!
//! The fake fetcher's behavior is driven by the rendition URL:
//! - `.../broken/...` fails with HTTP 404
//! - `.../dir/...` creates a directory at the destination (cleanup then fails)
//! - `.../slow/...` reports progress every 20ms until told to stop (max ~5s)
//! - `?delay_ms=N` sleeps N ms before writing
//! - anything else writes the URL bytes to the destination
//!
//! The fake transcoder copies input to output and fails for inputs whose
//! name contains `badaudio`.

use std::collections::HashMap;
use std::fs;
use std::ops::ControlFlow;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use vdl_core::fetcher::{FetchError, FetchObserver, Fetcher};
use vdl_core::registry::CollaboratorFactory;
use vdl_core::resolver::{Rendition, ResolveError, Resolver};
use vdl_core::transcoder::{ConvertObserver, ConvertProgress, TranscodeError, Transcoder};
use vdl_core::RenditionType;

pub fn rendition(title: &str, ext: &str, bitrate: u32, ty: RenditionType) -> Rendition {
    Rendition {
        title: title.to_string(),
        file_extension: ext.to_string(),
        audio_bitrate: bitrate,
        rendition_type: ty,
        requires_decryption: false,
        url: format!("https://cdn.test/{}{}", title, ext),
    }
}

/// Returns scripted renditions per URL; unknown URLs resolve to one mp4
/// rendition titled after the last path segment.
#[derive(Default)]
pub struct ScriptedResolver {
    scripted: HashMap<String, Vec<Rendition>>,
    fail_lookup: Vec<String>,
    fail_decrypt: bool,
    pub decrypt_calls: Arc<AtomicUsize>,
}

impl ScriptedResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, url: &str, renditions: Vec<Rendition>) -> Self {
        self.scripted.insert(url.to_string(), renditions);
        self
    }

    pub fn failing_lookup(mut self, url: &str) -> Self {
        self.fail_lookup.push(url.to_string());
        self
    }

    pub fn failing_decrypt(mut self) -> Self {
        self.fail_decrypt = true;
        self
    }
}

fn title_from_url(url: &str) -> String {
    let path = url.split('?').next().unwrap_or(url);
    path.rsplit('/').next().unwrap_or("untitled").to_string()
}

impl Resolver for ScriptedResolver {
    fn list_renditions(&self, url: &str) -> Result<Vec<Rendition>, ResolveError> {
        if self.fail_lookup.iter().any(|u| u == url) {
            return Err(ResolveError::Lookup(format!("no such video: {}", url)));
        }
        if let Some(list) = self.scripted.get(url) {
            return Ok(list.clone());
        }
        Ok(vec![Rendition {
            title: title_from_url(url),
            file_extension: ".mp4".to_string(),
            audio_bitrate: 128,
            rendition_type: RenditionType::Mp4,
            requires_decryption: false,
            url: url.to_string(),
        }])
    }

    fn decrypt(&self, mut rendition: Rendition) -> Result<Rendition, ResolveError> {
        self.decrypt_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_decrypt {
            return Err(ResolveError::Decrypt("signature rejected".to_string()));
        }
        rendition.requires_decryption = false;
        rendition.url.push_str("?signature=ok");
        Ok(rendition)
    }
}

/// Call counters and an ordered event log shared by all fakes of a factory.
#[derive(Default)]
pub struct Calls {
    pub fetchers_created: AtomicUsize,
    pub transcoders_created: AtomicUsize,
    pub fetches: AtomicUsize,
    pub converts: AtomicUsize,
    pub events: Mutex<Vec<String>>,
}

impl Calls {
    pub fn record(&self, event: impl Into<String>) {
        self.events.lock().unwrap().push(event.into());
    }

    pub fn events(&self) -> Vec<String> {
        self.events.lock().unwrap().clone()
    }

    pub fn fetches(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    pub fn converts(&self) -> usize {
        self.converts.load(Ordering::SeqCst)
    }
}

#[derive(Clone, Default)]
pub struct FakeFactory {
    pub calls: Arc<Calls>,
}

impl FakeFactory {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CollaboratorFactory for FakeFactory {
    fn new_fetcher(&self) -> Box<dyn Fetcher> {
        self.calls.fetchers_created.fetch_add(1, Ordering::SeqCst);
        Box::new(FakeFetcher {
            calls: Arc::clone(&self.calls),
            target: None,
        })
    }

    fn new_transcoder(&self) -> Box<dyn Transcoder> {
        self.calls.transcoders_created.fetch_add(1, Ordering::SeqCst);
        Box::new(FakeTranscoder {
            calls: Arc::clone(&self.calls),
        })
    }
}

pub struct FakeFetcher {
    calls: Arc<Calls>,
    target: Option<(String, PathBuf)>,
}

fn delay_from_url(url: &str) -> Option<Duration> {
    let query = url.split_once('?')?.1;
    query
        .split('&')
        .find_map(|kv| kv.strip_prefix("delay_ms="))
        .and_then(|v| v.parse().ok())
        .map(Duration::from_millis)
}

impl Fetcher for FakeFetcher {
    fn init(&mut self, rendition: &Rendition, dest: &Path) {
        self.target = Some((rendition.url.clone(), dest.to_path_buf()));
    }

    fn execute(&mut self, observer: &mut dyn FetchObserver) -> Result<(), FetchError> {
        let (url, dest) = self.target.clone().ok_or(FetchError::NotInitialized)?;
        self.calls.fetches.fetch_add(1, Ordering::SeqCst);
        self.calls.record(format!("fetch:{}", dest.display()));
        observer.on_started();

        if url.contains("/broken/") {
            return Err(FetchError::Http { url, code: 404 });
        }

        if url.contains("/slow/") {
            for step in 0..250 {
                let percent = (step as f64 / 250.0) * 100.0;
                if observer.on_progress(percent).is_break() {
                    return Err(FetchError::Aborted);
                }
                thread::sleep(Duration::from_millis(20));
            }
        } else {
            for percent in [25.0, 50.0, 75.0, 100.0] {
                if observer.on_progress(percent).is_break() {
                    return Err(FetchError::Aborted);
                }
            }
        }

        if let Some(delay) = delay_from_url(&url) {
            thread::sleep(delay);
        }

        let io = |source| FetchError::Io {
            path: dest.clone(),
            source,
        };
        if url.contains("/dir/") {
            fs::create_dir_all(&dest).map_err(io)?;
        } else {
            fs::write(&dest, url.as_bytes()).map_err(io)?;
        }
        observer.on_finished();
        Ok(())
    }
}

pub struct FakeTranscoder {
    calls: Arc<Calls>,
}

impl Transcoder for FakeTranscoder {
    fn convert(
        &mut self,
        input: &Path,
        output: &Path,
        observer: &mut dyn ConvertObserver,
    ) -> Result<(), TranscodeError> {
        self.calls.converts.fetch_add(1, Ordering::SeqCst);
        self.calls.record(format!("convert:{}", output.display()));
        if input.to_string_lossy().contains("badaudio") {
            return Err(TranscodeError::Failed {
                code: 1,
                stderr: "Invalid data found when processing input".to_string(),
            });
        }
        let progress = ConvertProgress {
            processed: Duration::from_secs(1),
            speed: Some(1.0),
        };
        observer.on_progress(&progress);
        if input.is_dir() {
            fs::write(output, b"audio")?;
        } else {
            fs::copy(input, output)?;
        }
        observer.on_complete(&progress);
        Ok(())
    }
}

/// Observer that records nothing and never stops.
pub struct NoopObserver;

impl FetchObserver for NoopObserver {
    fn on_started(&mut self) {}
    fn on_progress(&mut self, _percent: f64) -> ControlFlow<()> {
        ControlFlow::Continue(())
    }
    fn on_finished(&mut self) {}
}
