//! Streaming archive download.
//!
//! [`Fetcher`] writes a remote body to disk chunk by chunk and reports
//! progress to a [`ProgressObserver`]. Progress is delivered synchronously from
//! the download loop, so observers must return quickly.
//!
//! A failed download leaves whatever was written in place. The next run's
//! sync decision sees a size mismatch and fetches again; nothing resumes.

pub mod verification;

pub use verification::ChecksumVerifier;

use futures::StreamExt;
use serde::Serialize;
use std::path::Path;
use std::time::{Duration, Instant};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};
use url::Url;

use crate::core::{UpdaterError, UpdaterResult};
use crate::http::HttpBackend;

/// A download progress notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ProgressEvent {
    /// Bytes written so far.
    pub downloaded: u64,
    /// Total size when the server reported one.
    pub total: Option<u64>,
    /// Whole percentage (0-100), present only when `total` is known.
    pub percent: Option<u8>,
}

/// Receives download progress.
pub trait ProgressObserver: Send + Sync {
    fn on_progress(&self, event: ProgressEvent);
}

/// Observer that ignores every event.
pub struct NoopObserver;

impl ProgressObserver for NoopObserver {
    fn on_progress(&self, _event: ProgressEvent) {}
}

/// Result of a completed download.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchReport {
    pub bytes_written: u64,
    pub elapsed: Duration,
}

/// Emits progress events, suppressing repeats of the same percentage.
struct ProgressTracker {
    total: Option<u64>,
    downloaded: u64,
    last_percent: Option<u8>,
}

impl ProgressTracker {
    const fn new(total: Option<u64>) -> Self {
        Self {
            total,
            downloaded: 0,
            last_percent: None,
        }
    }

    /// Account for `len` new bytes and return the event to emit, if any.
    fn advance(&mut self, len: u64) -> Option<ProgressEvent> {
        self.downloaded += len;

        let percent = match self.total {
            Some(0) => Some(100),
            Some(total) => Some((self.downloaded.min(total) * 100 / total) as u8),
            None => None,
        };

        if percent.is_some() {
            if percent <= self.last_percent {
                return None;
            }
            self.last_percent = percent;
        }

        Some(ProgressEvent {
            downloaded: self.downloaded,
            total: self.total,
            percent,
        })
    }
}

/// Downloads resources through an [`HttpBackend`].
pub struct Fetcher<'a> {
    backend: &'a dyn HttpBackend,
}

impl<'a> Fetcher<'a> {
    pub fn new(backend: &'a dyn HttpBackend) -> Self {
        Self {
            backend,
        }
    }

    /// Stream `url` into `destination`, truncating any existing file.
    ///
    /// Transport failures (connection, status, or a broken stream) are
    /// [`UpdaterError::TransportError`]. Failures creating or writing the file
    /// are [`UpdaterError::FileSystemError`].
    pub async fn fetch<O>(&self, url: &Url, destination: &Path, observer: &O) -> UpdaterResult<FetchReport>
    where
        O: ProgressObserver + ?Sized,
    {
        let start = Instant::now();
        info!("Downloading {} to {}", url, destination.display());

        let transport = |reason: String| UpdaterError::TransportError {
            url: url.to_string(),
            reason,
        };

        let mut stream = self.backend.get_stream(url).await.map_err(|e| transport(e.to_string()))?;

        if let Some(parent) = destination.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| UpdaterError::fs("create directory", parent, &e))?;
        }

        let mut file = fs::File::create(destination)
            .await
            .map_err(|e| UpdaterError::fs("create file", destination, &e))?;

        let mut tracker = ProgressTracker::new(stream.total);
        while let Some(chunk) = stream.body.next().await {
            let chunk = match chunk {
                Ok(chunk) => chunk,
                Err(e) => {
                    // Keep the partial bytes on disk
                    let _ = file.flush().await;
                    return Err(transport(e.to_string()));
                }
            };
            file.write_all(&chunk).await.map_err(|e| UpdaterError::fs("write", destination, &e))?;

            if let Some(event) = tracker.advance(chunk.len() as u64) {
                observer.on_progress(event);
            }
        }

        file.flush().await.map_err(|e| UpdaterError::fs("flush", destination, &e))?;

        if let Some(total) = stream.total {
            if tracker.downloaded != total {
                return Err(transport(format!(
                    "expected {total} bytes but received {}",
                    tracker.downloaded
                )));
            }
        }

        let elapsed = start.elapsed();
        debug!("Downloaded {} bytes in {:?}", tracker.downloaded, elapsed);

        Ok(FetchReport {
            bytes_written: tracker.downloaded,
            elapsed,
        })
    }
}
