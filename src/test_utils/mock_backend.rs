//! In-memory HTTP backend for tests.

use async_trait::async_trait;
use bytes::Bytes;
use futures::StreamExt;
use std::collections::HashMap;
use std::sync::Mutex;
use url::Url;

use crate::fetch::{ProgressEvent, ProgressObserver};
use crate::http::{ByteStream, HttpBackend, HttpError};
use crate::pipeline::{Phase, PipelineObserver};

#[derive(Clone)]
enum Route {
    Body {
        bytes: Vec<u8>,
        report_length: bool,
        /// Fail the stream after this many bytes.
        fail_after: Option<usize>,
    },
    Status(u16),
    Network(String),
}

/// A request received by [`MockBackend`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockCall {
    Text(String),
    Head(String),
    Stream(String),
}

/// [`HttpBackend`] that serves canned responses keyed by URL.
///
/// Unknown URLs answer with HTTP 404. Every request is recorded so tests can
/// assert that, for example, no body was fetched for an up-to-date archive.
pub struct MockBackend {
    routes: HashMap<String, Route>,
    chunk_size: usize,
    calls: Mutex<Vec<MockCall>>,
}

impl Default for MockBackend {
    fn default() -> Self {
        Self {
            routes: HashMap::new(),
            chunk_size: 1024,
            calls: Mutex::new(Vec::new()),
        }
    }
}

impl MockBackend {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_text(self, url: &str, body: impl Into<String>) -> Self {
        self.with_bytes(url, body.into().into_bytes())
    }

    /// Serve bytes and report their length on HEAD and GET.
    #[must_use]
    pub fn with_bytes(self, url: &str, bytes: impl Into<Vec<u8>>) -> Self {
        self.route(
            url,
            Route::Body {
                bytes: bytes.into(),
                report_length: true,
                fail_after: None,
            },
        )
    }

    /// Serve bytes without a content length.
    #[must_use]
    pub fn with_unknown_length(self, url: &str, bytes: impl Into<Vec<u8>>) -> Self {
        self.route(
            url,
            Route::Body {
                bytes: bytes.into(),
                report_length: false,
                fail_after: None,
            },
        )
    }

    /// Serve bytes whose stream breaks after `after` bytes.
    #[must_use]
    pub fn with_broken_stream(self, url: &str, bytes: impl Into<Vec<u8>>, after: usize) -> Self {
        self.route(
            url,
            Route::Body {
                bytes: bytes.into(),
                report_length: true,
                fail_after: Some(after),
            },
        )
    }

    #[must_use]
    pub fn with_status(self, url: &str, status: u16) -> Self {
        self.route(url, Route::Status(status))
    }

    #[must_use]
    pub fn with_network_error(self, url: &str, message: impl Into<String>) -> Self {
        self.route(url, Route::Network(message.into()))
    }

    #[must_use]
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }

    /// All requests received so far, in order.
    pub fn calls(&self) -> Vec<MockCall> {
        self.calls.lock().map(|calls| calls.clone()).unwrap_or_default()
    }

    /// Number of body downloads started.
    pub fn stream_count(&self) -> usize {
        self.calls().iter().filter(|c| matches!(c, MockCall::Stream(_))).count()
    }

    fn route(mut self, url: &str, route: Route) -> Self {
        self.routes.insert(url.to_string(), route);
        self
    }

    fn record(&self, call: MockCall) {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(call);
        }
    }

    fn lookup(&self, url: &Url) -> Result<Route, HttpError> {
        match self.routes.get(url.as_str()) {
            Some(Route::Status(status)) => Err(HttpError::Status {
                status: *status,
                url: url.to_string(),
            }),
            Some(Route::Network(message)) => Err(HttpError::Network {
                url: url.to_string(),
                message: message.clone(),
            }),
            Some(route) => Ok(route.clone()),
            None => Err(HttpError::Status {
                status: 404,
                url: url.to_string(),
            }),
        }
    }
}

#[async_trait]
impl HttpBackend for MockBackend {
    async fn get_text(&self, url: &Url) -> Result<String, HttpError> {
        self.record(MockCall::Text(url.to_string()));
        match self.lookup(url)? {
            Route::Body {
                bytes, ..
            } => Ok(String::from_utf8_lossy(&bytes).into_owned()),
            _ => unreachable!("lookup only returns bodies"),
        }
    }

    async fn content_length(&self, url: &Url) -> Result<Option<u64>, HttpError> {
        self.record(MockCall::Head(url.to_string()));
        match self.lookup(url)? {
            Route::Body {
                bytes,
                report_length,
                ..
            } => Ok(report_length.then_some(bytes.len() as u64)),
            _ => unreachable!("lookup only returns bodies"),
        }
    }

    async fn get_stream(&self, url: &Url) -> Result<ByteStream, HttpError> {
        self.record(MockCall::Stream(url.to_string()));
        let Route::Body {
            bytes,
            report_length,
            fail_after,
        } = self.lookup(url)?
        else {
            unreachable!("lookup only returns bodies");
        };

        let total = report_length.then_some(bytes.len() as u64);
        let served = fail_after.map_or(bytes.len(), |n| n.min(bytes.len()));

        let mut chunks: Vec<Result<Bytes, HttpError>> = bytes[..served]
            .chunks(self.chunk_size)
            .map(|chunk| Ok(Bytes::copy_from_slice(chunk)))
            .collect();
        if fail_after.is_some() {
            chunks.push(Err(HttpError::Network {
                url: url.to_string(),
                message: "connection reset by peer".to_string(),
            }));
        }

        Ok(ByteStream {
            total,
            body: futures::stream::iter(chunks).boxed(),
        })
    }
}

/// Observer that records every phase and progress event.
#[derive(Default)]
pub struct RecordingObserver {
    phases: Mutex<Vec<Phase>>,
    events: Mutex<Vec<ProgressEvent>>,
}

impl RecordingObserver {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phases(&self) -> Vec<Phase> {
        self.phases.lock().map(|p| p.clone()).unwrap_or_default()
    }

    pub fn events(&self) -> Vec<ProgressEvent> {
        self.events.lock().map(|e| e.clone()).unwrap_or_default()
    }
}

impl ProgressObserver for RecordingObserver {
    fn on_progress(&self, event: ProgressEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event);
        }
    }
}

impl PipelineObserver for RecordingObserver {
    fn on_phase(&self, phase: Phase) {
        if let Ok(mut phases) = self.phases.lock() {
            phases.push(phase);
        }
    }
}
