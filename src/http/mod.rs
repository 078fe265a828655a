//! HTTP backend abstraction.
//!
//! Every network call the pipeline makes goes through [`HttpBackend`], which
//! keeps the locators, the sync decision, and the fetcher testable without a
//! server. The production implementation is [`ReqwestBackend`]; tests use
//! `test_utils::MockBackend`.
//!
//! Transport requirements for the production client:
//! - a `User-Agent` client identifier plus an `X-Client-Id` header
//! - an `Accept` hint
//! - TLS 1.2 or newer
//! - no timeout and no retries; each phase makes a single attempt

use async_trait::async_trait;
use bytes::Bytes;
use futures::StreamExt;
use futures::stream::BoxStream;
use reqwest::header::{ACCEPT, CONTENT_LENGTH, HeaderMap, HeaderName, HeaderValue};
use thiserror::Error;
use tracing::debug;
use url::Url;

use crate::config::HttpConfig;

/// Errors raised by an [`HttpBackend`].
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum HttpError {
    /// The server answered with a non-success status.
    #[error("HTTP {status} from {url}")]
    Status {
        /// Numeric status code
        status: u16,
        /// Requested URL
        url: String,
    },

    /// Connection, DNS, TLS, or protocol failure.
    #[error("{message}")]
    Network {
        /// Requested URL
        url: String,
        /// Transport error text
        message: String,
    },
}

/// A response body delivered as a stream of chunks.
pub struct ByteStream {
    /// Total length when the server reports one.
    pub total: Option<u64>,
    /// Body chunks in arrival order.
    pub body: BoxStream<'static, Result<Bytes, HttpError>>,
}

/// Minimal HTTP operations used by the update pipeline.
#[async_trait]
pub trait HttpBackend: Send + Sync {
    /// Fetch a document as text.
    async fn get_text(&self, url: &Url) -> Result<String, HttpError>;

    /// Probe the size of a resource without downloading its body.
    ///
    /// `Ok(None)` means the server did not report a length.
    async fn content_length(&self, url: &Url) -> Result<Option<u64>, HttpError>;

    /// Start streaming a resource body.
    async fn get_stream(&self, url: &Url) -> Result<ByteStream, HttpError>;
}

/// Production backend built on a shared `reqwest::Client`.
pub struct ReqwestBackend {
    client: reqwest::Client,
}

impl ReqwestBackend {
    /// Build a client from the HTTP configuration.
    pub fn new(config: &HttpConfig) -> anyhow::Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_str(&config.accept)?);
        headers.insert(
            HeaderName::from_static("x-client-id"),
            HeaderValue::from_str(&config.client_id)?,
        );

        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .default_headers(headers)
            .min_tls_version(reqwest::tls::Version::TLS_1_2)
            .build()?;

        Ok(Self {
            client,
        })
    }

    async fn send(&self, request: reqwest::RequestBuilder, url: &Url) -> Result<reqwest::Response, HttpError> {
        let response = request.send().await.map_err(|e| network_error(url, &e))?;
        let status = response.status();
        if !status.is_success() {
            return Err(HttpError::Status {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }
        Ok(response)
    }
}

#[async_trait]
impl HttpBackend for ReqwestBackend {
    async fn get_text(&self, url: &Url) -> Result<String, HttpError> {
        debug!("GET {}", url);
        let response = self.send(self.client.get(url.clone()), url).await?;
        response.text().await.map_err(|e| network_error(url, &e))
    }

    async fn content_length(&self, url: &Url) -> Result<Option<u64>, HttpError> {
        debug!("HEAD {}", url);
        let response = self.send(self.client.head(url.clone()), url).await?;

        // reqwest reports 0 for HEAD bodies, so read the header directly
        let length = response
            .headers()
            .get(CONTENT_LENGTH)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.trim().parse::<u64>().ok());
        Ok(length)
    }

    async fn get_stream(&self, url: &Url) -> Result<ByteStream, HttpError> {
        debug!("GET (stream) {}", url);
        let response = self.send(self.client.get(url.clone()), url).await?;
        let total = response.content_length();
        let owned_url = url.clone();
        let body = response
            .bytes_stream()
            .map(move |chunk| chunk.map_err(|e| network_error(&owned_url, &e)))
            .boxed();

        Ok(ByteStream {
            total,
            body,
        })
    }
}

fn network_error(url: &Url, err: &reqwest::Error) -> HttpError {
    // Include the source chain; reqwest's top-level message is often just "error sending request"
    let mut message = err.to_string();
    let mut source = std::error::Error::source(err);
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }

    HttpError::Network {
        url: url.to_string(),
        message,
    }
}
