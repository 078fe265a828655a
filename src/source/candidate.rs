use serde::Serialize;
use url::Url;

use crate::version::Version;

/// A discovered release archive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReleaseCandidate {
    /// Numeric version, when the source carries one.
    pub version: Option<Version>,
    /// Version text as published by a metadata source (e.g. `"v3.0-rc1"`).
    pub tag: Option<String>,
    /// Absolute download location.
    pub download_url: Url,
    /// Decoded final path segment of `download_url`.
    pub file_name: String,
    /// Expected SHA-256 digest, when the source publishes one.
    pub sha256: Option<String>,
}

impl ReleaseCandidate {
    pub fn new(download_url: Url, version: Option<Version>) -> Self {
        let file_name = file_name_from_url(&download_url);
        Self {
            version,
            tag: None,
            download_url,
            file_name,
            sha256: None,
        }
    }

    #[must_use]
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = Some(tag.into());
        self
    }

    #[must_use]
    pub fn with_sha256(mut self, digest: impl Into<String>) -> Self {
        self.sha256 = Some(digest.into());
        self
    }

    /// Human-readable version: the published tag, else the numeric version.
    pub fn version_label(&self) -> Option<String> {
        self.tag
            .clone()
            .or_else(|| self.version.as_ref().filter(|v| !v.is_empty()).map(ToString::to_string))
    }
}

/// Final path segment of a URL, percent-decoded and safe to use as a file name.
fn file_name_from_url(url: &Url) -> String {
    let segment = url
        .path_segments()
        .and_then(|mut segments| segments.next_back())
        .unwrap_or_default();

    let decoded = urlencoding::decode(segment)
        .map(|s| s.into_owned())
        .unwrap_or_else(|_| segment.to_string());

    let sanitized: String = decoded
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();

    let trimmed = sanitized.trim().trim_matches('.');
    if trimmed.is_empty() {
        "release".to_string()
    } else {
        trimmed.to_string()
    }
}
