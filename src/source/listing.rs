//! Listing-scrape strategy.
//!
//! Reads an HTML index page and treats every link to an archive as a release.
//! The markup is never parsed as a DOM; any `href` attribute whose target path
//! ends in the archive extension counts, which tolerates the loose markup that
//! directory listings and hand-written download pages tend to use.

use async_trait::async_trait;
use regex::Regex;
use std::collections::HashSet;
use std::sync::LazyLock;
use tracing::{debug, info};
use url::Url;

use super::{ReleaseCandidate, ReleaseLocator, unreachable};
use crate::config::has_archive_extension;
use crate::core::{UpdaterError, UpdaterResult};
use crate::http::HttpBackend;
use crate::version::{Version, VersionComparator};

static HREF_PATTERN: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(r#"(?i)\bhref\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s"'<>]+))"#).ok()
});

pub struct ListingLocator {
    page_url: Url,
    extension: String,
}

impl ListingLocator {
    /// `extension` must be lowercase with a leading dot (see [`crate::config::RunContext`]).
    pub fn new(page_url: Url, extension: impl Into<String>) -> Self {
        Self {
            page_url,
            extension: extension.into(),
        }
    }

    /// All archive candidates on a page, newest first.
    ///
    /// Equal versions keep their order of appearance in the markup.
    pub fn candidates(&self, markup: &str) -> Vec<ReleaseCandidate> {
        let Some(pattern) = HREF_PATTERN.as_ref() else {
            return Vec::new();
        };
        let mut seen = HashSet::new();
        let mut found = Vec::new();

        for captures in pattern.captures_iter(markup) {
            let Some(raw) = captures.get(1).or_else(|| captures.get(2)).or_else(|| captures.get(3))
            else {
                continue;
            };

            let href = raw.as_str().trim().replace("&amp;", "&");
            if href.is_empty() {
                continue;
            }

            let Ok(resolved) = self.page_url.join(&href) else {
                debug!("Skipping unresolvable href '{}'", href);
                continue;
            };

            if !matches!(resolved.scheme(), "http" | "https") || !self.is_archive_path(&resolved) {
                continue;
            }

            if !seen.insert(resolved.as_str().to_string()) {
                continue;
            }

            // Only the path is scanned so numeric hostnames never read as versions
            let path = urlencoding::decode(resolved.path())
                .map(|p| p.into_owned())
                .unwrap_or_else(|_| resolved.path().to_string());
            let version = Version::extract(&path);
            let version = (!version.is_empty()).then_some(version);

            debug!("Found archive {} (version {:?})", resolved, version);
            found.push(ReleaseCandidate::new(resolved, version));
        }

        VersionComparator::sort_newest_first(&mut found, |c| {
            c.version.as_ref().map_or(&[][..], Version::components)
        });
        found
    }

    /// Pick the newest archive referenced by a page.
    pub fn select(&self, markup: &str) -> UpdaterResult<ReleaseCandidate> {
        self.candidates(markup).into_iter().next().ok_or_else(|| UpdaterError::NoArtifactsFound {
            url: self.page_url.to_string(),
            extension: self.extension.clone(),
        })
    }

    fn is_archive_path(&self, url: &Url) -> bool {
        has_archive_extension(url.path(), &self.extension)
    }
}

#[async_trait]
impl ReleaseLocator for ListingLocator {
    async fn locate(&self, backend: &dyn HttpBackend) -> UpdaterResult<ReleaseCandidate> {
        info!("Scanning release listing {}", self.page_url);
        let markup =
            backend.get_text(&self.page_url).await.map_err(|e| unreachable(&self.page_url, &e))?;

        let candidate = self.select(&markup)?;
        info!(
            "Latest archive: {} ({})",
            candidate.file_name,
            candidate.version_label().unwrap_or_else(|| "unversioned".to_string())
        );
        Ok(candidate)
    }

    fn describe(&self) -> String {
        format!("listing {}", self.page_url)
    }
}
