//! Release discovery.
//!
//! A [`ReleaseLocator`] turns an update source into a single
//! [`ReleaseCandidate`]: the newest archive the source publishes. Two
//! strategies exist and configuration picks one:
//!
//! - [`ListingLocator`] scrapes an HTML index page for archive links and ranks
//!   them by the version embedded in each link's path
//! - [`MetadataLocator`] reads a JSON-like `{"version", "url"}` document
//!
//! Both make exactly one request through the [`HttpBackend`] and report
//! transport failures as [`UpdaterError::SourceUnreachable`].

pub mod candidate;
pub mod listing;
pub mod metadata;

pub use candidate::ReleaseCandidate;
pub use listing::ListingLocator;
pub use metadata::MetadataLocator;

use async_trait::async_trait;
use url::Url;

use crate::config::{RunContext, SourceKind};
use crate::core::{UpdaterError, UpdaterResult};
use crate::http::{HttpBackend, HttpError};

/// Strategy for finding the newest published release.
#[async_trait]
pub trait ReleaseLocator: Send + Sync {
    /// Fetch the source and pick the newest candidate.
    async fn locate(&self, backend: &dyn HttpBackend) -> UpdaterResult<ReleaseCandidate>;

    /// Short description for logs, e.g. `listing https://…/releases/`.
    fn describe(&self) -> String;
}

/// Build the locator selected by the run configuration.
#[must_use]
pub fn locator_for(context: &RunContext) -> Box<dyn ReleaseLocator> {
    match context.source_kind {
        SourceKind::Listing => Box::new(ListingLocator::new(
            context.source_url.clone(),
            context.archive_extension.clone(),
        )),
        SourceKind::Metadata => Box::new(MetadataLocator::new(context.source_url.clone())),
    }
}

pub(crate) fn unreachable(url: &Url, err: &HttpError) -> UpdaterError {
    UpdaterError::SourceUnreachable {
        url: url.to_string(),
        detail: err.to_string(),
    }
}
