//! Dotted numeric versions.
//!
//! Release archives rarely carry strict semantic versions. Listing pages link to
//! `v1.10.0/game.zip`, `Plugin_2.1.zip`, or `build-10.0-final.zip`, and metadata
//! endpoints publish whatever the release author typed. This module reduces all
//! of those to a [`Version`]: an ordered sequence of non-negative integers.
//!
//! # Ordering
//!
//! Versions compare component-wise, left to right, with missing trailing
//! components treated as `0`. The order is total, so `[1, 2] == [1, 2, 0]` and
//! the empty version ranks lowest. See [`comparison::VersionComparator`].
//!
//! # Extraction vs parsing
//!
//! - [`Version::extract`] scans free text for the first dotted digit run
//!   (see [`scanner`]) and is used for URLs and file names.
//! - [`Version::parse`] accepts a bare published version (`"3"`, `"v2.0.1"`)
//!   and is used for metadata `version` fields.
//!
//! ```rust
//! use prelaunch_cli::version::Version;
//!
//! assert_eq!(Version::extract("build-10.0-final").components(), &[10, 0]);
//! assert!(Version::extract("1.10.0") > Version::extract("1.2.0"));
//! assert_eq!(Version::parse("v3").map(|v| v.to_string()), Some("3".to_string()));
//! ```

pub mod comparison;
pub mod scanner;

pub use comparison::VersionComparator;

use serde::{Serialize, Serializer};
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

/// An immutable dotted numeric version.
#[derive(Debug, Clone, Default)]
pub struct Version {
    components: Vec<u64>,
}

impl Version {
    #[must_use]
    pub const fn new(components: Vec<u64>) -> Self {
        Self {
            components,
        }
    }

    /// Extract the first dotted digit run from free text.
    ///
    /// Returns the empty version when the text has no qualifying run.
    #[must_use]
    pub fn extract(text: &str) -> Self {
        Self::new(scanner::first_version_components(text))
    }

    /// Parse a published version string such as `"3"`, `"2.0"`, or `"v1.4.2"`.
    ///
    /// Every dot-separated component must be an integer; anything else returns `None`.
    #[must_use]
    pub fn parse(text: &str) -> Option<Self> {
        let trimmed = text.trim();
        let trimmed = trimmed.strip_prefix(['v', 'V']).unwrap_or(trimmed);
        if trimmed.is_empty() {
            return None;
        }

        let components = trimmed
            .split('.')
            .map(|part| {
                if part.bytes().all(|b| b.is_ascii_digit()) {
                    part.parse::<u64>().ok()
                } else {
                    None
                }
            })
            .collect::<Option<Vec<_>>>()?;

        Some(Self::new(components))
    }

    #[must_use]
    pub fn components(&self) -> &[u64] {
        &self.components
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    /// Components with trailing zeros removed; equal versions share this form.
    fn significant(&self) -> &[u64] {
        let len = self.components.iter().rposition(|&c| c != 0).map_or(0, |i| i + 1);
        &self.components[..len]
    }
}

impl PartialEq for Version {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Version {}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Version {
    fn cmp(&self, other: &Self) -> Ordering {
        VersionComparator::compare(&self.components, &other.components)
    }
}

impl Hash for Version {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.significant().hash(state);
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for component in &self.components {
            if !first {
                f.write_str(".")?;
            }
            write!(f, "{component}")?;
            first = false;
        }
        Ok(())
    }
}

impl Serialize for Version {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}
