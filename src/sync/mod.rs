//! Idempotent sync decision.
//!
//! Decides whether the located release must be downloaded. The local copy is
//! identified by name only (the candidate file name, tagged with its version),
//! and freshness is judged by comparing its size with the remote content
//! length. A failed or inconclusive probe never blocks an update: the decision
//! falls back to fetching.

use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::config::{RunContext, split_archive_extension};
use crate::core::{UpdaterError, UpdaterResult};
use crate::http::HttpBackend;
use crate::source::ReleaseCandidate;
use crate::version::Version;

/// A local archive read from disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LocalArtifact {
    pub path: PathBuf,
    pub size_bytes: u64,
}

/// Why a download is needed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FetchReason {
    /// No local copy exists.
    Missing,
    /// A local copy exists but its size differs from the remote one.
    SizeMismatch { local: u64, remote: u64 },
    /// A local copy exists but its size could not be checked.
    Unverified,
}

/// Outcome of comparing a candidate with local state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "decision", rename_all = "snake_case")]
pub enum SyncDecision {
    AlreadyCurrent { artifact: LocalArtifact },
    Fetch { path: PathBuf, reason: FetchReason },
}

impl SyncDecision {
    /// Local path the decision refers to.
    #[must_use]
    pub fn path(&self) -> &Path {
        match self {
            Self::AlreadyCurrent {
                artifact,
            } => &artifact.path,
            Self::Fetch {
                path, ..
            } => path,
        }
    }

    #[must_use]
    pub const fn needs_fetch(&self) -> bool {
        matches!(self, Self::Fetch { .. })
    }
}

/// Compares candidates against the download cache.
pub struct SyncPlanner {
    download_dir: PathBuf,
    extension: String,
}

impl SyncPlanner {
    /// `extension` must be lowercase with a leading dot.
    pub fn new(download_dir: impl Into<PathBuf>, extension: impl Into<String>) -> Self {
        Self {
            download_dir: download_dir.into(),
            extension: extension.into(),
        }
    }

    #[must_use]
    pub fn from_context(context: &RunContext) -> Self {
        Self::new(&context.download_dir, &context.archive_extension)
    }

    /// Local file name for a candidate.
    ///
    /// When the candidate carries a version that its file name does not already
    /// contain, `-<version>` is inserted before the archive extension, so
    /// `game.zip` at 1.10.0 is stored as `game-1.10.0.zip`.
    #[must_use]
    pub fn expected_file_name(&self, candidate: &ReleaseCandidate) -> String {
        let name = candidate.file_name.as_str();
        let (stem, extension) = match split_archive_extension(name, &self.extension) {
            Some((stem, extension)) => (stem, extension.to_string()),
            None => (name, self.extension.clone()),
        };

        let label = candidate.version_label().map(|v| sanitize_label(&v)).unwrap_or_default();
        if label.is_empty() || stem.contains(&label) || embeds_version(stem, candidate) {
            return format!("{stem}{extension}");
        }
        format!("{stem}-{label}{extension}")
    }

    /// Local path for a candidate.
    #[must_use]
    pub fn expected_path(&self, candidate: &ReleaseCandidate) -> PathBuf {
        self.download_dir.join(self.expected_file_name(candidate))
    }

    /// Decide between skipping and fetching.
    ///
    /// Only a HEAD-style length probe touches the network; the body is never
    /// requested here.
    pub async fn decide(
        &self,
        candidate: &ReleaseCandidate,
        backend: &dyn HttpBackend,
    ) -> UpdaterResult<SyncDecision> {
        let path = self.expected_path(candidate);

        let metadata = match tokio::fs::metadata(&path).await {
            Ok(metadata) => metadata,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("No local copy at {}", path.display());
                return Ok(SyncDecision::Fetch {
                    path,
                    reason: FetchReason::Missing,
                });
            }
            Err(e) => return Err(UpdaterError::fs("read metadata", &path, &e)),
        };

        if !metadata.is_file() {
            return Err(UpdaterError::FileSystemError {
                operation: "read metadata".to_string(),
                path: path.display().to_string(),
                reason: "expected a regular file".to_string(),
            });
        }

        let local = metadata.len();
        let remote = match backend.content_length(&candidate.download_url).await {
            Ok(Some(remote)) => remote,
            Ok(None) => {
                warn!(
                    "Server did not report a size for {}; downloading again",
                    candidate.download_url
                );
                return Ok(SyncDecision::Fetch {
                    path,
                    reason: FetchReason::Unverified,
                });
            }
            Err(e) => {
                warn!("Size check for {} failed ({}); downloading again", candidate.download_url, e);
                return Ok(SyncDecision::Fetch {
                    path,
                    reason: FetchReason::Unverified,
                });
            }
        };

        if local == remote {
            info!("{} is up to date ({} bytes)", path.display(), local);
            Ok(SyncDecision::AlreadyCurrent {
                artifact: LocalArtifact {
                    path,
                    size_bytes: local,
                },
            })
        } else {
            info!("{} is stale: local {} bytes, remote {} bytes", path.display(), local, remote);
            Ok(SyncDecision::Fetch {
                path,
                reason: FetchReason::SizeMismatch {
                    local,
                    remote,
                },
            })
        }
    }
}

/// Whether the stem already carries the candidate's version, e.g. `arena-3.0` for tag `v3.0`.
fn embeds_version(stem: &str, candidate: &ReleaseCandidate) -> bool {
    candidate
        .version
        .as_ref()
        .is_some_and(|version| !version.is_empty() && Version::extract(stem) == *version)
}

fn sanitize_label(label: &str) -> String {
    label
        .trim()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') { c } else { '_' })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{MockBackend, MockCall};
    use tempfile::TempDir;
    use url::Url;

    const ARCHIVE_URL: &str = "https://cdn.example.com/v1.10.0/game.zip";

    fn candidate(url: &str, version: Option<Vec<u64>>) -> ReleaseCandidate {
        ReleaseCandidate::new(Url::parse(url).unwrap(), version.map(Version::new))
    }

    fn planner(dir: &Path) -> SyncPlanner {
        SyncPlanner::new(dir, ".zip")
    }

    #[test]
    fn test_expected_name_inserts_version() {
        let p = planner(Path::new("/cache"));
        assert_eq!(p.expected_file_name(&candidate(ARCHIVE_URL, Some(vec![1, 10, 0]))), "game-1.10.0.zip");
    }

    #[test]
    fn test_expected_name_keeps_versioned_name() {
        let p = planner(Path::new("/cache"));
        let c = candidate("https://example.com/Plugin-2.1.ZIP", Some(vec![2, 1]));
        assert_eq!(p.expected_file_name(&c), "Plugin-2.1.ZIP");
    }

    #[test]
    fn test_expected_name_recognizes_version_behind_tag() {
        let p = planner(Path::new("/cache"));
        let c = candidate("https://updates.example.com/arena-3.0.zip", Some(vec![3, 0])).with_tag("v3.0");
        assert_eq!(p.expected_file_name(&c), "arena-3.0.zip");

        let c = candidate("https://updates.example.com/arena-2.9.zip", Some(vec![3, 0])).with_tag("v3.0");
        assert_eq!(p.expected_file_name(&c), "arena-2.9-v3.0.zip");
    }

    #[test]
    fn test_expected_name_without_version() {
        let p = planner(Path::new("/cache"));
        assert_eq!(p.expected_file_name(&candidate("https://example.com/latest.zip", None)), "latest.zip");
    }

    #[test]
    fn test_expected_name_appends_missing_extension() {
        let p = planner(Path::new("/cache"));
        let c = candidate("https://example.com/download", Some(vec![3, 0])).with_tag("v3.0 beta");
        assert_eq!(p.expected_file_name(&c), "download-v3.0_beta.zip");
    }

    #[tokio::test]
    async fn test_missing_file_fetches() {
        let dir = TempDir::new().unwrap();
        let backend = MockBackend::new();
        let decision = planner(dir.path())
            .decide(&candidate(ARCHIVE_URL, Some(vec![1, 10, 0])), &backend)
            .await
            .unwrap();

        assert_eq!(
            decision,
            SyncDecision::Fetch {
                path: dir.path().join("game-1.10.0.zip"),
                reason: FetchReason::Missing,
            }
        );
        assert!(backend.calls().is_empty());
    }

    #[tokio::test]
    async fn test_equal_size_is_current_without_body_fetch() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("game-1.10.0.zip"), vec![0u8; 2048]).unwrap();
        let backend = MockBackend::new().with_bytes(ARCHIVE_URL, vec![1u8; 2048]);

        let decision = planner(dir.path())
            .decide(&candidate(ARCHIVE_URL, Some(vec![1, 10, 0])), &backend)
            .await
            .unwrap();

        assert!(!decision.needs_fetch());
        assert_eq!(backend.calls(), vec![MockCall::Head(ARCHIVE_URL.to_string())]);
        assert_eq!(backend.stream_count(), 0);
    }

    #[tokio::test]
    async fn test_size_mismatch_fetches() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("game-1.10.0.zip"), vec![0u8; 2000]).unwrap();
        let backend = MockBackend::new().with_bytes(ARCHIVE_URL, vec![1u8; 2048]);

        let decision = planner(dir.path())
            .decide(&candidate(ARCHIVE_URL, Some(vec![1, 10, 0])), &backend)
            .await
            .unwrap();

        assert!(matches!(
            decision,
            SyncDecision::Fetch {
                reason: FetchReason::SizeMismatch {
                    local: 2000,
                    remote: 2048
                },
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_probe_failure_fails_open() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("game-1.10.0.zip"), b"zip").unwrap();

        for backend in [
            MockBackend::new().with_network_error(ARCHIVE_URL, "connection refused"),
            MockBackend::new().with_unknown_length(ARCHIVE_URL, b"zip".to_vec()),
        ] {
            let decision = planner(dir.path())
                .decide(&candidate(ARCHIVE_URL, Some(vec![1, 10, 0])), &backend)
                .await
                .unwrap();
            assert!(matches!(
                decision,
                SyncDecision::Fetch {
                    reason: FetchReason::Unverified,
                    ..
                }
            ));
        }
    }

    #[tokio::test]
    async fn test_directory_in_place_of_archive() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir(dir.path().join("game-1.10.0.zip")).unwrap();
        let err = planner(dir.path())
            .decide(&candidate(ARCHIVE_URL, Some(vec![1, 10, 0])), &MockBackend::new())
            .await
            .unwrap_err();
        assert!(matches!(err, UpdaterError::FileSystemError { .. }));
    }

    #[test]
    fn test_decision_serializes() {
        let decision = SyncDecision::Fetch {
            path: PathBuf::from("/cache/game.zip"),
            reason: FetchReason::SizeMismatch {
                local: 1,
                remote: 2,
            },
        };
        let json = serde_json::to_value(&decision).unwrap();
        assert_eq!(json["decision"], "fetch");
        assert_eq!(json["reason"]["kind"], "size_mismatch");
        assert_eq!(json["reason"]["remote"], 2);
    }
}
