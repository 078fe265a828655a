//! Download cache retention.
//!
//! After a successful install only the archive just installed is worth
//! keeping. [`RetentionSweeper`] removes every other archive from the
//! download directory. Deletion failures are logged and skipped.

use std::path::Path;
use tokio::fs;
use tracing::{debug, info, warn};

use crate::config::has_archive_extension;
use crate::utils::path_validation::comparison_key;

pub struct RetentionSweeper {
    extension: String,
}

impl RetentionSweeper {
    /// `extension` must be lowercase with a leading dot.
    pub fn new(extension: impl Into<String>) -> Self {
        Self {
            extension: extension.into(),
        }
    }

    /// Delete archives in `directory` other than `keep`. Returns the number deleted.
    ///
    /// Paths are compared case-insensitively so a differently cased spelling of
    /// `keep` is never removed. A missing directory deletes nothing.
    pub async fn sweep(&self, keep: &Path, directory: &Path) -> usize {
        let mut entries = match fs::read_dir(directory).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("Download directory {} does not exist", directory.display());
                return 0;
            }
            Err(e) => {
                warn!("Cannot list {}: {}", directory.display(), e);
                return 0;
            }
        };

        let keep_key = comparison_key(keep);
        let mut deleted = 0;

        loop {
            let entry = match entries.next_entry().await {
                Ok(Some(entry)) => entry,
                Ok(None) => break,
                Err(e) => {
                    warn!("Error while listing {}: {}", directory.display(), e);
                    break;
                }
            };

            let is_file = entry.file_type().await.map(|t| t.is_file()).unwrap_or(false);
            let name = entry.file_name().to_string_lossy().into_owned();
            if !is_file || !has_archive_extension(&name, &self.extension) {
                continue;
            }

            let path = entry.path();
            if comparison_key(&path) == keep_key {
                continue;
            }

            match fs::remove_file(&path).await {
                Ok(()) => {
                    info!("Removed superseded archive {}", path.display());
                    deleted += 1;
                }
                Err(e) => warn!("Failed to remove {}: {}", path.display(), e),
            }
        }

        deleted
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_sweeps_all_but_kept() {
        let dir = TempDir::new().unwrap();
        for name in ["a.zip", "b.zip", "c.zip"] {
            std::fs::write(dir.path().join(name), name).unwrap();
        }

        let deleted = RetentionSweeper::new(".zip").sweep(&dir.path().join("b.zip"), dir.path()).await;

        assert_eq!(deleted, 2);
        assert!(dir.path().join("b.zip").exists());
        assert!(!dir.path().join("a.zip").exists());
        assert!(!dir.path().join("c.zip").exists());
    }

    #[tokio::test]
    async fn test_keep_matched_case_insensitively() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("Game-2.0.ZIP"), "x").unwrap();
        std::fs::write(dir.path().join("game-1.0.zip"), "x").unwrap();

        let deleted =
            RetentionSweeper::new(".zip").sweep(&dir.path().join("game-2.0.zip"), dir.path()).await;

        assert_eq!(deleted, 1);
        assert!(dir.path().join("Game-2.0.ZIP").exists());
    }

    #[tokio::test]
    async fn test_ignores_other_files_and_directories() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("notes.txt"), "x").unwrap();
        std::fs::create_dir(dir.path().join("folder.zip")).unwrap();
        std::fs::write(dir.path().join("keep.zip"), "x").unwrap();

        let deleted = RetentionSweeper::new(".zip").sweep(&dir.path().join("keep.zip"), dir.path()).await;

        assert_eq!(deleted, 0);
        assert!(dir.path().join("notes.txt").exists());
        assert!(dir.path().join("folder.zip").is_dir());
    }

    #[tokio::test]
    async fn test_missing_directory_is_noop() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("nope");
        assert_eq!(RetentionSweeper::new(".zip").sweep(&missing.join("a.zip"), &missing).await, 0);
    }
}
