//! Archive installation.
//!
//! Unpacks a downloaded zip archive into the install root, overwriting any
//! file already there. Extraction is synchronous; the pipeline runs it on the
//! blocking thread pool.
//!
//! Entry handling:
//! - backslashes in stored names are normalized to `/`
//! - names ending in `/` are directories: created, not counted
//! - every other name is resolved lexically under the root, and names that are
//!   absolute, drive-qualified, or climb out with `..` are rejected
//! - an entry that resolves to the archive itself is rejected
//!
//! A failure on one entry is logged, collected, and skipped. Only failing to
//! open the archive aborts the install. Nothing is rolled back.

use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use zip::ZipArchive;

use crate::core::{UpdaterError, UpdaterResult};
use crate::utils::path_validation::{comparison_key, normalize_separators, resolve_within};

/// Summary of one installation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InstallReport {
    /// Number of file entries written.
    pub extracted: usize,
    /// Entries that were skipped, as [`UpdaterError::EntryWriteError`].
    pub failures: Vec<UpdaterError>,
}

/// Unpacks archives into a target directory.
pub struct Installer {
    target: PathBuf,
}

impl Installer {
    pub fn new(target: impl Into<PathBuf>) -> Self {
        Self {
            target: target.into(),
        }
    }

    /// Extract every entry of `archive` into the target directory.
    ///
    /// # Errors
    ///
    /// [`UpdaterError::ArchiveOpenError`] when the file cannot be opened or is
    /// not a zip archive. Per-entry problems are reported in the
    /// [`InstallReport`] instead.
    pub fn install(&self, archive: &Path) -> UpdaterResult<InstallReport> {
        info!("Installing {} into {}", archive.display(), self.target.display());

        let open_error = |reason: String| UpdaterError::ArchiveOpenError {
            path: archive.display().to_string(),
            reason,
        };
        let file = File::open(archive).map_err(|e| open_error(e.to_string()))?;
        let mut zip = ZipArchive::new(file).map_err(|e| open_error(e.to_string()))?;

        let archive_key = comparison_key(archive);
        let mut report = InstallReport::default();
        for index in 0..zip.len() {
            match self.extract_entry(&mut zip, index, &archive_key) {
                Ok(true) => report.extracted += 1,
                Ok(false) => {}
                Err(error) => {
                    warn!("{}", error);
                    report.failures.push(error);
                }
            }
        }

        info!(
            "Extracted {} file(s) from {} ({} skipped)",
            report.extracted,
            archive.display(),
            report.failures.len()
        );
        Ok(report)
    }

    /// Extract a single entry. Returns `true` when a file was written.
    fn extract_entry(
        &self,
        zip: &mut ZipArchive<File>,
        index: usize,
        archive_key: &str,
    ) -> UpdaterResult<bool> {
        let mut entry = zip.by_index(index).map_err(|e| UpdaterError::EntryWriteError {
            entry: format!("#{index}"),
            reason: e.to_string(),
        })?;

        let name = normalize_separators(entry.name());
        let entry_error = |reason: String| UpdaterError::EntryWriteError {
            entry: name.clone(),
            reason,
        };

        let destination = resolve_within(&self.target, &name).map_err(|e| entry_error(e.to_string()))?;
        if comparison_key(&destination) == archive_key {
            return Err(entry_error("entry would overwrite the archive being installed".to_string()));
        }

        if name.ends_with('/') {
            fs::create_dir_all(&destination).map_err(|e| entry_error(e.to_string()))?;
            debug!("Created directory {}", destination.display());
            return Ok(false);
        }

        if let Some(parent) = destination.parent() {
            fs::create_dir_all(parent).map_err(|e| entry_error(e.to_string()))?;
        }

        let mut out = File::create(&destination).map_err(|e| entry_error(e.to_string()))?;
        let written = io::copy(&mut entry, &mut out).map_err(|e| entry_error(e.to_string()))?;
        debug!("Wrote {} ({} bytes)", destination.display(), written);
        Ok(true)
    }
}
