//! Per-run resolved settings.
//!
//! [`RunContext`] is created once at the start of a run from an
//! [`UpdaterConfig`] and the install root. It is read-only afterwards and is
//! shared by every pipeline component, so nothing below the CLI reads globals
//! or the environment.

use std::path::{Path, PathBuf};
use url::Url;

use super::updater::{HttpConfig, SourceKind, UpdaterConfig};
use crate::core::{UpdaterError, UpdaterResult};

#[derive(Debug, Clone)]
pub struct RunContext {
    /// Directory archives are installed into (the game directory).
    pub install_root: PathBuf,
    /// Directory holding downloaded archives.
    pub download_dir: PathBuf,
    /// Archive extension, lowercase with a leading dot.
    pub archive_extension: String,
    pub source_kind: SourceKind,
    pub source_url: Url,
    pub success_marker: PathBuf,
    pub error_log: PathBuf,
    pub http: HttpConfig,
}

impl RunContext {
    /// Resolve a configuration against an install root.
    ///
    /// Relative paths in the configuration are joined onto `install_root`.
    pub fn resolve(config: &UpdaterConfig, install_root: &Path) -> UpdaterResult<Self> {
        let raw_url = config.source.url.as_deref().ok_or_else(|| UpdaterError::ConfigError {
            message: "no update source configured (set source.url or pass --source-url)"
                .to_string(),
        })?;

        let source_url = Url::parse(raw_url).map_err(|e| UpdaterError::ConfigError {
            message: format!("invalid source url '{raw_url}': {e}"),
        })?;

        if !matches!(source_url.scheme(), "http" | "https") {
            return Err(UpdaterError::ConfigError {
                message: format!("unsupported source url scheme '{}'", source_url.scheme()),
            });
        }

        let archive_extension = normalize_extension(&config.download.extension).ok_or_else(|| {
            UpdaterError::ConfigError {
                message: format!("invalid archive extension '{}'", config.download.extension),
            }
        })?;

        Ok(Self {
            install_root: install_root.to_path_buf(),
            download_dir: install_root.join(&config.download.dir),
            archive_extension,
            source_kind: config.source.kind,
            source_url,
            success_marker: install_root.join(&config.records.success_marker),
            error_log: install_root.join(&config.records.error_log),
            http: config.http.clone(),
        })
    }

}

/// Split `name` into stem and extension when it ends with `extension`, ignoring ASCII case.
///
/// `extension` is the normalized form held by [`RunContext::archive_extension`].
#[must_use]
pub fn split_archive_extension<'a>(name: &'a str, extension: &str) -> Option<(&'a str, &'a str)> {
    let start = name.len().checked_sub(extension.len())?;
    let tail = name.get(start..)?;
    if !tail.eq_ignore_ascii_case(extension) {
        return None;
    }
    Some((&name[..start], tail))
}

/// Whether `name` ends with `extension`, ignoring ASCII case.
#[must_use]
pub fn has_archive_extension(name: &str, extension: &str) -> bool {
    split_archive_extension(name, extension).is_some()
}

fn normalize_extension(raw: &str) -> Option<String> {
    let trimmed = raw.trim().trim_start_matches('.');
    if trimmed.is_empty() || trimmed.contains(['/', '\\']) {
        return None;
    }
    Some(format!(".{}", trimmed.to_lowercase()))
}
