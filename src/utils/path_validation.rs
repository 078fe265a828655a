//! Path containment checks for archive extraction.
//!
//! Archive entry names are untrusted. These helpers resolve an entry name
//! against an install root purely lexically, without touching the filesystem,
//! and reject anything that would land outside the root.

use anyhow::{Result, anyhow, bail};
use std::path::{Component, Path, PathBuf};

/// Normalize a stored entry name to forward slashes.
#[must_use]
pub fn normalize_separators(name: &str) -> String {
    name.replace('\\', "/")
}

/// Validates that a relative path has no absolute root, drive prefix, or NUL byte.
///
/// # Errors
///
/// Returns an error describing the first problem found.
pub fn validate_relative(path: &str) -> Result<()> {
    if path.contains('\0') {
        bail!("Path contains a NUL byte: {path:?}");
    }
    if path.starts_with('/') {
        bail!("Absolute path not allowed: {path}");
    }

    let bytes = path.as_bytes();
    if bytes.len() >= 2 && bytes[0].is_ascii_alphabetic() && bytes[1] == b':' {
        bail!("Drive-qualified path not allowed: {path}");
    }
    Ok(())
}

/// Resolve `relative` under `base` by lexical normalization.
///
/// Backslashes are treated as separators. `.` segments are dropped and `..`
/// pops the previous segment; popping past `base` is an error.
///
/// # Errors
///
/// Returns an error if the path is absolute, drive-qualified, escapes `base`,
/// or names nothing.
///
/// # Examples
///
/// ```rust
/// use prelaunch_cli::utils::path_validation::resolve_within;
/// use std::path::Path;
///
/// let root = Path::new("/games/arena");
/// assert_eq!(
///     resolve_within(root, "plugins\\arena\\./mod.dll").unwrap(),
///     root.join("plugins").join("arena").join("mod.dll")
/// );
/// assert!(resolve_within(root, "../../evil.txt").is_err());
/// ```
pub fn resolve_within(base: &Path, relative: &str) -> Result<PathBuf> {
    let normalized = normalize_separators(relative);
    validate_relative(&normalized)?;

    let mut segments: Vec<&str> = Vec::new();
    for segment in normalized.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                if segments.pop().is_none() {
                    return Err(anyhow!("Path escapes the install root: {relative}"));
                }
            }
            other => segments.push(other),
        }
    }

    if segments.is_empty() {
        bail!("Path resolves to the install root itself: {relative:?}");
    }

    let mut resolved = base.to_path_buf();
    resolved.extend(segments);
    Ok(resolved)
}

/// Comparison form of a path: `/` separators, `.` segments dropped, lowercased.
///
/// Two paths with equal keys are treated as the same file on case-insensitive
/// filesystems.
#[must_use]
pub fn comparison_key(path: &Path) -> String {
    path.components()
        .filter(|component| !matches!(component, Component::CurDir))
        .map(|component| component.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
        .replace('\\', "/")
        .to_lowercase()
}
