//! Error handling for prelaunch
//!
//! The error system follows two rules:
//! 1. **Strongly-typed errors** so each pipeline phase can decide what aborts and what recovers
//! 2. **User-friendly messages** with actionable suggestions when the binary reports a failure
//!
//! # Architecture
//!
//! - [`UpdaterError`] - every failure the update pipeline can produce
//! - [`ErrorClass`] - the coarse taxonomy used for propagation decisions
//! - [`ErrorContext`] - wrapper that adds details and a suggestion for display
//!
//! # Propagation
//!
//! Only [`ErrorClass::EntryWrite`] is recovered locally (by the installer, which logs
//! and skips the entry). Every other class aborts the current run; the pipeline never
//! retries. Aborts are persisted to the error log by [`crate::record::RunRecorder`].
//!
//! # Examples
//!
//! ```rust,no_run
//! use prelaunch_cli::core::{UpdaterError, user_friendly_error};
//!
//! let err = UpdaterError::SourceUnreachable {
//!     url: "https://example.com/releases/".to_string(),
//!     detail: "HTTP 503".to_string(),
//! };
//! let ctx = user_friendly_error(anyhow::Error::from(err));
//! ctx.display();
//! ```

use colored::Colorize;
use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// The main error type for update pipeline operations.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum UpdaterError {
    /// The update source could not be reached (DNS, TLS, connection, or HTTP status).
    #[error("Cannot reach update source at {url}: {detail}")]
    SourceUnreachable {
        /// URL of the listing page or metadata endpoint
        url: String,
        /// Transport status or error text for diagnostics
        detail: String,
    },

    /// The listing page did not reference any archive.
    #[error("No '{extension}' archives found at {url}")]
    NoArtifactsFound {
        /// URL of the listing page
        url: String,
        /// Archive extension that was searched for
        extension: String,
    },

    /// The metadata document lacks a required field.
    #[error("Release metadata at {url} is missing the '{field}' field")]
    MissingField {
        /// URL of the metadata endpoint
        url: String,
        /// Name of the missing field
        field: String,
    },

    /// A metadata field is present but unusable.
    #[error("Release metadata at {url} has an invalid '{field}' field: {reason}")]
    InvalidField {
        /// URL of the metadata endpoint
        url: String,
        /// Name of the invalid field
        field: String,
        /// Why the value was rejected
        reason: String,
    },

    /// Downloading the archive failed.
    #[error("Download of {url} failed: {reason}")]
    TransportError {
        /// URL of the archive
        url: String,
        /// Reason for the failure
        reason: String,
    },

    /// The archive could not be opened or is not a valid zip file.
    #[error("Cannot open archive {path}: {reason}")]
    ArchiveOpenError {
        /// Path of the archive on disk
        path: String,
        /// Reason reported by the zip reader
        reason: String,
    },

    /// A single archive entry could not be written.
    #[error("Failed to extract entry '{entry}': {reason}")]
    EntryWriteError {
        /// Entry name as stored in the archive
        entry: String,
        /// Reason the entry was skipped
        reason: String,
    },

    /// A directory or file operation failed.
    #[error("File system error during {operation} on {path}: {reason}")]
    FileSystemError {
        /// Operation being performed (e.g., "create directory")
        operation: String,
        /// Path involved
        path: String,
        /// Underlying I/O error text
        reason: String,
    },

    /// Configuration is missing or invalid.
    #[error("Configuration error: {message}")]
    ConfigError {
        /// Description of the configuration problem
        message: String,
    },
}

/// Coarse error taxonomy used to decide between abort and recover.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    SourceUnreachable,
    MalformedSource,
    Transport,
    ArchiveOpen,
    EntryWrite,
    FileSystem,
    Config,
}

impl UpdaterError {
    /// Map this error to its taxonomy class.
    #[must_use]
    pub const fn class(&self) -> ErrorClass {
        match self {
            Self::SourceUnreachable { .. } => ErrorClass::SourceUnreachable,
            Self::NoArtifactsFound { .. }
            | Self::MissingField { .. }
            | Self::InvalidField { .. } => ErrorClass::MalformedSource,
            Self::TransportError { .. } => ErrorClass::Transport,
            Self::ArchiveOpenError { .. } => ErrorClass::ArchiveOpen,
            Self::EntryWriteError { .. } => ErrorClass::EntryWrite,
            Self::FileSystemError { .. } => ErrorClass::FileSystem,
            Self::ConfigError { .. } => ErrorClass::Config,
        }
    }

    /// Whether the pipeline continues past this error.
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        matches!(self.class(), ErrorClass::EntryWrite)
    }

    /// Build a [`UpdaterError::FileSystemError`] from an I/O error.
    pub fn fs(
        operation: impl Into<String>,
        path: &std::path::Path,
        err: &std::io::Error,
    ) -> Self {
        Self::FileSystemError {
            operation: operation.into(),
            path: path.display().to_string(),
            reason: err.to_string(),
        }
    }
}

/// Error wrapper with additional details and a suggestion for the user.
#[derive(Debug)]
pub struct ErrorContext {
    /// The underlying error
    pub error: UpdaterError,
    /// Optional suggestion for resolving the error
    pub suggestion: Option<String>,
    /// Optional additional details about the error
    pub details: Option<String>,
}

impl ErrorContext {
    #[must_use]
    pub const fn new(error: UpdaterError) -> Self {
        Self {
            error,
            suggestion: None,
            details: None,
        }
    }

    #[must_use]
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    #[must_use]
    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    /// Print the error to stderr with colors.
    pub fn display(&self) {
        eprintln!("{}: {}", "error".red().bold(), self.error);

        if let Some(details) = &self.details {
            eprintln!("{}: {}", "details".yellow(), details);
        }

        if let Some(suggestion) = &self.suggestion {
            eprintln!("{}: {}", "suggestion".green(), suggestion);
        }
    }
}

impl fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.error)?;

        if let Some(details) = &self.details {
            write!(f, "\nDetails: {details}")?;
        }

        if let Some(suggestion) = &self.suggestion {
            write!(f, "\nSuggestion: {suggestion}")?;
        }

        Ok(())
    }
}

impl std::error::Error for ErrorContext {}

/// Convert any error into an [`ErrorContext`] with suggestions.
///
/// Typed [`UpdaterError`]s get tailored advice. Anything else is wrapped as a
/// configuration error carrying the full cause chain.
pub fn user_friendly_error(error: anyhow::Error) -> ErrorContext {
    if let Some(updater_error) = error.downcast_ref::<UpdaterError>() {
        return create_error_context(updater_error.clone());
    }

    if let Some(toml_error) = error.downcast_ref::<toml::de::Error>() {
        return ErrorContext::new(UpdaterError::ConfigError {
            message: toml_error.to_string(),
        })
        .with_suggestion("Check the TOML syntax in prelaunch.toml");
    }

    let mut message = error.to_string();
    let chain: Vec<String> =
        error.chain().skip(1).map(std::string::ToString::to_string).collect();

    if !chain.is_empty() {
        message.push_str("\n\nCaused by:");
        for (i, cause) in chain.iter().enumerate() {
            message.push_str(&format!("\n  {}: {}", i + 1, cause));
        }
    }

    ErrorContext::new(UpdaterError::ConfigError {
        message,
    })
}

fn create_error_context(error: UpdaterError) -> ErrorContext {
    let (suggestion, details): (String, Option<&str>) = match &error {
        UpdaterError::SourceUnreachable { url, .. } => (
            format!("Check your internet connection and that {url} is reachable from this machine"),
            Some("The release listing or metadata endpoint could not be fetched"),
        ),
        UpdaterError::NoArtifactsFound { .. } => (
            "Verify source.url points at the release listing page and that download.extension matches the published archives".to_string(),
            Some("The page was fetched but no link ended in the archive extension"),
        ),
        UpdaterError::MissingField { .. } => (
            "Set source.kind = \"listing\" if the URL is an HTML page, or fix the metadata document".to_string(),
            Some("Metadata sources must provide both \"version\" and \"url\""),
        ),
        UpdaterError::InvalidField { .. } => (
            "Fix the metadata document so \"url\" is an absolute or page-relative link".to_string(),
            Some("The field was found but its value could not be used"),
        ),
        UpdaterError::TransportError { .. } => (
            "Run the updater again; the partially downloaded archive will be replaced".to_string(),
            Some("The archive download did not complete. No files were installed"),
        ),
        UpdaterError::ArchiveOpenError { .. } => (
            "Delete the download cache directory and run the updater again".to_string(),
            Some("The downloaded file is not a readable zip archive"),
        ),
        UpdaterError::EntryWriteError { .. } => (
            "Close the game and any program holding files in the game directory".to_string(),
            None,
        ),
        UpdaterError::FileSystemError { .. } => (
            "Check that the game directory is writable and the disk is not full".to_string(),
            None,
        ),
        UpdaterError::ConfigError { .. } => (
            "Create prelaunch.toml with a [source] url, or pass --source-url".to_string(),
            None,
        ),
    };

    let ctx = ErrorContext::new(error).with_suggestion(suggestion);
    match details {
        Some(details) => ctx.with_details(details),
        None => ctx,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_classes() {
        let err = UpdaterError::NoArtifactsFound {
            url: "https://example.com".to_string(),
            extension: ".zip".to_string(),
        };
        assert_eq!(err.class(), ErrorClass::MalformedSource);
        assert!(!err.is_recoverable());

        let err = UpdaterError::MissingField {
            url: "https://example.com".to_string(),
            field: "url".to_string(),
        };
        assert_eq!(err.class(), ErrorClass::MalformedSource);

        let err = UpdaterError::EntryWriteError {
            entry: "a.txt".to_string(),
            reason: "denied".to_string(),
        };
        assert!(err.is_recoverable());
    }

    #[test]
    fn test_error_messages_include_cause() {
        let err = UpdaterError::SourceUnreachable {
            url: "https://example.com/releases".to_string(),
            detail: "HTTP 503 Service Unavailable".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("example.com/releases"));
        assert!(msg.contains("503"));
    }

    #[test]
    fn test_user_friendly_error_typed() {
        let err = UpdaterError::ArchiveOpenError {
            path: "/tmp/game.zip".to_string(),
            reason: "invalid Zip archive".to_string(),
        };
        let ctx = user_friendly_error(anyhow::Error::from(err.clone()));
        assert_eq!(ctx.error, err);
        assert!(ctx.suggestion.is_some());
        assert!(ctx.to_string().contains("Suggestion:"));
    }

    #[test]
    fn test_user_friendly_error_chain() {
        let err = anyhow::anyhow!("root cause").context("outer context");
        let ctx = user_friendly_error(err);
        let msg = ctx.to_string();
        assert!(msg.contains("outer context"));
        assert!(msg.contains("Caused by:"));
        assert!(msg.contains("root cause"));
    }
}
