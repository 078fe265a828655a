//! Run records.
//!
//! Two plain-text files in the install root tell a launcher (or a person) what
//! the last run did:
//!
//! - the success marker, overwritten on every successful run
//! - the error log, appended to on every failed run
//!
//! Each line starts with an RFC 3339 timestamp.

use chrono::{Local, SecondsFormat};
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::config::RunContext;
use crate::core::{UpdaterError, UpdaterResult};

pub struct RunRecorder {
    success_marker: PathBuf,
    error_log: PathBuf,
}

impl RunRecorder {
    pub fn new(success_marker: impl Into<PathBuf>, error_log: impl Into<PathBuf>) -> Self {
        Self {
            success_marker: success_marker.into(),
            error_log: error_log.into(),
        }
    }

    #[must_use]
    pub fn from_context(context: &RunContext) -> Self {
        Self::new(&context.success_marker, &context.error_log)
    }

    /// Replace the success marker with a single timestamped line.
    pub fn record_success(&self, message: &str) -> UpdaterResult<()> {
        ensure_parent(&self.success_marker)?;
        let line = format!("{} {}\n", timestamp(), message);
        fs::write(&self.success_marker, line)
            .map_err(|e| UpdaterError::fs("write success marker", &self.success_marker, &e))?;
        debug!("Wrote success marker {}", self.success_marker.display());
        Ok(())
    }

    /// Append a timestamped line describing `error` to the error log.
    pub fn record_failure(&self, error: &UpdaterError) -> UpdaterResult<()> {
        ensure_parent(&self.error_log)?;
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.error_log)
            .map_err(|e| UpdaterError::fs("open error log", &self.error_log, &e))?;

        // One record per line even when the message spans several
        let message = error.to_string().replace(['\r', '\n'], " ");
        writeln!(file, "{} {}", timestamp(), message)
            .map_err(|e| UpdaterError::fs("append error log", &self.error_log, &e))?;
        debug!("Appended to error log {}", self.error_log.display());
        Ok(())
    }

    #[must_use]
    pub fn success_marker(&self) -> &Path {
        &self.success_marker
    }

    #[must_use]
    pub fn error_log(&self) -> &Path {
        &self.error_log
    }
}

fn timestamp() -> String {
    Local::now().to_rfc3339_opts(SecondsFormat::Secs, false)
}

fn ensure_parent(path: &Path) -> UpdaterResult<()> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => {
            fs::create_dir_all(parent).map_err(|e| UpdaterError::fs("create directory", parent, &e))
        }
        _ => Ok(()),
    }
}
