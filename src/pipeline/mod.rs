//! The update pipeline.
//!
//! [`UpdatePipeline`] runs one update from discovery to cleanup:
//!
//! 1. **Locating** - the configured [`crate::source::ReleaseLocator`] picks the newest release
//! 2. **Deciding** - [`SyncPlanner`] compares it with the download cache
//! 3. **Skip**, or **Fetching** → **Installing** → **Sweeping**
//!
//! Every stage is a decision followed by one side effect. The first error
//! aborts the run in [`Phase::Failed`]; there is no retry and no rollback.
//! The outcome is written to the run records before [`UpdatePipeline::run`]
//! returns, and a failure to write those records is only logged.

mod phase;

pub use phase::Phase;

use serde::Serialize;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::config::RunContext;
use crate::core::{UpdaterError, UpdaterResult};
use crate::fetch::{ChecksumVerifier, Fetcher, NoopObserver, ProgressObserver};
use crate::http::HttpBackend;
use crate::installer::Installer;
use crate::record::RunRecorder;
use crate::retention::RetentionSweeper;
use crate::source::{ReleaseCandidate, locator_for};
use crate::sync::{SyncDecision, SyncPlanner};

/// Receives phase changes and download progress during a run.
pub trait PipelineObserver: ProgressObserver {
    /// Called on entry to every phase, in order.
    fn on_phase(&self, _phase: Phase) {}

    /// Called once the release has been located.
    fn on_candidate(&self, _candidate: &ReleaseCandidate) {}
}

impl PipelineObserver for NoopObserver {}

/// Final result of a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SyncOutcome {
    AlreadyCurrent { path: PathBuf },
    Downloaded { path: PathBuf, bytes: u64, elapsed: Duration },
    Failed { error: UpdaterError },
}

/// Everything a run did.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub candidate: Option<ReleaseCandidate>,
    pub outcome: SyncOutcome,
    /// Archive entries written by the installer.
    pub extracted: usize,
    /// Archive entries the installer skipped.
    pub entry_failures: Vec<UpdaterError>,
    /// Superseded archives deleted from the download cache.
    pub swept: usize,
    /// Every phase entered, in order.
    pub transitions: Vec<Phase>,
}

impl RunReport {
    /// `true` when the run ended in [`Phase::Done`].
    #[must_use]
    pub const fn is_success(&self) -> bool {
        !matches!(self.outcome, SyncOutcome::Failed { .. })
    }

    /// The error that aborted the run.
    #[must_use]
    pub fn error(&self) -> Option<&UpdaterError> {
        match &self.outcome {
            SyncOutcome::Failed {
                error,
            } => Some(error),
            _ => None,
        }
    }

    /// Version label of the located release, if any.
    #[must_use]
    pub fn version_label(&self) -> Option<String> {
        self.candidate.as_ref().and_then(ReleaseCandidate::version_label)
    }
}

/// State collected while a run is in flight.
struct RunTrace {
    candidate: Option<ReleaseCandidate>,
    extracted: usize,
    entry_failures: Vec<UpdaterError>,
    swept: usize,
    transitions: Vec<Phase>,
}

impl RunTrace {
    const fn new() -> Self {
        Self {
            candidate: None,
            extracted: 0,
            entry_failures: Vec::new(),
            swept: 0,
            transitions: Vec::new(),
        }
    }

    fn enter<O: PipelineObserver + ?Sized>(&mut self, phase: Phase, observer: &O) {
        if let Some(&current) = self.transitions.last() {
            debug_assert!(current.can_transition_to(phase), "invalid transition {current} -> {phase}");
        }
        info!("Phase: {}", phase);
        self.transitions.push(phase);
        observer.on_phase(phase);
    }

    fn into_report(self, outcome: SyncOutcome) -> RunReport {
        RunReport {
            candidate: self.candidate,
            outcome,
            extracted: self.extracted,
            entry_failures: self.entry_failures,
            swept: self.swept,
            transitions: self.transitions,
        }
    }
}

/// Drives one update run against a resolved [`RunContext`].
pub struct UpdatePipeline<'a> {
    context: &'a RunContext,
    backend: &'a dyn HttpBackend,
    recorder: RunRecorder,
}

impl<'a> UpdatePipeline<'a> {
    pub fn new(context: &'a RunContext, backend: &'a dyn HttpBackend) -> Self {
        Self {
            context,
            backend,
            recorder: RunRecorder::from_context(context),
        }
    }

    /// Run the pipeline to completion. Never returns an error: failures are
    /// reported in the [`RunReport`] and appended to the error log.
    pub async fn run<O: PipelineObserver + ?Sized>(&self, observer: &O) -> RunReport {
        let mut trace = RunTrace::new();
        trace.enter(Phase::Start, observer);

        match self.execute(&mut trace, observer).await {
            Ok(outcome) => {
                trace.enter(Phase::Done, observer);
                let report = trace.into_report(outcome);
                if let Err(e) = self.recorder.record_success(&success_message(&report)) {
                    warn!("Could not write success marker: {}", e);
                }
                report
            }
            Err(error) => {
                trace.enter(Phase::Failed, observer);
                warn!("Update failed: {}", error);
                if let Err(e) = self.recorder.record_failure(&error) {
                    warn!("Could not write error log: {}", e);
                }
                trace.into_report(SyncOutcome::Failed {
                    error,
                })
            }
        }
    }

    /// Locate and decide without downloading anything.
    pub async fn check(&self) -> UpdaterResult<(ReleaseCandidate, SyncDecision)> {
        let locator = locator_for(self.context);
        debug!("Checking {}", locator.describe());
        let candidate = locator.locate(self.backend).await?;
        let decision = SyncPlanner::from_context(self.context).decide(&candidate, self.backend).await?;
        Ok((candidate, decision))
    }

    async fn execute<O: PipelineObserver + ?Sized>(
        &self,
        trace: &mut RunTrace,
        observer: &O,
    ) -> UpdaterResult<SyncOutcome> {
        trace.enter(Phase::Locating, observer);
        let locator = locator_for(self.context);
        debug!("Using {}", locator.describe());
        let candidate = locator.locate(self.backend).await?;
        observer.on_candidate(&candidate);
        trace.candidate = Some(candidate.clone());

        trace.enter(Phase::Deciding, observer);
        let decision = SyncPlanner::from_context(self.context).decide(&candidate, self.backend).await?;
        let archive = match decision {
            SyncDecision::AlreadyCurrent {
                artifact,
            } => {
                trace.enter(Phase::Skip, observer);
                return Ok(SyncOutcome::AlreadyCurrent {
                    path: artifact.path,
                });
            }
            SyncDecision::Fetch {
                path,
                reason,
            } => {
                debug!("Fetching {} ({:?})", path.display(), reason);
                path
            }
        };

        trace.enter(Phase::Fetching, observer);
        let fetched = Fetcher::new(self.backend).fetch(&candidate.download_url, &archive, observer).await?;
        if let Some(expected) = &candidate.sha256 {
            ChecksumVerifier::verify_checksum(&archive, expected, candidate.download_url.as_str()).await?;
        }

        trace.enter(Phase::Installing, observer);
        let installer = Installer::new(&self.context.install_root);
        let task_archive = archive.clone();
        let installed = tokio::task::spawn_blocking(move || installer.install(&task_archive))
            .await
            .map_err(|e| UpdaterError::ArchiveOpenError {
                path: archive.display().to_string(),
                reason: format!("extraction task failed: {e}"),
            })??;
        trace.extracted = installed.extracted;
        trace.entry_failures = installed.failures;

        trace.enter(Phase::Sweeping, observer);
        trace.swept = RetentionSweeper::new(&self.context.archive_extension)
            .sweep(&archive, &self.context.download_dir)
            .await;

        Ok(SyncOutcome::Downloaded {
            path: archive,
            bytes: fetched.bytes_written,
            elapsed: fetched.elapsed,
        })
    }
}

fn success_message(report: &RunReport) -> String {
    let version = report.version_label().unwrap_or_else(|| "unversioned".to_string());
    match &report.outcome {
        SyncOutcome::AlreadyCurrent {
            path,
        } => format!("already current: version {version} ({})", path.display()),
        SyncOutcome::Downloaded {
            path,
            bytes,
            ..
        } => format!(
            "updated: version {version} ({}, {bytes} bytes, {} files extracted)",
            path.display(),
            report.extracted
        ),
        SyncOutcome::Failed {
            error,
        } => format!("failed: {error}"),
    }
}
