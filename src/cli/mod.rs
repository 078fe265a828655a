//! Command-line interface for prelaunch.
//!
//! # Commands
//!
//! - `run` (default) - locate the latest release, download it if needed, and
//!   install it into the game directory
//! - `check` - locate and decide only; nothing is downloaded
//!
//! # Global Options
//!
//! - `--verbose` - Enable debug logging
//! - `--quiet` - Suppress all output except errors
//! - `--no-progress` - Disable progress bars and spinners
//! - `--config` - Path to a `prelaunch.toml` outside the install root
//! - `--install-root` - Game directory (defaults to the current directory)
//! - `--source-url` / `--source-kind` - Override the configured update source
//!
//! # Example
//!
//! ```bash
//! # Update the plugin in the current directory
//! prelaunch
//!
//! # Inspect what would happen, as JSON
//! prelaunch check --json --source-url https://example.com/plugin/latest.json --source-kind metadata
//! ```
//!
//! `RUST_LOG` takes precedence over `--verbose`/`--quiet` when set.

mod render;

pub use render::ConsoleObserver;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use indicatif::HumanBytes;
use std::path::{Path, PathBuf};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use crate::config::{RunContext, SourceKind, UpdaterConfig};
use crate::core::UpdaterError;
use crate::http::ReqwestBackend;
use crate::pipeline::{SyncOutcome, UpdatePipeline};
use crate::record::RunRecorder;
use crate::sync::{FetchReason, SyncDecision};
use crate::utils::progress::is_progress_disabled;

/// Main CLI structure for prelaunch.
#[derive(Parser, Debug)]
#[command(
    name = "prelaunch",
    about = "Keep a game plugin up to date before launch",
    version,
    author,
    long_about = "prelaunch finds the latest published archive of a game plugin, downloads it when the local copy is missing or stale, and unpacks it into the game directory."
)]
pub struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Enable verbose output (debug logging)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Suppress all output except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,

    /// Path to the configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Game directory to install into (defaults to the current directory)
    #[arg(long, global = true)]
    install_root: Option<PathBuf>,

    /// Update source URL, overriding the configuration file
    #[arg(long, global = true)]
    source_url: Option<String>,

    /// Kind of update source, overriding the configuration file
    #[arg(long, global = true, value_enum)]
    source_kind: Option<SourceKind>,

    /// Disable progress bars and spinners
    #[arg(long, global = true)]
    no_progress: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Update the plugin (default)
    Run,

    /// Show the latest release and whether it would be downloaded
    Check(CheckCommand),
}

#[derive(Args, Debug)]
struct CheckCommand {
    /// Print machine-readable JSON
    #[arg(long)]
    json: bool,
}

impl Cli {
    /// Execute the selected command.
    ///
    /// A failed run is returned as an error so the binary exits non-zero; it
    /// has already been written to the error log.
    pub async fn execute(self) -> Result<()> {
        self.init_logging();

        let install_root = self.resolve_install_root()?;
        let context = self.load_context(&install_root).await?;
        let backend = build_backend(&context)?;
        let pipeline = UpdatePipeline::new(&context, &backend);

        match &self.command {
            None | Some(Commands::Run) => {
                let show_progress = !self.no_progress && !is_progress_disabled();
                let observer = ConsoleObserver::new(self.quiet, show_progress);
                let report = pipeline.run(&observer).await;

                if let Some(error) = report.error() {
                    return Err(error.clone().into());
                }
                if !self.quiet {
                    print_run_summary(&report);
                }
                Ok(())
            }
            Some(Commands::Check(cmd)) => {
                let (candidate, decision) = pipeline.check().await?;
                if cmd.json {
                    let output = serde_json::json!({
                        "candidate": candidate,
                        "decision": decision,
                    });
                    println!("{}", serde_json::to_string_pretty(&output)?);
                } else {
                    let version = candidate.version_label().unwrap_or_else(|| "unversioned".to_string());
                    println!("Latest release: {}", version.bold());
                    println!("  url:   {}", candidate.download_url);
                    println!("  local: {}", decision.path().display());
                    println!("  state: {}", describe_decision(&decision));
                }
                Ok(())
            }
        }
    }

    fn init_logging(&self) {
        let filter = if std::env::var("RUST_LOG").is_ok() {
            EnvFilter::from_default_env()
        } else if self.verbose {
            EnvFilter::new("prelaunch_cli=debug,prelaunch=debug,warn")
        } else if self.quiet {
            EnvFilter::new("off")
        } else {
            EnvFilter::new("warn")
        };

        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .with_target(false)
            .try_init();
    }

    fn resolve_install_root(&self) -> Result<PathBuf> {
        match &self.install_root {
            Some(root) => Ok(root.clone()),
            None => std::env::current_dir().context("Failed to determine the current directory"),
        }
    }

    /// Load configuration, apply flag overrides, and resolve the run context.
    ///
    /// Failures after the file is read are also appended to the configured error log.
    async fn load_context(&self, install_root: &Path) -> Result<RunContext> {
        let mut config = UpdaterConfig::load(install_root, self.config.as_deref()).await?;

        if let Some(url) = &self.source_url {
            config.source.url = Some(url.clone());
        }
        if let Some(kind) = self.source_kind {
            config.source.kind = kind;
        }
        debug!("Resolved configuration: {:?}", config);

        RunContext::resolve(&config, install_root).map_err(|error| {
            record_startup_failure(install_root, &config, &error);
            error.into()
        })
    }
}

/// Build the HTTP client, logging a failure like any other aborted run.
fn build_backend(context: &RunContext) -> Result<ReqwestBackend> {
    ReqwestBackend::new(&context.http).map_err(|e| {
        let error = UpdaterError::ConfigError {
            message: format!("cannot build HTTP client: {e:#}"),
        };
        append_error_log(&RunRecorder::from_context(context), &error);
        error.into()
    })
}

fn record_startup_failure(install_root: &Path, config: &UpdaterConfig, error: &UpdaterError) {
    let recorder = RunRecorder::new(
        install_root.join(&config.records.success_marker),
        install_root.join(&config.records.error_log),
    );
    append_error_log(&recorder, error);
}

fn append_error_log(recorder: &RunRecorder, error: &UpdaterError) {
    if let Err(e) = recorder.record_failure(error) {
        debug!("Could not write error log: {}", e);
    }
}

fn describe_decision(decision: &SyncDecision) -> String {
    match decision {
        SyncDecision::AlreadyCurrent {
            artifact,
        } => format!("{} ({})", "up to date".green(), HumanBytes(artifact.size_bytes)),
        SyncDecision::Fetch {
            reason,
            ..
        } => {
            let why = match reason {
                FetchReason::Missing => "not downloaded yet".to_string(),
                FetchReason::SizeMismatch {
                    local,
                    remote,
                } => format!("size changed: {} -> {}", HumanBytes(*local), HumanBytes(*remote)),
                FetchReason::Unverified => "size could not be verified".to_string(),
            };
            format!("{} ({why})", "update available".yellow())
        }
    }
}

fn print_run_summary(report: &crate::pipeline::RunReport) {
    let version = report.version_label().unwrap_or_else(|| "unversioned".to_string());
    match &report.outcome {
        SyncOutcome::AlreadyCurrent {
            ..
        } => {
            println!("{} Version {} is already installed", "✓".green(), version.bold());
        }
        SyncOutcome::Downloaded {
            bytes,
            elapsed,
            ..
        } => {
            println!(
                "{} Updated to {}: {} file(s) installed ({} in {:.1}s)",
                "✓".green(),
                version.bold(),
                report.extracted,
                HumanBytes(*bytes),
                elapsed.as_secs_f64()
            );
            if report.swept > 0 {
                println!("  Removed {} old download(s)", report.swept);
            }
        }
        SyncOutcome::Failed {
            ..
        } => {}
    }

    if !report.entry_failures.is_empty() {
        println!(
            "{} {} archive entr{} could not be written:",
            "⚠".yellow(),
            report.entry_failures.len(),
            if report.entry_failures.len() == 1 { "y" } else { "ies" }
        );
        for failure in &report.entry_failures {
            println!("    {failure}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_command_is_run() {
        let cli = Cli::try_parse_from(["prelaunch"]).unwrap();
        assert!(cli.command.is_none());
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "prelaunch",
            "check",
            "--json",
            "--source-url",
            "https://example.com/latest.json",
            "--source-kind",
            "metadata",
        ])
        .unwrap();
        assert!(matches!(cli.command, Some(Commands::Check(CheckCommand { json: true }))));
        assert_eq!(cli.source_kind, Some(SourceKind::Metadata));
    }

    #[test]
    fn test_verbose_conflicts_with_quiet() {
        assert!(Cli::try_parse_from(["prelaunch", "--verbose", "--quiet"]).is_err());
    }

    #[test]
    fn test_http_client_failure_is_logged() {
        let root = tempfile::TempDir::new().unwrap();
        let mut config = UpdaterConfig::default();
        config.source.url = Some("https://updates.example.com/latest.json".to_string());
        config.http.client_id = "bad\nvalue".to_string();
        let context = RunContext::resolve(&config, root.path()).unwrap();

        let err = build_backend(&context).err().unwrap();
        assert!(err.to_string().contains("cannot build HTTP client"));

        let log = std::fs::read_to_string(&context.error_log).unwrap();
        assert_eq!(log.lines().count(), 1);
        assert!(log.contains("cannot build HTTP client"));
    }

    #[test]
    fn test_describe_decision() {
        let text = describe_decision(&SyncDecision::Fetch {
            path: PathBuf::from("/cache/game.zip"),
            reason: FetchReason::Missing,
        });
        assert!(text.contains("not downloaded yet"));
    }
}
