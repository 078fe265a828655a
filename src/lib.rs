//! prelaunch - keep a game plugin in sync with its latest published archive
//!
//! prelaunch runs before a game starts. It asks an update source for the newest
//! release, downloads the archive only when the local copy is missing or stale,
//! unpacks it into the game directory, and removes superseded downloads. Every
//! run leaves a record: a success marker on completion, or one appended line in
//! an error log on failure.
//!
//! # Architecture Overview
//!
//! A run is a linear pipeline of phases driven by [`pipeline::UpdatePipeline`]:
//!
//! ```text
//! Start → Locating → Deciding ─┬→ Skip ───────────────────────────→ Done
//!                              └→ Fetching → Installing → Sweeping → Done
//! (any phase) → Failed
//! ```
//!
//! Each phase is a small component that receives the resolved
//! [`config::RunContext`] at construction. Network access goes through the
//! [`http::HttpBackend`] trait so the whole pipeline can run against an
//! in-memory backend in tests.
//!
//! # Core Modules
//!
//! ## Pipeline
//! - [`pipeline`] - phase state machine, run report, and observer hooks
//! - [`source`] - release locators for HTML listing pages and JSON metadata
//! - [`sync`] - decides whether the local archive is current
//! - [`fetch`] - streaming download with progress events and checksum verification
//! - [`installer`] - zip extraction with path containment
//! - [`retention`] - removal of superseded archives
//! - [`record`] - success marker and error log
//!
//! ## Supporting Modules
//! - [`cli`] - command-line interface
//! - [`config`] - `prelaunch.toml` loading and run context resolution
//! - [`core`] - error taxonomy and user-facing error rendering
//! - [`http`] - HTTP backend trait and the reqwest implementation
//! - [`version`] - version extraction and ordering
//! - [`utils`] - path validation and progress bars
//!
//! # Example
//!
//! ```rust,no_run
//! use prelaunch_cli::config::{RunContext, UpdaterConfig};
//! use prelaunch_cli::http::ReqwestBackend;
//! use prelaunch_cli::fetch::NoopObserver;
//! use prelaunch_cli::pipeline::UpdatePipeline;
//! use std::path::Path;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let root = Path::new("/games/arena");
//! let config = UpdaterConfig::load(root, None).await?;
//! let context = RunContext::resolve(&config, root)?;
//! let backend = ReqwestBackend::new(&context.http)?;
//!
//! let report = UpdatePipeline::new(&context, &backend).run(&NoopObserver).await;
//! println!("success: {}", report.is_success());
//! # Ok(())
//! # }
//! ```

pub mod cli;
pub mod config;
pub mod core;
pub mod fetch;
pub mod http;
pub mod installer;
pub mod pipeline;
pub mod record;
pub mod retention;
pub mod source;
pub mod sync;
pub mod utils;
pub mod version;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
