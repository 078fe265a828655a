//! Test utilities for prelaunch
//!
//! This module provides helpers shared by unit tests and the integration suite:
//! - [`MockBackend`] - an in-memory [`crate::http::HttpBackend`] with canned routes
//! - [`ZipFixture`] - builds zip archives with arbitrary (even hostile) entry names
//! - [`init_test_logging`] - one-time tracing setup for tests
//!
//! # Example
//!
//! ```rust,no_run
//! use prelaunch_cli::test_utils::{MockBackend, ZipFixture};
//!
//! let archive = ZipFixture::new().file("plugin/readme.txt", "hi").build();
//! let backend = MockBackend::new()
//!     .with_text("https://example.com/latest.json", r#"{"version":"3.0","url":"game.zip"}"#)
//!     .with_bytes("https://example.com/game.zip", archive);
//! ```

pub mod fixtures;
pub mod mock_backend;

pub use fixtures::ZipFixture;
pub use mock_backend::{MockBackend, MockCall, RecordingObserver};

use std::sync::Once;
use tracing::Level;
use tracing_subscriber::EnvFilter;

/// Global flag to ensure logging is only initialized once in tests
static INIT_LOGGING: Once = Once::new();

/// Initialize logging for tests.
///
/// Uses the provided level, otherwise `RUST_LOG` when set. With neither,
/// logging stays off.
///
/// ```bash
/// RUST_LOG=debug cargo test
/// ```
pub fn init_test_logging(level: Option<Level>) {
    INIT_LOGGING.call_once(|| {
        let filter = if let Some(level) = level {
            EnvFilter::new(level.to_string())
        } else if std::env::var("RUST_LOG").is_ok() {
            EnvFilter::from_default_env()
        } else {
            return;
        };

        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .with_target(true)
            .with_thread_ids(false)
            .with_ansi(true)
            .try_init();
    });
}
