//! Progress indicators for terminal output
//!
//! Thin wrapper over `indicatif` with consistent styling. Bars are hidden when
//! progress is disabled, so callers never need to branch on it.
//!
//! # Environment Variables
//!
//! - `PRELAUNCH_NO_PROGRESS`: Set to any value to disable all progress indicators
//!
//! # Examples
//!
//! ```rust
//! use prelaunch_cli::utils::progress::ProgressBar;
//!
//! let bar = ProgressBar::new_download(2048);
//! bar.set_message("game-1.10.0.zip");
//! bar.set_position(1024);
//! bar.finish_and_clear();
//! ```

use indicatif::{ProgressBar as IndicatifBar, ProgressStyle as IndicatifStyle};
use std::time::Duration;

/// Environment variable that disables progress indicators.
pub const NO_PROGRESS_ENV: &str = "PRELAUNCH_NO_PROGRESS";

/// Checks if progress bars should be disabled.
///
/// ```bash
/// export PRELAUNCH_NO_PROGRESS=1
/// prelaunch run   # no progress bars
/// ```
#[must_use]
pub fn is_progress_disabled() -> bool {
    std::env::var_os(NO_PROGRESS_ENV).is_some()
}

/// A progress bar with consistent styling.
#[derive(Clone)]
pub struct ProgressBar {
    inner: IndicatifBar,
}

impl ProgressBar {
    /// Byte-count bar for a download of known size.
    #[must_use]
    pub fn new_download(total_bytes: u64) -> Self {
        let bar = if is_progress_disabled() {
            IndicatifBar::hidden()
        } else {
            let bar = IndicatifBar::new(total_bytes);
            bar.set_style(ProgressStyle::download());
            bar
        };
        Self {
            inner: bar,
        }
    }

    /// Spinner for downloads of unknown size.
    #[must_use]
    pub fn new_spinner() -> Self {
        let bar = if is_progress_disabled() {
            IndicatifBar::hidden()
        } else {
            let bar = IndicatifBar::new_spinner();
            bar.set_style(ProgressStyle::spinner());
            bar.enable_steady_tick(Duration::from_millis(100));
            bar
        };
        Self {
            inner: bar,
        }
    }

    /// A bar that never draws.
    #[must_use]
    pub fn hidden() -> Self {
        Self {
            inner: IndicatifBar::hidden(),
        }
    }

    pub fn set_message(&self, msg: impl Into<String>) {
        self.inner.set_message(msg.into());
    }

    pub fn set_position(&self, pos: u64) {
        self.inner.set_position(pos);
    }

    #[must_use]
    pub fn position(&self) -> u64 {
        self.inner.position()
    }

    pub fn finish_with_message(&self, msg: impl Into<String>) {
        self.inner.finish_with_message(msg.into());
    }

    pub fn finish_and_clear(&self) {
        self.inner.finish_and_clear();
    }
}

/// Predefined styles.
pub struct ProgressStyle;

impl ProgressStyle {
    /// ```text
    /// [━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━] 2.1MB/2.1MB (00:05) game-1.10.0.zip
    /// ```
    #[must_use]
    pub fn download() -> IndicatifStyle {
        IndicatifStyle::default_bar()
            .template("{prefix:.bold.cyan} [{bar:40.cyan/blue}] {bytes}/{total_bytes} ({eta}) {msg}")
            .map(|style| style.progress_chars("━╸━"))
            .unwrap_or_else(|_| IndicatifStyle::default_bar())
    }

    /// ```text
    /// ⠋ 1.4MB game.zip
    /// ```
    #[must_use]
    pub fn spinner() -> IndicatifStyle {
        IndicatifStyle::default_spinner()
            .template("{prefix:.bold} {spinner:.cyan} {bytes} {msg}")
            .map(|style| style.tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]))
            .unwrap_or_else(|_| IndicatifStyle::default_spinner())
    }
}
