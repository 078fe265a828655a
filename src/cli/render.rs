//! Console rendering of a pipeline run.

use colored::Colorize;
use std::sync::Mutex;

use crate::fetch::{ProgressEvent, ProgressObserver};
use crate::pipeline::{Phase, PipelineObserver};
use crate::source::ReleaseCandidate;
use crate::utils::progress::ProgressBar;

/// Prints phase headlines and drives a download bar.
pub struct ConsoleObserver {
    quiet: bool,
    show_progress: bool,
    bar: Mutex<Option<ProgressBar>>,
    file_name: Mutex<Option<String>>,
}

impl ConsoleObserver {
    pub const fn new(quiet: bool, show_progress: bool) -> Self {
        Self {
            quiet,
            show_progress,
            bar: Mutex::new(None),
            file_name: Mutex::new(None),
        }
    }

    fn clear_bar(&self) {
        if let Ok(mut bar) = self.bar.lock() {
            if let Some(bar) = bar.take() {
                bar.finish_and_clear();
            }
        }
    }

    fn headline(&self, text: &str) {
        if !self.quiet {
            println!("{} {}", "→".cyan(), text);
        }
    }
}

impl ProgressObserver for ConsoleObserver {
    fn on_progress(&self, event: ProgressEvent) {
        if !self.show_progress || self.quiet {
            return;
        }
        let Ok(mut slot) = self.bar.lock() else {
            return;
        };

        let bar = slot.get_or_insert_with(|| {
            let bar = event.total.map_or_else(ProgressBar::new_spinner, ProgressBar::new_download);
            if let Ok(name) = self.file_name.lock() {
                if let Some(name) = name.as_deref() {
                    bar.set_message(name);
                }
            }
            bar
        });
        bar.set_position(event.downloaded);
    }
}

impl PipelineObserver for ConsoleObserver {
    fn on_phase(&self, phase: Phase) {
        if phase != Phase::Fetching {
            self.clear_bar();
        }

        match phase {
            Phase::Locating => self.headline("Checking for updates"),
            Phase::Fetching => self.headline("Downloading"),
            Phase::Installing => self.headline("Installing"),
            Phase::Sweeping => self.headline("Cleaning up old downloads"),
            Phase::Start | Phase::Deciding | Phase::Skip | Phase::Done | Phase::Failed => {}
        }
    }

    fn on_candidate(&self, candidate: &ReleaseCandidate) {
        if let Ok(mut name) = self.file_name.lock() {
            *name = Some(candidate.file_name.clone());
        }
        if !self.quiet {
            let version = candidate.version_label().unwrap_or_else(|| "unversioned".to_string());
            println!("  Latest release: {} ({})", version.bold(), candidate.file_name);
        }
    }
}
