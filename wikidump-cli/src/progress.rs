//! Terminal progress display for fetches.

use std::sync::{Mutex, PoisonError};

use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use wikidump_data::dump::{LanguageCode, ProgressReporter, Stage};

const BAR_TEMPLATE: &str =
    "{msg:12} [{elapsed_precise}] [{bar:40.cyan/blue}] {bytes}/{total_bytes} ({bytes_per_sec})";
const SPINNER_TEMPLATE: &str = "{spinner:.green} {msg:12} [{elapsed_precise}] {bytes}";

/// Draws one progress bar per stage on stdout.
///
/// A bar is used when the stage total is known and a spinner otherwise.
#[derive(Default)]
pub struct TerminalProgress {
    current: Mutex<Option<ProgressBar>>,
}

impl TerminalProgress {
    /// Construct a reporter with no active bar.
    pub fn new() -> Self {
        Self::default()
    }

    fn with_current(&self, action: impl FnOnce(&ProgressBar)) {
        let guard = self.current.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(bar) = guard.as_ref() {
            action(bar);
        }
    }
}

fn stage_bar(total: Option<u64>) -> ProgressBar {
    let target = ProgressDrawTarget::stdout();
    match total {
        Some(length) => {
            let bar = ProgressBar::with_draw_target(Some(length), target);
            bar.set_style(
                ProgressStyle::default_bar()
                    .template(BAR_TEMPLATE)
                    .unwrap_or_else(|_| ProgressStyle::default_bar())
                    .progress_chars("#>-"),
            );
            bar
        }
        None => {
            let spinner = ProgressBar::with_draw_target(None, target);
            spinner.set_style(
                ProgressStyle::default_spinner()
                    .template(SPINNER_TEMPLATE)
                    .unwrap_or_else(|_| ProgressStyle::default_spinner()),
            );
            spinner
        }
    }
}

impl ProgressReporter for TerminalProgress {
    fn language_started(&self, position: usize, total: usize, language: &LanguageCode) {
        println!("[{position}/{total}] {language}");
    }

    fn stage_started(&self, stage: Stage, total: Option<u64>) {
        let bar = stage_bar(total);
        bar.set_message(stage.to_string());
        let mut guard = self.current.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(previous) = guard.replace(bar) {
            previous.abandon();
        }
    }

    fn stage_advanced(&self, _stage: Stage, position: u64) {
        self.with_current(|bar| bar.set_position(position));
    }

    fn stage_finished(&self, _stage: Stage) {
        let mut guard = self.current.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(bar) = guard.take() {
            bar.finish();
        }
    }
}
