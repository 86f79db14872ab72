//! Progress notifications emitted while fetching dumps.

use std::fmt;

use super::LanguageCode;

/// Pipeline stage a progress notification refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    /// Streaming the compressed archive from the dump server.
    Download,
    /// Decompressing the archive into the SQL dump.
    Extract,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Download => "Downloading",
            Self::Extract => "Extracting",
        })
    }
}

/// Receives progress notifications from the pipeline.
///
/// Notifications are purely informational and never influence control flow.
/// Implementations must be shareable with the blocking extraction task.
pub trait ProgressReporter: Send + Sync {
    /// A language from a batch is about to be fetched. `position` is 1-based.
    fn language_started(&self, position: usize, total: usize, language: &LanguageCode);

    /// A stage began. `total` is the expected byte count when known.
    fn stage_started(&self, stage: Stage, total: Option<u64>);

    /// Cumulative bytes processed by the current stage.
    fn stage_advanced(&self, stage: Stage, position: u64);

    /// The current stage finished successfully.
    fn stage_finished(&self, stage: Stage);
}

/// Reporter that discards every notification.
#[derive(Debug, Clone, Copy, Default)]
pub struct SilentProgress;

impl ProgressReporter for SilentProgress {
    fn language_started(&self, _position: usize, _total: usize, _language: &LanguageCode) {}

    fn stage_started(&self, _stage: Stage, _total: Option<u64>) {}

    fn stage_advanced(&self, _stage: Stage, _position: u64) {}

    fn stage_finished(&self, _stage: Stage) {}
}
