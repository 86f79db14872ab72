//! Error types emitted by the wikidump CLI.
//!
//! Keep this error type reasonably small, as many CLI helpers return
//! `Result<_, CliError>` and the workspace enables `clippy::result_large_err`.

use std::sync::Arc;

use camino::Utf8PathBuf;
use thiserror::Error;
use wikidump_data::dump::{
    ConversionError, FetchLogError, LanguageCodeError, LanguageListError, PipelineError,
    TransportError,
};

/// Errors emitted by the wikidump CLI.
#[derive(Debug, Error)]
pub enum CliError {
    /// Provided arguments failed Clap validation.
    #[error(transparent)]
    ArgumentParsing(#[from] clap::Error),
    /// Configuration layering failed (files, env, CLI).
    #[error("failed to load configuration: {0}")]
    Configuration(#[from] Arc<ortho_config::OrthoError>),
    /// A required option is missing after configuration merging.
    #[error("missing {field} (set --{field} or {env})")]
    MissingArgument {
        field: &'static str,
        env: &'static str,
    },
    /// A single language and `--all` were both requested.
    #[error("pass either a language or --all, not both")]
    ConflictingTargets,
    /// The language supplied on the command line is not usable.
    #[error("invalid language {code:?}: {source}")]
    InvalidLanguage {
        code: String,
        #[source]
        source: LanguageCodeError,
    },
    /// A referenced input path does not exist on disk.
    #[error("{field} path {path:?} does not exist")]
    MissingSourceFile {
        field: &'static str,
        path: Utf8PathBuf,
    },
    /// A referenced input path exists but is not a file.
    #[error("{field} path {path:?} exists but is not a file")]
    SourcePathNotFile {
        field: &'static str,
        path: Utf8PathBuf,
    },
    /// A referenced input path could not be inspected due to an IO error.
    #[error("failed to inspect {field} path {path:?}: {source}")]
    InspectSourcePath {
        field: &'static str,
        path: Utf8PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// The output directory could not be created.
    #[error("failed to prepare output directory {path:?}: {source}")]
    PrepareOutputDirectory {
        path: Utf8PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// The async runtime could not be started.
    #[error("failed to start async runtime: {0}")]
    Runtime(#[source] std::io::Error),
    /// The HTTP client could not be built.
    #[error("failed to build HTTP client for {base_url:?}: {source}")]
    BuildSource {
        base_url: String,
        #[source]
        source: TransportError,
    },
    /// Opening the fetch log failed.
    #[error("failed to open fetch log at {path:?}: {source}")]
    OpenFetchLog {
        path: Utf8PathBuf,
        #[source]
        source: Box<FetchLogError>,
    },
    /// Reading the language list failed.
    #[error(transparent)]
    LanguageList(#[from] LanguageListError),
    /// Fetching a single language failed.
    #[error(transparent)]
    Fetch(Box<PipelineError>),
    /// Some languages of a batch fetch failed.
    #[error("{failed} of {total} languages failed to fetch")]
    FetchFailures { failed: usize, total: usize },
    /// Converting an extracted dump failed.
    #[error("conversion failed: {0}")]
    Convert(#[source] Box<ConversionError>),
}

impl From<PipelineError> for CliError {
    fn from(source: PipelineError) -> Self {
        Self::Fetch(Box::new(source))
    }
}

impl From<ConversionError> for CliError {
    fn from(source: ConversionError) -> Self {
        Self::Convert(Box::new(source))
    }
}
