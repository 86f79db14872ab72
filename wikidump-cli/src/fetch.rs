//! Fetch command implementation for the wikidump CLI.

use std::sync::Arc;

use camino::{Utf8Path, Utf8PathBuf};
use clap::Parser;
use log::info;
use ortho_config::{OrthoConfig, SubcmdConfigMerge};
use serde::{Deserialize, Serialize};
use wikidump_data::dump::{
    DEFAULT_BASE_URL, DEFAULT_USER_AGENT, DumpSource, FetchLog, FetchPipeline, FetchReport,
    HttpDumpSource, LanguageCode, LanguageFile, LanguageSupplier, ProgressReporter,
    SilentProgress,
};

use crate::{
    ARG_BASE_URL, ARG_FETCH_LOG, ARG_LANGUAGE, ARG_LANGUAGES, ARG_OUTPUT_DIR, ARG_USER_AGENT,
    CliError, DEFAULT_OUTPUT_DIR, ENV_FETCH_LANGUAGE, ENV_FETCH_LANGUAGES, TerminalProgress,
    current_thread_runtime,
};

/// CLI arguments for the `fetch` subcommand.
#[derive(Debug, Clone, Parser, Deserialize, Serialize, OrthoConfig, Default)]
#[command(
    long_about = "Resolve the latest external-links dump for a language from \
                 its RSS feed, download the archive and extract it to \
                 <output-dir>/<language>.sql. With --all, every language in \
                 the --languages file is fetched in order.",
    about = "Download and extract the latest dump"
)]
#[ortho_config(prefix = "WIKIDUMP")]
pub(crate) struct FetchArgs {
    /// Language edition to fetch, e.g. `en` or `be_tarask`.
    #[arg(value_name = "language")]
    #[serde(default)]
    pub(crate) language: Option<String>,
    /// Fetch every language listed in the `--languages` file.
    #[arg(long)]
    #[serde(default)]
    pub(crate) all: bool,
    /// File listing one language per line, used with `--all`.
    #[arg(long = ARG_LANGUAGES, value_name = "path")]
    #[serde(default)]
    pub(crate) languages: Option<Utf8PathBuf>,
    /// Directory receiving archives and extracted dumps (default `files`).
    #[arg(long = ARG_OUTPUT_DIR, value_name = "dir")]
    #[serde(default)]
    pub(crate) output_dir: Option<Utf8PathBuf>,
    /// Dump server endpoint.
    #[arg(long = ARG_BASE_URL, value_name = "url")]
    #[serde(default)]
    pub(crate) base_url: Option<String>,
    /// User agent sent to the dump server.
    #[arg(long = ARG_USER_AGENT, value_name = "agent")]
    #[serde(default)]
    pub(crate) user_agent: Option<String>,
    /// SQLite file recording each completed fetch.
    #[arg(long = ARG_FETCH_LOG, value_name = "path")]
    #[serde(default)]
    pub(crate) fetch_log: Option<Utf8PathBuf>,
    /// Suppress progress bars.
    #[arg(long)]
    #[serde(default)]
    pub(crate) quiet: bool,
}

impl FetchArgs {
    pub(crate) fn into_config(self) -> Result<FetchConfig, CliError> {
        let merged = self.load_and_merge().map_err(CliError::Configuration)?;
        FetchConfig::try_from(merged)
    }
}

/// Languages selected for a fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum FetchTarget {
    /// A single language edition.
    One(LanguageCode),
    /// Every language listed in a file.
    All(Utf8PathBuf),
}

/// Resolved `fetch` command configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct FetchConfig {
    pub(crate) target: FetchTarget,
    pub(crate) output_dir: Utf8PathBuf,
    pub(crate) base_url: String,
    pub(crate) user_agent: String,
    pub(crate) fetch_log: Option<Utf8PathBuf>,
    pub(crate) quiet: bool,
}

impl FetchConfig {
    pub(crate) fn validate_sources(&self) -> Result<(), CliError> {
        match &self.target {
            FetchTarget::All(path) => require_existing(path, ARG_LANGUAGES),
            FetchTarget::One(_) => Ok(()),
        }
    }
}

pub(crate) fn require_existing(path: &Utf8Path, field: &'static str) -> Result<(), CliError> {
    match wikidump_fs::file_is_file(path) {
        Ok(true) => Ok(()),
        Ok(false) => Err(CliError::SourcePathNotFile {
            field,
            path: path.to_path_buf(),
        }),
        Err(source) if source.kind() == std::io::ErrorKind::NotFound => {
            Err(CliError::MissingSourceFile {
                field,
                path: path.to_path_buf(),
            })
        }
        Err(source) => Err(CliError::InspectSourcePath {
            field,
            path: path.to_path_buf(),
            source,
        }),
    }
}

pub(crate) fn parse_language(code: &str) -> Result<LanguageCode, CliError> {
    LanguageCode::new(code).map_err(|source| CliError::InvalidLanguage {
        code: code.to_owned(),
        source,
    })
}

impl TryFrom<FetchArgs> for FetchConfig {
    type Error = CliError;

    fn try_from(args: FetchArgs) -> Result<Self, Self::Error> {
        let target = match (args.all, args.language) {
            (true, Some(_)) => return Err(CliError::ConflictingTargets),
            (true, None) => FetchTarget::All(args.languages.ok_or(
                CliError::MissingArgument {
                    field: ARG_LANGUAGES,
                    env: ENV_FETCH_LANGUAGES,
                },
            )?),
            (false, Some(code)) => FetchTarget::One(parse_language(&code)?),
            (false, None) => {
                return Err(CliError::MissingArgument {
                    field: ARG_LANGUAGE,
                    env: ENV_FETCH_LANGUAGE,
                });
            }
        };
        Ok(Self {
            target,
            output_dir: args
                .output_dir
                .unwrap_or_else(|| Utf8PathBuf::from(DEFAULT_OUTPUT_DIR)),
            base_url: args
                .base_url
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_owned()),
            user_agent: args
                .user_agent
                .unwrap_or_else(|| DEFAULT_USER_AGENT.to_owned()),
            fetch_log: args.fetch_log,
            quiet: args.quiet,
        })
    }
}

/// Outcome of a successful fetch invocation.
#[derive(Debug)]
pub(crate) enum FetchSummary {
    One(Box<FetchReport>),
    All { fetched: usize },
}

pub(crate) fn run_fetch(args: FetchArgs) -> Result<(), CliError> {
    let config = resolve_fetch_config(args)?;
    let source = HttpDumpSource::new(config.base_url.clone())
        .map_err(|source| CliError::BuildSource {
            base_url: config.base_url.clone(),
            source,
        })?
        .with_user_agent(config.user_agent.clone());
    let progress: Arc<dyn ProgressReporter> = if config.quiet {
        Arc::new(SilentProgress)
    } else {
        Arc::new(TerminalProgress::new())
    };
    let runtime = current_thread_runtime()?;
    match runtime.block_on(execute_fetch(&config, &source, progress))? {
        FetchSummary::One(report) => info!(
            "{}: fetched {}",
            report.language,
            report.extracted.output_path.display()
        ),
        FetchSummary::All { fetched } => info!("fetched {fetched} languages"),
    }
    Ok(())
}

fn resolve_fetch_config(args: FetchArgs) -> Result<FetchConfig, CliError> {
    let config = args.into_config()?;
    config.validate_sources()?;
    Ok(config)
}

/// Run a resolved fetch against `source`.
///
/// Batch runs attempt every listed language and fail afterwards if any of
/// them failed.
pub(crate) async fn execute_fetch<S: DumpSource + ?Sized>(
    config: &FetchConfig,
    source: &S,
    progress: Arc<dyn ProgressReporter>,
) -> Result<FetchSummary, CliError> {
    wikidump_fs::ensure_dir(&config.output_dir).map_err(|source| {
        CliError::PrepareOutputDirectory {
            path: config.output_dir.clone(),
            source,
        }
    })?;
    let log = config.fetch_log.as_deref().map(open_fetch_log).transpose()?;
    let mut pipeline =
        FetchPipeline::new(source, config.output_dir.as_std_path()).with_progress(progress);
    if let Some(log) = log.as_ref() {
        pipeline = pipeline.with_log(log);
    }

    match &config.target {
        FetchTarget::One(language) => {
            let report = pipeline.run_one(language).await?;
            Ok(FetchSummary::One(Box::new(report)))
        }
        FetchTarget::All(path) => {
            let languages = LanguageFile::new(path.as_std_path()).languages()?;
            let total = languages.len();
            let outcomes = pipeline.run_all(&languages).await;
            let failed = outcomes
                .iter()
                .filter(|outcome| outcome.result.is_err())
                .count();
            if failed > 0 {
                return Err(CliError::FetchFailures { failed, total });
            }
            Ok(FetchSummary::All { fetched: total })
        }
    }
}

fn open_fetch_log(path: &Utf8Path) -> Result<FetchLog, CliError> {
    wikidump_fs::ensure_parent_dir(path).map_err(|source| CliError::PrepareOutputDirectory {
        path: path.to_path_buf(),
        source,
    })?;
    FetchLog::initialise(path.as_std_path()).map_err(|source| CliError::OpenFetchLog {
        path: path.to_path_buf(),
        source: Box::new(source),
    })
}

#[cfg(test)]
pub(crate) fn config_from_layers_for_test(
    layers: Vec<ortho_config::MergeLayer<'static>>,
) -> Result<FetchConfig, CliError> {
    let merged = FetchArgs::merge_from_layers(layers).map_err(CliError::from)?;
    FetchConfig::try_from(merged)
}
