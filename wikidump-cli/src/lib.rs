//! Command-line interface for fetching and converting Wikipedia dumps.
#![forbid(unsafe_code)]

use clap::{Parser, Subcommand};

mod convert;
mod error;
mod fetch;
mod progress;

pub use error::CliError;
pub use progress::TerminalProgress;

use convert::{ConvertArgs, run_convert};
use fetch::{FetchArgs, run_fetch};

pub(crate) const ARG_LANGUAGE: &str = "language";
pub(crate) const ARG_LANGUAGES: &str = "languages";
pub(crate) const ARG_OUTPUT_DIR: &str = "output-dir";
pub(crate) const ARG_BASE_URL: &str = "base-url";
pub(crate) const ARG_USER_AGENT: &str = "user-agent";
pub(crate) const ARG_FETCH_LOG: &str = "fetch-log";
pub(crate) const ARG_TRANSLITERATOR: &str = "transliterator";
pub(crate) const ARG_LOADER: &str = "loader";
pub(crate) const ENV_FETCH_LANGUAGE: &str = "WIKIDUMP_CMDS_FETCH_LANGUAGE";
pub(crate) const ENV_FETCH_LANGUAGES: &str = "WIKIDUMP_CMDS_FETCH_LANGUAGES";
pub(crate) const ENV_CONVERT_LANGUAGE: &str = "WIKIDUMP_CMDS_CONVERT_LANGUAGE";

/// Directory receiving archives, dumps and databases unless overridden.
pub const DEFAULT_OUTPUT_DIR: &str = "files";

/// Run the wikidump CLI with the current process arguments and environment.
pub fn run() -> Result<(), CliError> {
    let cli = Cli::try_parse().map_err(CliError::ArgumentParsing)?;
    match cli.command {
        Command::Fetch(args) => run_fetch(args),
        Command::Convert(args) => run_convert(args),
    }
}

#[derive(Debug, Parser)]
#[command(
    name = "wikidump",
    about = "Fetch Wikipedia external-links dumps and convert them to SQLite",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Download and extract the latest dump for one or many languages.
    Fetch(FetchArgs),
    /// Convert an extracted dump into a SQLite database.
    Convert(ConvertArgs),
}

fn current_thread_runtime() -> Result<tokio::runtime::Runtime, CliError> {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(CliError::Runtime)
}

#[cfg(test)]
mod tests;
