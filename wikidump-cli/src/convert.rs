//! Convert command implementation for the wikidump CLI.

use camino::Utf8PathBuf;
use clap::Parser;
use log::info;
use ortho_config::{OrthoConfig, SubcmdConfigMerge};
use serde::{Deserialize, Serialize};
use wikidump_data::dump::{
    ConvertedDatabase, DEFAULT_LOADER, DEFAULT_TRANSLITERATOR, DumpConverter, LanguageCode,
};

use crate::fetch::parse_language;
use crate::{
    ARG_LANGUAGE, ARG_LOADER, ARG_OUTPUT_DIR, ARG_TRANSLITERATOR, CliError, DEFAULT_OUTPUT_DIR,
    ENV_CONVERT_LANGUAGE, current_thread_runtime,
};

/// CLI arguments for the `convert` subcommand.
#[derive(Debug, Clone, Parser, Deserialize, Serialize, OrthoConfig, Default)]
#[command(
    long_about = "Pipe <output-dir>/<language>.sql through a MySQL-to-SQLite \
                 transliterator into a SQLite loader, producing \
                 <output-dir>/<language>.db.",
    about = "Convert an extracted dump into a SQLite database"
)]
#[ortho_config(prefix = "WIKIDUMP")]
pub(crate) struct ConvertArgs {
    /// Language edition whose extracted dump is converted.
    #[arg(value_name = "language")]
    #[serde(default)]
    pub(crate) language: Option<String>,
    /// Directory holding `<language>.sql` and receiving `<language>.db`.
    #[arg(long = ARG_OUTPUT_DIR, value_name = "dir")]
    #[serde(default)]
    pub(crate) output_dir: Option<Utf8PathBuf>,
    /// Program rewriting the MySQL dump as SQLite statements.
    #[arg(long = ARG_TRANSLITERATOR, value_name = "program")]
    #[serde(default)]
    pub(crate) transliterator: Option<String>,
    /// Program loading SQL from stdin into the database.
    #[arg(long = ARG_LOADER, value_name = "program")]
    #[serde(default)]
    pub(crate) loader: Option<String>,
}

impl ConvertArgs {
    pub(crate) fn into_config(self) -> Result<ConvertConfig, CliError> {
        let merged = self.load_and_merge().map_err(CliError::Configuration)?;
        ConvertConfig::try_from(merged)
    }
}

/// Resolved `convert` command configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ConvertConfig {
    pub(crate) language: LanguageCode,
    pub(crate) output_dir: Utf8PathBuf,
    pub(crate) transliterator: String,
    pub(crate) loader: String,
}

impl ConvertConfig {
    pub(crate) fn converter(&self) -> DumpConverter {
        DumpConverter::new(self.output_dir.as_std_path())
            .with_transliterator(self.transliterator.clone())
            .with_loader(self.loader.clone())
    }
}

impl TryFrom<ConvertArgs> for ConvertConfig {
    type Error = CliError;

    fn try_from(args: ConvertArgs) -> Result<Self, Self::Error> {
        let code = args.language.ok_or(CliError::MissingArgument {
            field: ARG_LANGUAGE,
            env: ENV_CONVERT_LANGUAGE,
        })?;
        Ok(Self {
            language: parse_language(&code)?,
            output_dir: args
                .output_dir
                .unwrap_or_else(|| Utf8PathBuf::from(DEFAULT_OUTPUT_DIR)),
            transliterator: args
                .transliterator
                .unwrap_or_else(|| DEFAULT_TRANSLITERATOR.to_owned()),
            loader: args.loader.unwrap_or_else(|| DEFAULT_LOADER.to_owned()),
        })
    }
}

pub(crate) fn run_convert(args: ConvertArgs) -> Result<(), CliError> {
    let config = args.into_config()?;
    let runtime = current_thread_runtime()?;
    let database = runtime.block_on(execute_convert(&config))?;
    info!(
        "{}: wrote {}",
        config.language,
        database.output_path.display()
    );
    Ok(())
}

pub(crate) async fn execute_convert(config: &ConvertConfig) -> Result<ConvertedDatabase, CliError> {
    let database = config.converter().convert(&config.language).await?;
    Ok(database)
}
