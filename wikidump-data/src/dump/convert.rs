use log::{debug, info, warn};
use std::{path::PathBuf, process::Stdio};
use tokio::process::{Child, Command};

use super::{ConversionError, ConvertedDatabase, LanguageCode};

/// Program rewriting a MySQL dump into SQLite statements.
pub const DEFAULT_TRANSLITERATOR: &str = "mysql2sqlite";
/// Program loading SQL statements from stdin into a database file.
pub const DEFAULT_LOADER: &str = "sqlite3";

/// Converts extracted SQL dumps into SQLite databases by piping them through
/// two external programs.
///
/// The transliterator receives `<output_dir>/<language>.sql` as its only
/// argument and writes statements to stdout; the loader receives
/// `<output_dir>/<language>.db` and reads those statements from stdin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DumpConverter {
    output_dir: PathBuf,
    transliterator: String,
    loader: String,
}

impl DumpConverter {
    /// Construct a converter using the default programs.
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
            transliterator: DEFAULT_TRANSLITERATOR.to_owned(),
            loader: DEFAULT_LOADER.to_owned(),
        }
    }

    /// Override the transliterating program (name on `PATH` or a path).
    #[must_use]
    pub fn with_transliterator(mut self, program: impl Into<String>) -> Self {
        self.transliterator = program.into();
        self
    }

    /// Override the loading program (name on `PATH` or a path).
    #[must_use]
    pub fn with_loader(mut self, program: impl Into<String>) -> Self {
        self.loader = program.into();
        self
    }

    /// Location of the extracted dump consumed for `language`.
    pub fn input_path(&self, language: &LanguageCode) -> PathBuf {
        self.output_dir.join(language.sql_file_name())
    }

    /// Location of the database produced for `language`.
    pub fn output_path(&self, language: &LanguageCode) -> PathBuf {
        self.output_dir.join(language.database_file_name())
    }

    /// Convert the extracted dump for `language`.
    ///
    /// Both programs run concurrently and are awaited. When the loader
    /// cannot be started the transliterator is killed before returning.
    pub async fn convert(
        &self,
        language: &LanguageCode,
    ) -> Result<ConvertedDatabase, ConversionError> {
        let input = self.input_path(language);
        if !input.is_file() {
            return Err(ConversionError::MissingInput { path: input });
        }
        let output = self.output_path(language);
        let transliterator = locate(&self.transliterator)?;
        let loader = locate(&self.loader)?;

        info!("{language}: converting {} to {}", input.display(), output.display());
        let mut producer = spawn(
            Command::new(&transliterator)
                .arg(&input)
                .stdout(Stdio::piped()),
            &self.transliterator,
        )?;
        let piped = match pipe_stdout(&mut producer, &self.transliterator) {
            Ok(stdio) => stdio,
            Err(err) => {
                reap(&mut producer, &self.transliterator).await;
                return Err(err);
            }
        };
        let mut consumer = match spawn(
            Command::new(&loader).arg(&output).stdin(piped),
            &self.loader,
        ) {
            Ok(child) => child,
            Err(err) => {
                reap(&mut producer, &self.transliterator).await;
                return Err(err);
            }
        };

        let (produced, consumed) = tokio::join!(producer.wait(), consumer.wait());
        check_exit(produced, &self.transliterator)?;
        check_exit(consumed, &self.loader)?;
        Ok(ConvertedDatabase {
            output_path: output,
        })
    }
}

fn locate(program: &str) -> Result<PathBuf, ConversionError> {
    which::which(program).map_err(|source| ConversionError::ProgramNotFound {
        program: program.to_owned(),
        source,
    })
}

fn spawn(command: &mut Command, program: &str) -> Result<Child, ConversionError> {
    debug!("launching {command:?}");
    command
        .kill_on_drop(true)
        .spawn()
        .map_err(|source| ConversionError::Spawn {
            program: program.to_owned(),
            source,
        })
}

fn pipe_stdout(child: &mut Child, program: &str) -> Result<Stdio, ConversionError> {
    let stdout = child.stdout.take().ok_or_else(|| ConversionError::Pipe {
        program: program.to_owned(),
        source: std::io::Error::other("stdout was not captured"),
    })?;
    stdout.try_into().map_err(|source| ConversionError::Pipe {
        program: program.to_owned(),
        source,
    })
}

async fn reap(child: &mut Child, program: &str) {
    if let Err(err) = child.kill().await {
        warn!("failed to stop {program:?}: {err}");
    }
}

fn check_exit(
    outcome: std::io::Result<std::process::ExitStatus>,
    program: &str,
) -> Result<(), ConversionError> {
    let status = outcome.map_err(|source| ConversionError::Wait {
        program: program.to_owned(),
        source,
    })?;
    if status.success() {
        Ok(())
    } else {
        Err(ConversionError::Failed {
            program: program.to_owned(),
            status,
        })
    }
}
