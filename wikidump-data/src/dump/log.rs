use std::{
    path::{Path, PathBuf},
    time::{SystemTime, UNIX_EPOCH},
};

use rusqlite::{Connection, params};

use super::{FetchLogError, FetchReport};

/// Persisted audit trail of completed fetches.
#[derive(Debug)]
pub struct FetchLog {
    connection: Connection,
    location: PathBuf,
}

impl FetchLog {
    /// Open (or create) the fetch log at the supplied path.
    pub fn initialise(path: &Path) -> Result<Self, FetchLogError> {
        let initialise_error = |source| FetchLogError::Initialise {
            source,
            path: path.to_path_buf(),
        };
        let connection = Connection::open(path).map_err(initialise_error)?;
        connection
            .execute(
                "CREATE TABLE IF NOT EXISTS fetches (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    language TEXT NOT NULL,
                    file_name TEXT,
                    url TEXT NOT NULL,
                    published_at TEXT NOT NULL,
                    archive_path TEXT NOT NULL,
                    archive_bytes INTEGER NOT NULL,
                    extracted_path TEXT NOT NULL,
                    extracted_bytes INTEGER NOT NULL,
                    fetched_at INTEGER NOT NULL
                )",
                [],
            )
            .map_err(initialise_error)?;
        Ok(Self {
            connection,
            location: path.to_path_buf(),
        })
    }

    /// Record a completed fetch.
    pub fn record(&self, report: &FetchReport) -> Result<(), FetchLogError> {
        let duration = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_err(|err| value_error("fetch timestamp", err))?;
        let fetched_at =
            i64::try_from(duration.as_secs()).map_err(|err| value_error("fetch timestamp", err))?;
        let archive_bytes = i64::try_from(report.transfer.size_on_disk)
            .map_err(|err| value_error("archive size", err))?;
        let extracted_bytes = i64::try_from(report.extracted.bytes_written)
            .map_err(|err| value_error("extracted size", err))?;
        let file_name = report.feed.file_name.as_deref();
        self.connection
            .execute(
                "INSERT INTO fetches (
                    language,
                    file_name,
                    url,
                    published_at,
                    archive_path,
                    archive_bytes,
                    extracted_path,
                    extracted_bytes,
                    fetched_at
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
                params![
                    report.language.as_ref(),
                    file_name,
                    report.transfer.url.as_ref(),
                    report.feed.item_pub_date.as_str(),
                    report.transfer.output_path.to_string_lossy().into_owned(),
                    archive_bytes,
                    report.extracted.output_path.to_string_lossy().into_owned(),
                    extracted_bytes,
                    fetched_at
                ],
            )
            .map_err(|source| FetchLogError::Record { source })?;
        Ok(())
    }

    /// Location of the underlying SQLite database.
    pub fn path(&self) -> &Path {
        &self.location
    }

    #[cfg(test)]
    pub(crate) fn connection(&self) -> &Connection {
        &self.connection
    }
}

fn value_error(
    what: &str,
    source: impl std::error::Error + Send + Sync + 'static,
) -> FetchLogError {
    FetchLogError::Value {
        what: what.to_owned(),
        source: Box::new(source),
    }
}
