//! Error types produced by the dump acquisition pipeline.

use std::{error::Error as StdError, io, path::PathBuf, process::ExitStatus};

use thiserror::Error;

use super::{DumpFileName, LanguageCode};

/// Transport-level errors encountered while issuing HTTP requests.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum TransportError {
    /// The server returned an HTTP error status.
    #[error("request to {url} failed with status {status}: {message}")]
    Http {
        /// Fully qualified request URL.
        url: String,
        /// HTTP status code.
        status: u16,
        /// Short error description supplied by the server.
        message: String,
    },
    /// The request failed due to an I/O error.
    #[error("network error contacting {url}: {source}")]
    Network {
        /// Fully qualified request URL.
        url: String,
        /// I/O error reported by the transport.
        source: io::Error,
    },
    /// The HTTP client could not be constructed.
    #[error("failed to build HTTP client: {source}")]
    Client { source: reqwest::Error },
}

impl TransportError {
    /// HTTP status code when the server answered with an error response.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Http { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Errors produced while resolving a language's dump feed.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum FeedError {
    /// The feed could not be fetched.
    #[error("failed to fetch dump feed: {source}")]
    Network { source: TransportError },
    /// The feed body was not well-formed XML.
    #[error("failed to parse dump feed {url}: {source}")]
    Malformed {
        url: String,
        source: quick_xml::Error,
    },
    /// The feed body ended early or was not a single XML document.
    #[error("dump feed {url} is incomplete: {reason}")]
    Incomplete { url: String, reason: &'static str },
    /// The feed did not contain a `channel` element.
    #[error("channel not found in dump feed {url}")]
    MissingChannel { url: String },
    /// The feed channel did not contain any `item` elements.
    #[error("no items found in dump feed {url}")]
    MissingItems { url: String },
    /// The download link in the feed could not be turned into a URL.
    #[error("feed {url} advertises an invalid download link {href:?}: {source}")]
    InvalidLink {
        url: String,
        href: String,
        source: url::ParseError,
    },
}

/// Errors produced while streaming an archive to disk.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum TransferError {
    /// The archive could not be fetched or the stream broke mid-way.
    #[error("failed to download dump archive: {source}")]
    Transport { source: TransportError },
    /// Preparing the destination directory failed.
    #[error("failed to create output directory {path:?}: {source}")]
    CreateDir { source: io::Error, path: PathBuf },
    /// Writing the archive to disk failed.
    #[error("failed to write archive to {path:?}: {source}")]
    Write { source: io::Error, path: PathBuf },
}

/// Errors produced while decompressing an archive.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ExtractionError {
    /// The compressed archive could not be opened.
    #[error("failed to open archive {path:?}: {source}")]
    OpenArchive { source: io::Error, path: PathBuf },
    /// The archive is not valid gzip data or could not be read.
    #[error("failed to decompress archive {path:?}: {source}")]
    Decode { source: io::Error, path: PathBuf },
    /// The destination file could not be created or written.
    #[error("failed to write extracted dump to {path:?}: {source}")]
    Write { source: io::Error, path: PathBuf },
}

/// Errors produced while converting an extracted dump into a database.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConversionError {
    /// The extracted dump has not been fetched yet.
    #[error("extracted dump {path:?} does not exist; fetch it first")]
    MissingInput { path: PathBuf },
    /// An external program could not be located.
    #[error("external program {program:?} not found: {source}")]
    ProgramNotFound {
        program: String,
        source: which::Error,
    },
    /// An external program could not be started.
    #[error("failed to start {program:?}: {source}")]
    Spawn { program: String, source: io::Error },
    /// The pipe between the two programs could not be established.
    #[error("failed to pipe output of {program:?}: {source}")]
    Pipe { program: String, source: io::Error },
    /// Waiting for an external program failed.
    #[error("failed to wait for {program:?}: {source}")]
    Wait { program: String, source: io::Error },
    /// An external program exited unsuccessfully.
    #[error("{program:?} exited with {status}")]
    Failed { program: String, status: ExitStatus },
}

/// Errors produced by the SQLite fetch log.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum FetchLogError {
    /// Opening the log or creating its schema failed.
    #[error("failed to initialise fetch log at {path:?}: {source}")]
    Initialise {
        source: rusqlite::Error,
        path: PathBuf,
    },
    /// Inserting a row failed.
    #[error("failed to record fetch: {source}")]
    Record { source: rusqlite::Error },
    /// A value could not be converted for persistence.
    #[error("failed to prepare fetch metadata for persistence ({what}): {source}")]
    Value {
        /// Description of the value that failed to convert.
        what: String,
        /// Underlying conversion error.
        source: Box<dyn StdError + Send + Sync>,
    },
}

/// A language code failed validation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum LanguageCodeError {
    /// The code was empty or whitespace only.
    #[error("language code must not be empty")]
    Empty,
    /// The code contained characters that cannot appear in a dump path.
    #[error("language code {code:?} contains invalid characters")]
    InvalidCharacters { code: String },
}

/// Errors produced while obtaining the list of languages to fetch.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum LanguageListError {
    /// The language list could not be read.
    #[error("failed to read language list {path:?}: {source}")]
    Read { source: io::Error, path: PathBuf },
    /// An entry in the list was not a valid language code.
    #[error("invalid language code on line {line}: {source}")]
    InvalidCode {
        line: usize,
        source: LanguageCodeError,
    },
}

/// Errors produced while fetching a single language's dump.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum PipelineError {
    /// The dump feed could not be resolved.
    #[error("{language}: resolving the dump feed failed: {source}")]
    Resolve {
        language: LanguageCode,
        source: FeedError,
    },
    /// The feed resolved but carried no download link.
    #[error("{language}: the dump feed does not link to an archive")]
    MissingDownloadLink { language: LanguageCode },
    /// The advertised file name would escape the output directory.
    #[error("{language}: refusing to write archive named {file_name:?}")]
    UnsafeFileName {
        language: LanguageCode,
        file_name: DumpFileName,
    },
    /// Downloading the archive failed.
    #[error("{language}: downloading the archive failed: {source}")]
    Transfer {
        language: LanguageCode,
        source: TransferError,
    },
    /// Decompressing the archive failed.
    #[error("{language}: extracting the archive failed: {source}")]
    Extract {
        language: LanguageCode,
        source: ExtractionError,
    },
    /// The extraction task panicked or was cancelled.
    #[error("{language}: extraction task did not complete: {source}")]
    ExtractTask {
        language: LanguageCode,
        source: tokio::task::JoinError,
    },
    /// Recording the fetch in the log failed.
    #[error("{language}: recording the fetch failed: {source}")]
    Log {
        language: LanguageCode,
        source: FetchLogError,
    },
}

impl PipelineError {
    /// Language the failure relates to.
    pub fn language(&self) -> &LanguageCode {
        match self {
            Self::Resolve { language, .. }
            | Self::MissingDownloadLink { language }
            | Self::UnsafeFileName { language, .. }
            | Self::Transfer { language, .. }
            | Self::Extract { language, .. }
            | Self::ExtractTask { language, .. }
            | Self::Log { language, .. } => language,
        }
    }
}
