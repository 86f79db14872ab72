//! Facilities for discovering, downloading, extracting and converting
//! per-language Wikipedia dumps.
#![forbid(unsafe_code)]

mod convert;
mod error;
mod extract;
mod feed;
mod languages;
mod log;
mod pipeline;
mod progress;
mod source;
mod transfer;
mod types;
mod util;

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;
#[cfg(any(test, feature = "test-support"))]
pub use test_support::{StubSource, block_on_for_tests, sample_feed};

pub use convert::{DEFAULT_LOADER, DEFAULT_TRANSLITERATOR, DumpConverter};
pub use error::{
    ConversionError, ExtractionError, FeedError, FetchLogError, LanguageCodeError,
    LanguageListError, PipelineError, TransferError, TransportError,
};
pub use extract::{EXTRACTION_BLOCK_SIZE, extract_archive};
pub use feed::{feed_url, resolve_feed};
pub use languages::{LanguageFile, LanguageSupplier, StaticLanguages, parse_language_list};
pub use self::log::FetchLog;
pub use pipeline::{FetchPipeline, LanguageOutcome};
pub use progress::{ProgressReporter, SilentProgress, Stage};
pub use source::{ArchiveSink, DEFAULT_USER_AGENT, DumpSource, HttpDumpSource};
pub use transfer::{TRANSFER_CHUNK_SIZE, download_archive};
pub use types::{
    BaseUrl, ConvertedDatabase, DumpFileName, DumpUrl, ExtractedDump, FeedInfo, FetchReport,
    LanguageCode, TransferReport,
};
pub use util::DEFAULT_BASE_URL;
