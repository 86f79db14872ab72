//! Facade crate for the wikidump toolkit.
//!
//! This crate re-exports the types needed to resolve, fetch, extract and
//! convert per-language Wikipedia external-links dumps.

#![forbid(unsafe_code)]

pub use wikidump_data::dump::{
    ArchiveSink, BaseUrl, ConversionError, ConvertedDatabase, DEFAULT_BASE_URL, DEFAULT_LOADER,
    DEFAULT_TRANSLITERATOR, DEFAULT_USER_AGENT, DumpConverter, DumpFileName, DumpSource, DumpUrl,
    ExtractedDump, ExtractionError, FeedError, FeedInfo, FetchLog, FetchLogError, FetchPipeline,
    FetchReport, HttpDumpSource, LanguageCode, LanguageCodeError, LanguageFile,
    LanguageListError, LanguageOutcome, LanguageSupplier, PipelineError, ProgressReporter,
    SilentProgress, Stage, StaticLanguages, TransferError, TransferReport, TransportError,
    download_archive, extract_archive, feed_url, parse_language_list, resolve_feed,
};
