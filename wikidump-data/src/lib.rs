//! Data acquisition for per-language Wikipedia dumps.
//!
//! Responsibilities:
//! - Discover the latest dump for a language edition from its RSS feed.
//! - Stream archives to disk and decompress them.
//! - Hand extracted dumps to external converters.
//!
//! Boundaries:
//! - Network access goes through the [`dump::DumpSource`] trait.
//! - Progress rendering lives behind [`dump::ProgressReporter`].
//!
//! Invariants:
//! - Languages are processed strictly one at a time.
//! - No global mutable state.

pub mod dump;
