//! Shared fixtures for dump pipeline tests.
use std::{
    cell::RefCell,
    collections::HashMap,
    future::Future,
    sync::{Mutex, PoisonError},
};

use async_trait::async_trait;

use super::feed::feed_url;
use super::progress::{ProgressReporter, Stage};
use super::source::{ArchiveSink, DumpSource};
use super::{BaseUrl, DumpUrl, LanguageCode, TransferError, TransportError};

/// Drive `future` to completion on a fresh current-thread runtime.
///
/// # Panics
/// Panics when the runtime cannot be created.
pub fn block_on_for_tests<F: Future>(future: F) -> F::Output {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap_or_else(|err| panic!("failed to build Tokio runtime: {err}"))
        .block_on(future)
}

/// Render a feed in the shape the dump server publishes, linking to `href`.
pub fn sample_feed(href: &str, file_name: &str) -> String {
    feed_with_description(&format!(
        "&lt;a href=&quot;{href}&quot;&gt;{file_name}&lt;/a&gt;"
    ))
}

/// Render a feed whose single item carries `description` (already escaped).
pub fn feed_with_description(description: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="utf-8"?>
<rss version="2.0">
  <channel>
    <title>Wikimedia Downloads</title>
    <link>https://dumps.wikimedia.org</link>
    <description>Latest dump files</description>
    <item>
      <title>externallinks.sql.gz</title>
      <link>https://dumps.wikimedia.org/latest/</link>
      <description>{description}</description>
      <pubDate>Mon, 01 Jan 2024 12:00:00 GMT</pubDate>
    </item>
  </channel>
</rss>"#
    )
}

#[derive(Debug, Clone)]
enum StubFeed {
    Body(Vec<u8>),
    Status(u16),
}

#[derive(Debug, Clone)]
struct StubArchive {
    bytes: Vec<u8>,
    // Bytes delivered before the stream breaks.
    fail_after: Option<usize>,
}

/// Stub [`DumpSource`] implementation backed by in-memory data.
///
/// Feeds and archives that were not registered answer with HTTP 404.
#[derive(Debug, Clone)]
pub struct StubSource {
    base_url: BaseUrl,
    feeds: HashMap<String, StubFeed>,
    archives: HashMap<String, StubArchive>,
    declared_length: Option<Option<u64>>,
    archive_requests: RefCell<Vec<String>>,
}

impl Default for StubSource {
    fn default() -> Self {
        Self::new(BaseUrl::from("https://example.org"))
    }
}

impl StubSource {
    /// Construct an empty stub rooted at `base_url`.
    pub fn new(base_url: BaseUrl) -> Self {
        Self {
            base_url,
            feeds: HashMap::new(),
            archives: HashMap::new(),
            declared_length: None,
            archive_requests: RefCell::new(Vec::new()),
        }
    }

    /// Serve `body` as the feed for `language`.
    #[must_use]
    pub fn with_feed(mut self, language: &LanguageCode, body: impl Into<Vec<u8>>) -> Self {
        let url = feed_url(&self.base_url, language);
        self.feeds
            .insert(url.into_inner(), StubFeed::Body(body.into()));
        self
    }

    /// Answer the feed request for `language` with HTTP `status`.
    #[must_use]
    pub fn with_feed_status(mut self, language: &LanguageCode, status: u16) -> Self {
        let url = feed_url(&self.base_url, language);
        self.feeds.insert(url.into_inner(), StubFeed::Status(status));
        self
    }

    /// Serve `archive` at `url`.
    #[must_use]
    pub fn with_archive(mut self, url: &str, archive: Vec<u8>) -> Self {
        self.archives.insert(
            url.to_owned(),
            StubArchive {
                bytes: archive,
                fail_after: None,
            },
        );
        self
    }

    /// Serve `archive` at `url` but break the stream with a network error
    /// once `fail_after` bytes have been delivered.
    #[must_use]
    pub fn with_truncated_archive(mut self, url: &str, archive: Vec<u8>, fail_after: usize) -> Self {
        self.archives.insert(
            url.to_owned(),
            StubArchive {
                bytes: archive,
                fail_after: Some(fail_after),
            },
        );
        self
    }

    /// Override the content length announced for archives. By default the
    /// true length is announced.
    #[must_use]
    pub fn with_declared_length(mut self, length: Option<u64>) -> Self {
        self.declared_length = Some(length);
        self
    }

    /// Archive URLs requested so far, in order.
    pub fn archive_requests(&self) -> Vec<String> {
        self.archive_requests.borrow().clone()
    }
}

fn not_found(url: &str) -> TransportError {
    TransportError::Http {
        url: url.to_owned(),
        status: 404,
        message: "Not Found".to_owned(),
    }
}

#[async_trait(?Send)]
impl DumpSource for StubSource {
    fn base_url(&self) -> &BaseUrl {
        &self.base_url
    }

    async fn fetch_feed(&self, url: &DumpUrl) -> Result<Vec<u8>, TransportError> {
        match self.feeds.get(url.as_ref()) {
            Some(StubFeed::Body(body)) => Ok(body.clone()),
            Some(StubFeed::Status(status)) => Err(TransportError::Http {
                url: url.to_string(),
                status: *status,
                message: format!("stubbed status {status}"),
            }),
            None => Err(not_found(url)),
        }
    }

    async fn download_archive(
        &self,
        url: &DumpUrl,
        sink: &mut dyn ArchiveSink,
    ) -> Result<u64, TransferError> {
        self.archive_requests.borrow_mut().push(url.to_string());
        let archive = self
            .archives
            .get(url.as_ref())
            .ok_or_else(|| TransferError::Transport {
                source: not_found(url),
            })?;
        let length = u64::try_from(archive.bytes.len()).unwrap_or(u64::MAX);
        sink.begin(self.declared_length.unwrap_or(Some(length)));
        let Some(fail_after) = archive.fail_after else {
            sink.write_chunk(&archive.bytes)?;
            return Ok(length);
        };
        let delivered = archive.bytes.get(..fail_after).unwrap_or(&archive.bytes);
        sink.write_chunk(delivered)?;
        Err(TransferError::Transport {
            source: TransportError::Network {
                url: url.to_string(),
                source: std::io::Error::new(
                    std::io::ErrorKind::ConnectionReset,
                    "connection reset by peer",
                ),
            },
        })
    }
}

/// Progress notification captured by [`RecordingProgress`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProgressEvent {
    /// A batch member started.
    LanguageStarted {
        /// 1-based position in the batch.
        position: usize,
        /// Batch size.
        total: usize,
        /// Language code.
        language: String,
    },
    /// A stage started.
    StageStarted {
        /// Stage.
        stage: Stage,
        /// Expected byte count.
        total: Option<u64>,
    },
    /// A stage advanced.
    StageAdvanced {
        /// Stage.
        stage: Stage,
        /// Cumulative bytes.
        position: u64,
    },
    /// A stage finished.
    StageFinished {
        /// Stage.
        stage: Stage,
    },
}

/// [`ProgressReporter`] that records every notification.
#[derive(Debug, Default)]
pub struct RecordingProgress {
    events: Mutex<Vec<ProgressEvent>>,
}

impl RecordingProgress {
    /// Notifications received so far, in order.
    pub fn events(&self) -> Vec<ProgressEvent> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn push(&self, event: ProgressEvent) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event);
    }
}

impl ProgressReporter for RecordingProgress {
    fn language_started(&self, position: usize, total: usize, language: &LanguageCode) {
        self.push(ProgressEvent::LanguageStarted {
            position,
            total,
            language: language.to_string(),
        });
    }

    fn stage_started(&self, stage: Stage, total: Option<u64>) {
        self.push(ProgressEvent::StageStarted { stage, total });
    }

    fn stage_advanced(&self, stage: Stage, position: u64) {
        self.push(ProgressEvent::StageAdvanced { stage, position });
    }

    fn stage_finished(&self, stage: Stage) {
        self.push(ProgressEvent::StageFinished { stage });
    }
}
