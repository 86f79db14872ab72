use quick_xml::{Reader, events::Event};
use regex::Regex;
use std::sync::LazyLock;

use super::source::DumpSource;
use super::util::normalise_url;
use super::{BaseUrl, DumpFileName, DumpUrl, FeedError, FeedInfo, LanguageCode};

static ANCHOR: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r#"<a href="(.*?)">(.*?)</a>"#).ok());

/// Build the URL of the RSS feed advertising `language`'s latest
/// external-links dump.
///
/// # Examples
/// ```
/// # use wikidump_data::dump::{feed_url, BaseUrl, LanguageCode};
/// let language = LanguageCode::new("ab")?;
/// let url = feed_url(&BaseUrl::from("https://dumps.wikimedia.org"), &language);
/// assert_eq!(
///     url.as_ref(),
///     "https://dumps.wikimedia.org/abwiki/latest/abwiki-latest-externallinks.sql.gz-rss.xml",
/// );
/// # Ok::<(), wikidump_data::dump::LanguageCodeError>(())
/// ```
pub fn feed_url(base_url: &BaseUrl, language: &LanguageCode) -> DumpUrl {
    DumpUrl::new(format!(
        "{base}/{code}wiki/latest/{code}wiki-latest-externallinks.sql.gz-rss.xml",
        base = base_url.as_ref(),
        code = language.as_ref(),
    ))
}

/// Resolve the latest dump advertised for `language`.
///
/// Every failure is returned as a [`FeedError`]; a feed whose item carries no
/// anchor tag resolves successfully with `href` and `file_name` unset, leaving
/// the caller to decide how to proceed.
///
/// # Examples
/// ```
/// # use wikidump_data::dump::{
/// #     block_on_for_tests, resolve_feed, sample_feed, LanguageCode, StubSource,
/// # };
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let language = LanguageCode::new("ab")?;
/// let source = StubSource::default().with_feed(
///     &language,
///     sample_feed("https://example.org/abwiki-20240101.sql.gz", "abwiki-20240101.sql.gz"),
/// );
/// let info = block_on_for_tests(resolve_feed(&source, &language))?;
/// assert_eq!(info.file_name.as_deref(), Some("abwiki-20240101.sql.gz"));
/// # Ok(())
/// # }
/// # example().expect("example should run");
/// ```
pub async fn resolve_feed<S: DumpSource + ?Sized>(
    source: &S,
    language: &LanguageCode,
) -> Result<FeedInfo, FeedError> {
    let url = feed_url(source.base_url(), language);
    let body = source
        .fetch_feed(&url)
        .await
        .map_err(|source| FeedError::Network { source })?;
    parse_feed(&body, &url, source.base_url())
}

pub(crate) fn parse_feed(
    body: &[u8],
    url: &DumpUrl,
    base_url: &BaseUrl,
) -> Result<FeedInfo, FeedError> {
    let scan = scan_feed(body, url)?;
    if !scan.channel_seen {
        return Err(FeedError::MissingChannel {
            url: url.to_string(),
        });
    }
    if !scan.item_seen {
        return Err(FeedError::MissingItems {
            url: url.to_string(),
        });
    }

    let item_description = scan.value(Field::ItemDescription);
    let (href, file_name) = match find_anchor(&item_description) {
        Some((link, name)) => {
            let href = normalise_url(base_url, link).map_err(|source| FeedError::InvalidLink {
                url: url.to_string(),
                href: link.to_owned(),
                source,
            })?;
            (Some(href), Some(DumpFileName::from(name)))
        }
        None => (None, None),
    };

    Ok(FeedInfo {
        channel_title: scan.value(Field::ChannelTitle),
        channel_link: scan.value(Field::ChannelLink),
        channel_description: scan.value(Field::ChannelDescription),
        item_title: scan.value(Field::ItemTitle),
        item_link: scan.value(Field::ItemLink),
        item_pub_date: scan.value(Field::ItemPubDate),
        href,
        file_name,
    })
}

/// Extract the `href` and inner text of the first anchor tag in `description`.
pub(crate) fn find_anchor(description: &str) -> Option<(&str, &str)> {
    let captures = ANCHOR.as_ref()?.captures(description)?;
    let href = captures.get(1)?.as_str();
    let text = captures.get(2)?.as_str();
    Some((href, text))
}

/// Fields read from the first channel and its first item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    ChannelTitle,
    ChannelLink,
    ChannelDescription,
    ItemTitle,
    ItemLink,
    ItemDescription,
    ItemPubDate,
}

impl Field {
    const COUNT: usize = 7;

    fn of_channel(name: &[u8]) -> Option<Self> {
        match name {
            b"title" => Some(Self::ChannelTitle),
            b"link" => Some(Self::ChannelLink),
            b"description" => Some(Self::ChannelDescription),
            _ => None,
        }
    }

    fn of_item(name: &[u8]) -> Option<Self> {
        match name {
            b"title" => Some(Self::ItemTitle),
            b"link" => Some(Self::ItemLink),
            b"description" => Some(Self::ItemDescription),
            b"pubDate" => Some(Self::ItemPubDate),
            _ => None,
        }
    }

    fn slot(self) -> usize {
        self as usize
    }
}

/// Role of an open element while walking the feed.
#[derive(Debug, Clone, Copy)]
enum Node {
    Root,
    Channel,
    Item,
    Field(Field),
    Other,
}

/// Accumulates the first occurrence of each field.
///
/// Only unprefixed direct children count, so `atom:link` never shadows
/// `link`. A field keeps the text that precedes its first child element.
#[derive(Debug, Default)]
struct FeedScan {
    channel_seen: bool,
    item_seen: bool,
    values: [Option<String>; Field::COUNT],
}

impl FeedScan {
    fn value(&self, field: Field) -> String {
        self.values
            .get(field.slot())
            .and_then(Clone::clone)
            .unwrap_or_default()
    }

    fn claimed(&self, field: Field) -> bool {
        self.values
            .get(field.slot())
            .is_some_and(Option::is_some)
    }

    fn store(&mut self, field: Field, text: String) {
        if let Some(slot) = self.values.get_mut(field.slot()) {
            slot.get_or_insert(text);
        }
    }

    fn enter(&mut self, parent: Option<Node>, name: &[u8]) -> Node {
        match parent {
            None => Node::Root,
            Some(Node::Root) if name == b"channel" && !self.channel_seen => {
                self.channel_seen = true;
                Node::Channel
            }
            Some(Node::Channel) if name == b"item" && !self.item_seen => {
                self.item_seen = true;
                Node::Item
            }
            Some(Node::Channel) => self.claim(Field::of_channel(name)),
            Some(Node::Item) => self.claim(Field::of_item(name)),
            Some(_) => Node::Other,
        }
    }

    fn claim(&self, field: Option<Field>) -> Node {
        match field {
            Some(field) if !self.claimed(field) => Node::Field(field),
            _ => Node::Other,
        }
    }
}

fn malformed<E: Into<quick_xml::Error>>(url: &DumpUrl) -> impl Fn(E) -> FeedError + '_ {
    move |err| FeedError::Malformed {
        url: url.to_string(),
        source: err.into(),
    }
}

fn incomplete(url: &DumpUrl, reason: &'static str) -> FeedError {
    FeedError::Incomplete {
        url: url.to_string(),
        reason,
    }
}

/// Tracks open elements while the feed is walked.
#[derive(Debug, Default)]
struct FeedWalk {
    scan: FeedScan,
    open: Vec<Node>,
    // Field whose leading text is still being collected.
    capture: Option<(Field, String)>,
    root_closed: bool,
}

impl FeedWalk {
    fn element(&mut self, name: &[u8], self_closing: bool) -> Result<(), &'static str> {
        if self.root_closed {
            return Err("content follows the root element");
        }
        self.flush();
        let node = self.scan.enter(self.open.last().copied(), name);
        if self_closing {
            if let Node::Field(field) = node {
                self.scan.store(field, String::new());
            }
            self.root_closed = self.open.is_empty();
        } else {
            if let Node::Field(field) = node {
                self.capture = Some((field, String::new()));
            }
            self.open.push(node);
        }
        Ok(())
    }

    fn text(&mut self, text: &str) {
        if let Some((_, collected)) = self.capture.as_mut() {
            collected.push_str(text);
        }
    }

    fn close(&mut self) {
        self.flush();
        self.open.pop();
        self.root_closed = self.open.is_empty();
    }

    fn flush(&mut self) {
        if let Some((field, text)) = self.capture.take() {
            self.scan.store(field, text);
        }
    }

    fn finish(self) -> Result<FeedScan, &'static str> {
        if !self.open.is_empty() {
            return Err("the root element is never closed");
        }
        if !self.root_closed {
            return Err("no root element");
        }
        Ok(self.scan)
    }
}

/// Walk the whole document so that syntax errors anywhere are reported,
/// collecting fields from the first channel and its first item.
fn scan_feed(body: &[u8], url: &DumpUrl) -> Result<FeedScan, FeedError> {
    let mut reader = Reader::from_reader(body);
    let mut buf = Vec::new();
    let mut walk = FeedWalk::default();

    loop {
        match reader.read_event_into(&mut buf).map_err(malformed(url))? {
            Event::Start(element) => walk
                .element(element.name().as_ref(), false)
                .map_err(|reason| incomplete(url, reason))?,
            Event::Empty(element) => walk
                .element(element.name().as_ref(), true)
                .map_err(|reason| incomplete(url, reason))?,
            Event::Text(text) => walk.text(&text.unescape().map_err(malformed(url))?),
            Event::CData(cdata) => walk.text(
                &reader
                    .decoder()
                    .decode(&cdata)
                    .map_err(malformed(url))?,
            ),
            Event::End(_) => walk.close(),
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    walk.finish().map_err(|reason| incomplete(url, reason))
}
