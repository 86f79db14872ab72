//! Domain wrappers for dump endpoints, language codes, file names and the
//! reports produced by each pipeline stage.

use std::{fmt, ops::Deref, path::PathBuf, str::FromStr};

use url::Url;

use super::LanguageCodeError;

/// Base URL for the dump endpoint.
///
/// # Examples
/// ```
/// # use wikidump_data::dump::BaseUrl;
/// let url = BaseUrl::new("https://dumps.wikimedia.org");
/// assert_eq!(url.as_ref(), "https://dumps.wikimedia.org");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BaseUrl(String);

impl BaseUrl {
    /// Construct a new [`BaseUrl`] from an owned or borrowed string.
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Consume the wrapper and return the inner [`String`].
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl From<&str> for BaseUrl {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl AsRef<str> for BaseUrl {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Deref for BaseUrl {
    type Target = str;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl fmt::Display for BaseUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Code naming a Wikipedia language edition, such as `en` or `be_x_old`.
///
/// Codes are trimmed and must be non-empty. Separators and whitespace are
/// rejected because the code is spliced into URLs and file names.
///
/// # Examples
/// ```
/// # use wikidump_data::dump::LanguageCode;
/// let code = LanguageCode::new(" hi ")?;
/// assert_eq!(code.as_ref(), "hi");
/// assert!(LanguageCode::new("").is_err());
/// # Ok::<(), wikidump_data::dump::LanguageCodeError>(())
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LanguageCode(String);

impl LanguageCode {
    /// Validate and wrap a language code.
    pub fn new(value: impl AsRef<str>) -> Result<Self, LanguageCodeError> {
        let trimmed = value.as_ref().trim();
        if trimmed.is_empty() {
            return Err(LanguageCodeError::Empty);
        }
        if trimmed
            .chars()
            .any(|ch| ch.is_whitespace() || matches!(ch, '/' | '\\' | '?' | '#'))
            || trimmed.contains("..")
        {
            return Err(LanguageCodeError::InvalidCharacters {
                code: trimmed.to_owned(),
            });
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Parse a code as written in edition listings, where editions such as
    /// `be-tarask` are named with hyphens the dump server spells as
    /// underscores.
    ///
    /// # Examples
    /// ```
    /// # use wikidump_data::dump::LanguageCode;
    /// let code = LanguageCode::from_listing("zh-min-nan")?;
    /// assert_eq!(code.as_ref(), "zh_min_nan");
    /// # Ok::<(), wikidump_data::dump::LanguageCodeError>(())
    /// ```
    pub fn from_listing(value: &str) -> Result<Self, LanguageCodeError> {
        Self::new(value.trim().replace('-', "_"))
    }

    /// Name of the extracted SQL dump for this language.
    pub fn sql_file_name(&self) -> String {
        format!("{}.sql", self.0)
    }

    /// Name of the converted database for this language.
    pub fn database_file_name(&self) -> String {
        format!("{}.db", self.0)
    }
}

impl FromStr for LanguageCode {
    type Err = LanguageCodeError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::new(value)
    }
}

impl TryFrom<&str> for LanguageCode {
    type Error = LanguageCodeError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl AsRef<str> for LanguageCode {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Deref for LanguageCode {
    type Target = str;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl fmt::Display for LanguageCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Archive file name advertised by a dump feed.
///
/// # Examples
/// ```
/// # use wikidump_data::dump::DumpFileName;
/// let file = DumpFileName::new("abwiki-20240101-externallinks.sql.gz");
/// assert!(file.is_plain());
/// assert!(!DumpFileName::new("../abwiki.sql.gz").is_plain());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DumpFileName(String);

impl DumpFileName {
    /// Construct a new [`DumpFileName`] from an owned or borrowed string.
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Consume the wrapper and return the inner [`String`].
    pub fn into_inner(self) -> String {
        self.0
    }

    /// Whether the name is a single path component that stays inside the
    /// directory it is joined onto.
    pub fn is_plain(&self) -> bool {
        !self.0.is_empty()
            && self.0 != "."
            && self.0 != ".."
            && !self.0.contains(['/', '\\'])
    }
}

impl From<&str> for DumpFileName {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl AsRef<str> for DumpFileName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Deref for DumpFileName {
    type Target = str;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl fmt::Display for DumpFileName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Fully qualified URL pointing to a feed or an archive.
///
/// # Examples
/// ```
/// # use wikidump_data::dump::DumpUrl;
/// let url = DumpUrl::new("https://example.org/abwiki-20240101.sql.gz");
/// assert!(url.as_ref().starts_with("https://"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DumpUrl(String);

impl DumpUrl {
    /// Construct a new [`DumpUrl`] from an owned or borrowed string.
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Consume the wrapper and return the inner [`String`].
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl AsRef<str> for DumpUrl {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Deref for DumpUrl {
    type Target = str;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl fmt::Display for DumpUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<Url> for DumpUrl {
    fn from(value: Url) -> Self {
        Self(value.into())
    }
}

impl TryFrom<&str> for DumpUrl {
    type Error = url::ParseError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Url::parse(value).map(Into::into)
    }
}

/// Metadata extracted from a language's dump feed.
///
/// Text fields default to the empty string when the feed omits them.
/// `href` and `file_name` come from the first anchor tag in the item
/// description and are either both present or both absent.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FeedInfo {
    /// Title of the feed channel.
    pub channel_title: String,
    /// Link advertised by the feed channel.
    pub channel_link: String,
    /// Description of the feed channel.
    pub channel_description: String,
    /// Title of the latest item.
    pub item_title: String,
    /// Link of the latest item.
    pub item_link: String,
    /// Publication date of the latest item, as written in the feed.
    pub item_pub_date: String,
    /// Archive download URL.
    pub href: Option<DumpUrl>,
    /// Archive file name.
    pub file_name: Option<DumpFileName>,
}

impl FeedInfo {
    /// Download URL and file name, when the feed linked to an archive.
    pub fn download_target(&self) -> Option<(&DumpUrl, &DumpFileName)> {
        self.href.as_ref().zip(self.file_name.as_ref())
    }
}

/// Summary of an archive streamed to disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferReport {
    /// URL the archive was fetched from.
    pub url: DumpUrl,
    /// Location of the archive on disk.
    pub output_path: PathBuf,
    /// Content length declared by the server, if any.
    pub declared_length: Option<u64>,
    /// Number of bytes received from the response stream.
    pub bytes_received: u64,
    /// Size of the archive re-read from disk after the transfer.
    pub size_on_disk: u64,
}

/// Summary of a decompressed dump.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedDump {
    /// Location of the decompressed dump.
    pub output_path: PathBuf,
    /// Number of decompressed bytes written.
    pub bytes_written: u64,
}

/// Database produced by the external converter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConvertedDatabase {
    /// Location of the converted database.
    pub output_path: PathBuf,
}

/// Everything produced by a successful fetch of one language.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchReport {
    /// Language that was fetched.
    pub language: LanguageCode,
    /// Feed metadata the download was resolved from.
    pub feed: FeedInfo,
    /// Downloaded archive.
    pub transfer: TransferReport,
    /// Decompressed dump.
    pub extracted: ExtractedDump,
}
