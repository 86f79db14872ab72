//! Sources for the list of language editions fetched by a batch run.

use std::{fs, path::PathBuf};

use super::{LanguageCode, LanguageListError};

/// Supplies the ordered list of languages for a batch fetch.
///
/// Suppliers are invoked only when a batch actually runs, so constructing one
/// never touches the filesystem or the network.
pub trait LanguageSupplier {
    /// Produce the languages to fetch, in order.
    fn languages(&self) -> Result<Vec<LanguageCode>, LanguageListError>;
}

/// Fixed, in-memory list of languages.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StaticLanguages(Vec<LanguageCode>);

impl StaticLanguages {
    /// Wrap an explicit list of languages.
    pub fn new(languages: Vec<LanguageCode>) -> Self {
        Self(languages)
    }
}

impl LanguageSupplier for StaticLanguages {
    fn languages(&self) -> Result<Vec<LanguageCode>, LanguageListError> {
        Ok(self.0.clone())
    }
}

/// Language list stored in a text file, one code per line.
///
/// Blank lines and lines starting with `#` are skipped; codes are
/// normalised with [`LanguageCode::from_listing`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LanguageFile {
    path: PathBuf,
}

impl LanguageFile {
    /// Point the supplier at `path`; the file is read lazily.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl LanguageSupplier for LanguageFile {
    fn languages(&self) -> Result<Vec<LanguageCode>, LanguageListError> {
        let contents = fs::read_to_string(&self.path).map_err(|source| LanguageListError::Read {
            source,
            path: self.path.clone(),
        })?;
        parse_language_list(&contents)
    }
}

/// Parse a newline-separated language list.
///
/// # Examples
/// ```
/// # use wikidump_data::dump::parse_language_list;
/// let languages = parse_language_list("# editions\nen\n\nbe-tarask\n")?;
/// let codes: Vec<String> = languages.iter().map(ToString::to_string).collect();
/// assert_eq!(codes, ["en", "be_tarask"]);
/// # Ok::<(), wikidump_data::dump::LanguageListError>(())
/// ```
pub fn parse_language_list(contents: &str) -> Result<Vec<LanguageCode>, LanguageListError> {
    contents
        .lines()
        .enumerate()
        .map(|(index, line)| (index.saturating_add(1), line.trim()))
        .filter(|(_, line)| !line.is_empty() && !line.starts_with('#'))
        .map(|(line, code)| {
            LanguageCode::from_listing(code)
                .map_err(|source| LanguageListError::InvalidCode { line, source })
        })
        .collect()
}
