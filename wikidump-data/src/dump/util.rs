//! Shared helpers used across dump operations and sources.

use url::Url;

use super::{BaseUrl, DumpUrl};

/// Endpoint serving Wikimedia database dumps.
pub const DEFAULT_BASE_URL: &str = "https://dumps.wikimedia.org";

/// Trim trailing slashes and fall back to the default dump endpoint.
pub(crate) fn sanitise_base_url(url: impl Into<String>) -> BaseUrl {
    let raw = url.into();
    let trimmed = raw.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        BaseUrl::from(DEFAULT_BASE_URL)
    } else {
        BaseUrl::new(trimmed.to_owned())
    }
}

/// Resolve a link found in a feed against the dump endpoint.
///
/// Absolute links are kept verbatim; relative ones are joined onto `base_url`.
pub(crate) fn normalise_url(base_url: &BaseUrl, link: &str) -> Result<DumpUrl, url::ParseError> {
    if link.starts_with("http://") || link.starts_with("https://") {
        Url::parse(link)?;
        return Ok(DumpUrl::new(link));
    }
    let absolute = if link.starts_with('/') {
        format!("{}{}", base_url.as_ref(), link)
    } else {
        format!("{}/{}", base_url.as_ref(), link)
    };
    Url::parse(&absolute).map(Into::into)
}
