use crate::UrlError;
use std::fmt;
use url::{ParseError, Url};

/// Scheme assumed for sources written without one
const DEFAULT_SCHEME: &str = "https";

/// A validated crawl target
///
/// A `SourceUrl` always has an `http` or `https` scheme and a non-empty host.
/// The only way to build one is [`normalize_source`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceUrl(Url);

impl SourceUrl {
    /// Parses and validates a source identifier, see [`normalize_source`]
    pub fn parse(raw: &str) -> Result<Self, UrlError> {
        normalize_source(raw)
    }

    pub fn as_url(&self) -> &Url {
        &self.0
    }

    pub fn scheme(&self) -> &str {
        self.0.scheme()
    }

    pub fn host_str(&self) -> &str {
        self.0.host_str().unwrap_or_default()
    }
}

impl fmt::Display for SourceUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Turns a raw source identifier into a crawlable URL
///
/// # Normalization Steps
///
/// 1. Prepend `https://` when the string has no `://`
/// 2. Reject an empty authority (`https:///path`) as a missing hostname
/// 3. Parse the URL; reject if malformed
/// 4. Reject any scheme other than `http` and `https`
///
/// # Arguments
///
/// * `raw` - The source identifier as supplied by the caller
///
/// # Returns
///
/// * `Ok(SourceUrl)` - Validated URL
/// * `Err(UrlError)` - The identifier cannot be crawled
///
/// # Examples
///
/// ```
/// use link_census::url::normalize_source;
///
/// let url = normalize_source("example.com/docs").unwrap();
/// assert_eq!(url.to_string(), "https://example.com/docs");
///
/// assert!(normalize_source("ftp://example.com").is_err());
/// ```
pub fn normalize_source(raw: &str) -> Result<SourceUrl, UrlError> {
    let candidate = if raw.contains("://") {
        raw.to_string()
    } else {
        format!("{}://{}", DEFAULT_SCHEME, raw)
    };

    // WHATWG parsing skips extra slashes after special schemes, which would
    // turn "https:///p" into a URL whose host is "p".
    if authority(&candidate).is_empty() {
        return Err(UrlError::MissingHostname { url: candidate });
    }

    let url = match Url::parse(&candidate) {
        Ok(url) => url,
        Err(ParseError::EmptyHost) => return Err(UrlError::MissingHostname { url: candidate }),
        Err(source) => {
            return Err(UrlError::InvalidUrl {
                url: candidate,
                source,
            })
        }
    };

    if url.host_str().map_or(true, str::is_empty) {
        return Err(UrlError::MissingHostname { url: candidate });
    }

    match url.scheme() {
        "http" | "https" => Ok(SourceUrl(url)),
        scheme => Err(UrlError::UnsupportedScheme {
            scheme: scheme.to_string(),
            url: candidate,
        }),
    }
}

/// Returns the text between `://` and the start of the path, query or fragment
fn authority(candidate: &str) -> &str {
    let rest = candidate
        .split_once("://")
        .map(|(_, rest)| rest)
        .unwrap_or_default();
    let end = rest
        .find(|c: char| matches!(c, '/' | '?' | '#'))
        .unwrap_or(rest.len());
    &rest[..end]
}
