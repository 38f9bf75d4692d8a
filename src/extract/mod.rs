//! Link extraction strategies
//!
//! Each extractor turns a response body of one media type into the raw link
//! strings it contains, in document order and without deduplication. The
//! crawl engine picks an extractor through an [`ExtractorRegistry`] keyed by
//! the response's media type.
//!
//! - [`HtmlExtractor`]: `href` values of anchor tags
//! - [`JsonExtractor`]: URLs found in every string and key of a JSON document
//! - [`TextExtractor`]: URLs found on every line of a plain-text body

mod html;
mod json;
mod text;

pub use html::HtmlExtractor;
pub use json::JsonExtractor;
pub use text::TextExtractor;

use regex::Regex;
use std::collections::HashMap;
use std::io::Read;
use std::sync::{Arc, LazyLock};
use thiserror::Error;

/// Loose HTTP(S) URL pattern used to discover links inside free text.
///
/// It favours recall over precision: truncated or otherwise odd hosts can
/// match, and classification later drops what does not parse.
static HTTP_URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(https?)://(-\.)?([^\s/?.#]+\.?)+(/\S*)?").expect("valid URL pattern")
});

/// Errors that can occur while reading links out of a body
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("could not collect links from {kind} doc: {source}")]
    Read {
        kind: &'static str,
        #[source]
        source: std::io::Error,
    },

    #[error("could not collect links from json doc: {0}")]
    Json(#[from] serde_json::Error),
}

impl ExtractError {
    fn read(kind: &'static str, source: std::io::Error) -> Self {
        Self::Read { kind, source }
    }
}

/// Extracts raw link strings from a body of a known media type
///
/// Implementations are stateless and shared between all crawl workers.
/// They run on the blocking thread pool, so reading synchronously is fine.
pub trait LinkExtractor: Send + Sync {
    /// Reads `body` to the end and returns every link found, in order
    fn extract(&self, body: &mut dyn Read) -> Result<Vec<String>, ExtractError>;
}

/// Maps normalized media types to the extractor that handles them
#[derive(Clone, Default)]
pub struct ExtractorRegistry {
    extractors: HashMap<String, Arc<dyn LinkExtractor>>,
}

impl ExtractorRegistry {
    /// Creates an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry with the built-in extractors
    ///
    /// | Media type | Extractor |
    /// |------------|-----------|
    /// | `text/html` | [`HtmlExtractor`] |
    /// | `text/plain` | [`TextExtractor`] |
    /// | `application/json`, `text/x-json` | [`JsonExtractor`] |
    pub fn with_defaults() -> Self {
        let json: Arc<dyn LinkExtractor> = Arc::new(JsonExtractor);

        Self::new()
            .with("text/html", Arc::new(HtmlExtractor))
            .with("text/plain", Arc::new(TextExtractor))
            .with("application/json", Arc::clone(&json))
            .with("text/x-json", json)
    }

    /// Registers `extractor` for `media_type`, replacing any previous entry
    pub fn with(mut self, media_type: &str, extractor: Arc<dyn LinkExtractor>) -> Self {
        self.register(media_type, extractor);
        self
    }

    pub fn register(&mut self, media_type: &str, extractor: Arc<dyn LinkExtractor>) {
        self.extractors
            .insert(media_type.to_ascii_lowercase(), extractor);
    }

    /// Looks up the extractor for a normalized media type
    pub fn get(&self, media_type: &str) -> Option<Arc<dyn LinkExtractor>> {
        self.extractors.get(media_type).cloned()
    }

    /// Returns the registered media types, sorted
    pub fn media_types(&self) -> Vec<&str> {
        let mut types: Vec<&str> = self.extractors.keys().map(String::as_str).collect();
        types.sort_unstable();
        types
    }
}

impl std::fmt::Debug for ExtractorRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExtractorRegistry")
            .field("media_types", &self.media_types())
            .finish()
    }
}

/// Appends every URL-looking substring of `text` to `links`
fn collect_urls(text: &str, links: &mut Vec<String>) {
    links.extend(HTTP_URL.find_iter(text).map(|m| m.as_str().to_string()));
}
