//! Link Census: a concurrent link crawler
//!
//! This crate fetches a list of pages with a bounded pool of workers, extracts
//! the links each page contains (HTML anchors, or URLs found inside JSON and
//! plain-text bodies), sorts them into internal and external links relative to
//! the page, and streams one JSON record per page to an output sink.

pub mod app;
pub mod config;
pub mod crawler;
pub mod extract;
pub mod output;
pub mod url;

use thiserror::Error;

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("{0}")]
    Validation(String),
}

/// Errors produced while turning a source identifier into a crawlable URL
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("parse {url:?}: {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: ::url::ParseError,
    },

    #[error("parse {url:?}: missing hostname")]
    MissingHostname { url: String },

    #[error("parse {url:?}: unsupported scheme {scheme:?}")]
    UnsupportedScheme { url: String, scheme: String },
}

/// Per-source crawl failures
///
/// None of these abort a run. They end up in the `error` field of the
/// record emitted for the source that produced them.
#[derive(Debug, Error)]
pub enum CrawlError {
    #[error(transparent)]
    Url(#[from] UrlError),

    #[error("failed to build http client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("failed to send http request: {0}")]
    Request(#[source] reqwest::Error),

    #[error("operation canceled")]
    OperationCanceled,

    #[error("unexpected status code: {0}")]
    UnexpectedStatusCode(u16),

    #[error("failed to detect content type: {0}")]
    ContentDetection(#[source] std::io::Error),

    #[error("unsupported content type: {0}")]
    UnsupportedContentType(String),

    #[error("failed to get links: {0}")]
    ExtractionFailed(#[from] extract::ExtractError),

    #[error("link extraction task failed: {0}")]
    ExtractionTask(#[from] tokio::task::JoinError),
}

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for URL operations
pub type UrlResult<T> = std::result::Result<T, UrlError>;

// Re-export commonly used types
pub use app::{run, run_until, Config, ExitCode, InputSource};
pub use config::{CrawlerConfig, Verbosity};
pub use crawler::{CrawlResult, LinkCrawler};
pub use extract::{ExtractorRegistry, LinkExtractor};
pub use url::{normalize_source, SourceUrl};
