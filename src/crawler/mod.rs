//! Crawler module for fetching pages and sorting their links
//!
//! This module contains the crawl engine, including:
//! - HTTP fetching bound to the run's cancellation token
//! - Content-type resolution and sniffing
//! - Link classification into internal and external links
//! - The worker pool that ties them together

mod content_type;
mod coordinator;
mod fetcher;
mod parser;

pub use content_type::{
    detect_content_type, media_type, resolve_content_type, SniffedBody, OCTET_STREAM, SNIFF_LEN,
};
pub use coordinator::{CrawlResult, LinkCrawler};
pub use fetcher::{body_reader, build_http_client, declared_content_type, fetch};
pub use parser::{sort_links, SortedLinks};
