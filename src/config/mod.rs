//! Configuration module
//!
//! Runtime configuration for the crawl engine, the verbosity levels that pick
//! the logging filter and the result sink, and an optional TOML settings file
//! that supplies defaults for the command-line flags.
//!
//! # Example
//!
//! ```no_run
//! use link_census::config::load_settings;
//! use std::path::Path;
//!
//! let settings = load_settings(Path::new("link-census.toml")).unwrap();
//! println!("Crawling with {} workers", settings.crawler.workers);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    CrawlerConfig, CrawlerSettings, OutputSettings, Settings, Verbosity, DEFAULT_NUM_WORKERS,
    DEFAULT_TIMEOUT, DEFAULT_USER_AGENT, MAX_NUM_WORKERS,
};

// Re-export parser and validation functions
pub use parser::load_settings;
pub use validation::{validate, validate_num_workers};
