//! URL handling module
//!
//! This module turns raw source identifiers into validated crawl targets and
//! provides the host comparison used when sorting discovered links.

mod domain;
mod normalize;

// Re-export main functions
pub use domain::{host_with_port, same_host};
pub use normalize::{normalize_source, SourceUrl};
