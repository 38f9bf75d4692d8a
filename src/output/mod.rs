//! Output module
//!
//! This module serializes crawl results into a single JSON array:
//! - [`ResultRecord`]: the per-page record written to the report
//! - [`ResultSink`]: buffered or streaming consumption of the result queue

mod record;
mod sink;

pub use record::ResultRecord;
pub use sink::ResultSink;

use thiserror::Error;

/// Errors that can occur while writing the report
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("failed to encode report: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("could not write [ to output: {0}")]
    OpenBracket(#[source] std::io::Error),

    #[error("could not write {source_url:?} report: {error}")]
    Record {
        source_url: String,
        #[source]
        error: std::io::Error,
    },

    #[error("could not write ] to output: {0}")]
    CloseBracket(#[source] std::io::Error),
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;
