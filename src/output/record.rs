use crate::crawler::CrawlResult;
use serde::{Deserialize, Serialize};

/// One entry of the JSON report
///
/// Only link counts are reported, not the links themselves.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultRecord {
    /// The source as it was given to the crawler
    pub page_url: String,

    #[serde(rename = "internal_links_num")]
    pub internal_links: usize,

    #[serde(rename = "external_links_num")]
    pub external_links: usize,

    pub success: bool,

    /// Error message, `null` on success
    pub error: Option<String>,
}

impl From<&CrawlResult> for ResultRecord {
    fn from(result: &CrawlResult) -> Self {
        Self {
            page_url: result.source.clone(),
            internal_links: result.internal_links.len(),
            external_links: result.external_links.len(),
            success: result.is_success(),
            error: result.error.as_ref().map(ToString::to_string),
        }
    }
}
