//! Link classification
//!
//! Sorts the raw links found on a page into links that stay on the page's
//! host (internal) and links that leave it (external).

use crate::url::same_host;
use url::{ParseError, Url};

/// Links of one page, split by host
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SortedLinks {
    /// Absolute URLs on the source's host, resolved against the source
    pub internal: Vec<String>,

    /// Links to other hosts, exactly as written in the page
    pub external: Vec<String>,
}

/// Sorts raw links into internal and external links relative to `source`
///
/// # Classification Rules
///
/// 1. A link that cannot be parsed or resolved is skipped
/// 2. A link with a scheme other than `http` or `https` is skipped
///    (`mailto:`, `javascript:`, `ftp:`, ...)
/// 3. A link naming a different host (or port) is external and kept verbatim
/// 4. Anything else is resolved against `source` and is internal; this covers
///    relative paths, `.`, fragment-only and query-only references
///
/// Both lists keep the order of `links`. Duplicates are kept.
///
/// # Example
///
/// ```
/// use link_census::crawler::sort_links;
/// use url::Url;
///
/// let source = Url::parse("http://example.com/docs/page").unwrap();
/// let links = vec![
///     "intro".to_string(),
///     "https://other.org/".to_string(),
///     "mailto:me@example.com".to_string(),
/// ];
///
/// let sorted = sort_links(&source, links);
/// assert_eq!(sorted.internal, vec!["http://example.com/docs/intro"]);
/// assert_eq!(sorted.external, vec!["https://other.org/"]);
/// ```
pub fn sort_links<I>(source: &Url, links: I) -> SortedLinks
where
    I: IntoIterator<Item = String>,
{
    let mut sorted = SortedLinks::default();

    for link in links {
        let resolved = match Url::parse(&link) {
            Ok(url) => url,
            Err(ParseError::RelativeUrlWithoutBase) => match source.join(&link) {
                Ok(url) => url,
                Err(e) => {
                    tracing::debug!(link = %link, error = %e, "skipping unresolvable link");
                    continue;
                }
            },
            Err(e) => {
                tracing::debug!(link = %link, error = %e, "skipping unparsable link");
                continue;
            }
        };

        if !matches!(resolved.scheme(), "http" | "https") {
            continue;
        }

        if resolved.host_str().is_some() && !same_host(&resolved, source) {
            sorted.external.push(link);
        } else {
            sorted.internal.push(resolved.into());
        }
    }

    sorted
}
