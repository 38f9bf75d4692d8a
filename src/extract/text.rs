//! URL discovery inside plain-text bodies

use super::{collect_urls, ExtractError, LinkExtractor};
use std::io::{BufRead, BufReader, Read};

/// Scans a plain-text body line by line for URLs
///
/// Lines are decoded lossily, so a body in a legacy encoding still yields
/// its ASCII links.
#[derive(Debug, Clone, Copy, Default)]
pub struct TextExtractor;

impl LinkExtractor for TextExtractor {
    fn extract(&self, body: &mut dyn Read) -> Result<Vec<String>, ExtractError> {
        let mut links = Vec::new();

        for line in BufReader::new(body).split(b'\n') {
            let line = line.map_err(|e| ExtractError::read("text", e))?;
            collect_urls(&String::from_utf8_lossy(&line), &mut links);
        }

        Ok(links)
    }
}
