//! Content-type resolution and sniffing
//!
//! A response is routed to an extractor by its media type. The declared
//! `Content-Type` header is trusted unless it is missing, unparsable or the
//! generic `application/octet-stream`, in which case the first
//! [`SNIFF_LEN`] bytes of the body are inspected instead.

use mime::Mime;
use std::io::{self, Cursor};
use tokio::io::{AsyncRead, AsyncReadExt, Chain};

/// Maximum number of body bytes inspected when sniffing
pub const SNIFF_LEN: usize = 512;

/// Media type that carries no information about the body
pub const OCTET_STREAM: &str = "application/octet-stream";

/// A body whose already-inspected prefix is replayed before the rest
pub type SniffedBody<R> = Chain<Cursor<Vec<u8>>, R>;

/// Strips parameters from a content type and lowercases it
///
/// # Examples
///
/// ```
/// use link_census::crawler::media_type;
///
/// assert_eq!(media_type("Text/HTML; charset=UTF-8"), Some("text/html".to_string()));
/// assert_eq!(media_type("not a media type"), None);
/// ```
pub fn media_type(content_type: &str) -> Option<String> {
    content_type
        .trim()
        .parse::<Mime>()
        .ok()
        .map(|mime| mime.essence_str().to_ascii_lowercase())
}

/// Resolves the media type of a response body
///
/// When sniffing is needed, at most [`SNIFF_LEN`] bytes are read from `body`.
/// The returned reader always yields the complete body, those bytes included.
///
/// # Arguments
///
/// * `declared` - The raw `Content-Type` header value, if any
/// * `body` - The response body
///
/// # Returns
///
/// * `Ok((String, SniffedBody))` - Media type without parameters, and the intact body
/// * `Err(io::Error)` - Reading the prefix failed
pub async fn resolve_content_type<R>(
    declared: Option<&str>,
    mut body: R,
) -> io::Result<(String, SniffedBody<R>)>
where
    R: AsyncRead + Unpin,
{
    let declared = declared.and_then(media_type).unwrap_or_default();
    tracing::debug!(content_type = %declared, "declared content type");

    if !declared.is_empty() && declared != OCTET_STREAM {
        return Ok((declared, Cursor::new(Vec::new()).chain(body)));
    }

    let mut prefix = Vec::with_capacity(SNIFF_LEN);
    (&mut body)
        .take(SNIFF_LEN as u64)
        .read_to_end(&mut prefix)
        .await?;

    let sniffed = media_type(detect_content_type(&prefix)).unwrap_or_else(|| OCTET_STREAM.into());
    tracing::debug!(content_type = %sniffed, bytes = prefix.len(), "sniffed content type");

    Ok((sniffed, Cursor::new(prefix).chain(body)))
}

/// Infers a content type from the first bytes of a body
///
/// Follows the WHATWG MIME sniffing table for the formats a web server is
/// likely to return. Text without binary control bytes is reported as
/// `text/plain`; anything else unrecognized is `application/octet-stream`.
pub fn detect_content_type(data: &[u8]) -> &'static str {
    let data = &data[..data.len().min(SNIFF_LEN)];

    let first_non_ws = data
        .iter()
        .position(|b| !is_whitespace(*b))
        .unwrap_or(data.len());
    let trimmed = &data[first_non_ws..];

    if HTML_SIGNATURES.iter().any(|sig| matches_html_tag(trimmed, sig)) {
        return "text/html; charset=utf-8";
    }
    if trimmed.starts_with(b"<?xml") {
        return "text/xml; charset=utf-8";
    }

    if let Some(&(_, content_type)) = EXACT_SIGNATURES
        .iter()
        .find(|(signature, _)| data.starts_with(signature))
    {
        return content_type;
    }

    if data.len() >= 14 && data.starts_with(b"RIFF") && &data[8..14] == b"WEBPVP" {
        return "image/webp";
    }

    if data.iter().any(|b| is_binary(*b)) {
        OCTET_STREAM
    } else {
        "text/plain; charset=utf-8"
    }
}

/// Tags that mark a document as HTML when they open the body
const HTML_SIGNATURES: &[&[u8]] = &[
    b"<!DOCTYPE HTML",
    b"<HTML",
    b"<HEAD",
    b"<SCRIPT",
    b"<IFRAME",
    b"<H1",
    b"<DIV",
    b"<FONT",
    b"<TABLE",
    b"<A",
    b"<STYLE",
    b"<TITLE",
    b"<B",
    b"<BODY",
    b"<BR",
    b"<P",
    b"<!--",
];

/// Byte prefixes that identify a format on their own
const EXACT_SIGNATURES: &[(&[u8], &str)] = &[
    (b"%PDF-", "application/pdf"),
    (b"%!PS-Adobe-", "application/postscript"),
    (b"\xFE\xFF", "text/plain; charset=utf-16be"),
    (b"\xFF\xFE", "text/plain; charset=utf-16le"),
    (b"\xEF\xBB\xBF", "text/plain; charset=utf-8"),
    (b"GIF87a", "image/gif"),
    (b"GIF89a", "image/gif"),
    (b"\x89PNG\x0D\x0A\x1A\x0A", "image/png"),
    (b"\xFF\xD8\xFF", "image/jpeg"),
    (b"BM", "image/bmp"),
    (b"\x00\x00\x01\x00", "image/x-icon"),
    (b"OggS\x00", "application/ogg"),
    (b"ID3", "audio/mpeg"),
    (b"PK\x03\x04", "application/zip"),
    (b"\x1F\x8B\x08", "application/x-gzip"),
    (b"Rar!\x1A\x07\x00", "application/x-rar-compressed"),
    (b"Rar!\x1A\x07\x01\x00", "application/x-rar-compressed"),
    (b"\x00\x61\x73\x6D", "application/wasm"),
];

/// Case-insensitive tag match that requires a space or `>` after the tag name
fn matches_html_tag(data: &[u8], signature: &[u8]) -> bool {
    if data.len() <= signature.len() {
        return false;
    }

    let (head, rest) = data.split_at(signature.len());
    head.eq_ignore_ascii_case(signature) && matches!(rest[0], b' ' | b'>')
}

fn is_whitespace(b: u8) -> bool {
    matches!(b, b'\t' | b'\n' | b'\x0C' | b'\r' | b' ')
}

fn is_binary(b: u8) -> bool {
    matches!(b, 0x00..=0x08 | 0x0B | 0x0E..=0x1A | 0x1C..=0x1F)
}
