//! Anchor extraction from HTML documents

use super::{ExtractError, LinkExtractor};
use html5ever::tendril::StrTendril;
use html5ever::tokenizer::states::RawKind;
use html5ever::tokenizer::{
    BufferQueue, Tag, TagKind, Token, TokenSink, TokenSinkResult, Tokenizer, TokenizerOpts,
};
use std::io::{self, Read};

/// Bytes read from the body per tokenizer feed
const CHUNK_LEN: usize = 8 * 1024;

/// Collects the `href` of every anchor in an HTML document
///
/// The body is tokenized as it is read; no document tree is built. Values
/// are returned as written in the markup, with character references decoded
/// and newline characters removed, since browsers ignore those inside URLs.
/// Empty values, fragments and non-HTTP schemes are kept; sorting them out is
/// left to link classification. Markup inside `<script>`, `<style>` and the
/// other raw-text elements is not scanned.
///
/// Truncated or malformed markup is not an error. Only a failure to read the
/// body is reported.
#[derive(Debug, Clone, Copy, Default)]
pub struct HtmlExtractor;

impl LinkExtractor for HtmlExtractor {
    fn extract(&self, body: &mut dyn Read) -> Result<Vec<String>, ExtractError> {
        let mut tokenizer = Tokenizer::new(AnchorSink::default(), TokenizerOpts::default());
        let mut queue = BufferQueue::new();
        let mut chunk = vec![0u8; CHUNK_LEN];
        let mut pending = Vec::new();

        loop {
            let read = match body.read(&mut chunk) {
                Ok(0) => break,
                Ok(read) => read,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(ExtractError::read("html", e)),
            };

            pending.extend_from_slice(&chunk[..read]);
            let complete = pending.len() - incomplete_utf8_suffix(&pending);
            let text: Vec<u8> = pending.drain(..complete).collect();
            feed(&mut tokenizer, &mut queue, &text);
        }

        feed(&mut tokenizer, &mut queue, &pending);
        tokenizer.end();

        Ok(tokenizer.sink.links)
    }
}

fn feed(tokenizer: &mut Tokenizer<AnchorSink>, queue: &mut BufferQueue, bytes: &[u8]) {
    if bytes.is_empty() {
        return;
    }
    queue.push_back(StrTendril::from_slice(&String::from_utf8_lossy(bytes)));
    // The sink never hands control back for scripts, so feeding always runs dry.
    let _ = tokenizer.feed(queue);
}

/// Length of a UTF-8 sequence cut off at the end of `bytes`
fn incomplete_utf8_suffix(bytes: &[u8]) -> usize {
    for back in 1..=bytes.len().min(3) {
        let byte = bytes[bytes.len() - back];
        if byte & 0b1100_0000 == 0b1000_0000 {
            continue;
        }
        let width = match byte {
            0xC0..=0xDF => 2,
            0xE0..=0xEF => 3,
            0xF0..=0xF7 => 4,
            _ => 1,
        };
        return if width > back { back } else { 0 };
    }
    0
}

#[derive(Debug, Default)]
struct AnchorSink {
    links: Vec<String>,
}

impl TokenSink for AnchorSink {
    type Handle = ();

    fn process_token(&mut self, token: Token, _line_number: u64) -> TokenSinkResult<()> {
        let Token::TagToken(tag) = token else {
            return TokenSinkResult::Continue;
        };
        if tag.kind != TagKind::StartTag {
            return TokenSinkResult::Continue;
        }

        if &*tag.name == "a" {
            if let Some(href) = tag.attrs.iter().find(|attr| &*attr.name.local == "href") {
                self.links.push(href.value.replace('\n', ""));
            }
        }

        text_state_after(&tag)
    }
}

/// Switches the tokenizer to raw text after elements whose content is not markup
fn text_state_after(tag: &Tag) -> TokenSinkResult<()> {
    if tag.self_closing {
        return TokenSinkResult::Continue;
    }

    match &*tag.name {
        "script" => TokenSinkResult::RawData(RawKind::ScriptData),
        "iframe" | "noembed" | "noframes" | "noscript" | "style" | "xmp" => {
            TokenSinkResult::RawData(RawKind::Rawtext)
        }
        "textarea" | "title" => TokenSinkResult::RawData(RawKind::Rcdata),
        "plaintext" => TokenSinkResult::Plaintext,
        _ => TokenSinkResult::Continue,
    }
}
