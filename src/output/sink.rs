//! Result sinks
//!
//! Both sinks consume the result queue until it closes and produce the same
//! bytes for the same sequence of results. They differ in when those bytes
//! are written:
//!
//! - `Buffered` holds every record until the queue closes, then writes the
//!   whole array at once. Used when log lines share the terminal with the
//!   report.
//! - `Streaming` writes `[` right away and each record as soon as it is
//!   received. A write failure stops the sink; what was already written
//!   stays written.

use crate::config::Verbosity;
use crate::crawler::CrawlResult;
use crate::output::{OutputError, OutputResult, ResultRecord};
use std::io::Write;
use tokio::sync::mpsc;

const INDENT: &str = "  ";

/// Strategy for writing the JSON report
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResultSink {
    Buffered { pretty: bool },
    Streaming { pretty: bool },
}

impl ResultSink {
    /// Picks the sink for a verbosity level
    ///
    /// Any log output goes to the same terminal as the report, so every
    /// level above `Silent` gets the buffered sink.
    pub fn for_verbosity(verbosity: Verbosity, pretty: bool) -> Self {
        if verbosity > Verbosity::Silent {
            Self::Buffered { pretty }
        } else {
            Self::Streaming { pretty }
        }
    }

    /// Writes every result received from `results` to `out`
    ///
    /// # Returns
    ///
    /// * `Ok(usize)` - Number of records written
    /// * `Err(OutputError)` - Writing failed; remaining results are dropped
    pub async fn consume<W>(
        self,
        out: &mut W,
        results: mpsc::Receiver<CrawlResult>,
    ) -> OutputResult<usize>
    where
        W: Write + ?Sized,
    {
        match self {
            Self::Buffered { pretty } => write_buffered(out, results, pretty).await,
            Self::Streaming { pretty } => write_streaming(out, results, pretty).await,
        }
    }
}

async fn write_buffered<W>(
    out: &mut W,
    mut results: mpsc::Receiver<CrawlResult>,
    pretty: bool,
) -> OutputResult<usize>
where
    W: Write + ?Sized,
{
    let mut records = Vec::new();
    while let Some(result) = results.recv().await {
        tracing::debug!(source = %result.source, "received result");
        records.push(ResultRecord::from(&result));
    }

    if pretty {
        serde_json::to_writer_pretty(&mut *out, &records)?;
    } else {
        serde_json::to_writer(&mut *out, &records)?;
    }
    out.write_all(b"\n")
        .and_then(|()| out.flush())
        .map_err(serde_json::Error::io)?;

    Ok(records.len())
}

async fn write_streaming<W>(
    out: &mut W,
    mut results: mpsc::Receiver<CrawlResult>,
    pretty: bool,
) -> OutputResult<usize>
where
    W: Write + ?Sized,
{
    out.write_all(b"[")
        .and_then(|()| out.flush())
        .map_err(OutputError::OpenBracket)?;

    let mut written = 0;
    while let Some(result) = results.recv().await {
        tracing::debug!(source = %result.source, "received result");

        let encoded = encode_record(&ResultRecord::from(&result), pretty)?;
        let separator = match (written, pretty) {
            (0, false) => String::new(),
            (_, false) => ",".to_string(),
            (0, true) => format!("\n{}", INDENT),
            (_, true) => format!(",\n{}", INDENT),
        };

        out.write_all(separator.as_bytes())
            .and_then(|()| out.write_all(encoded.as_bytes()))
            .and_then(|()| out.flush())
            .map_err(|error| OutputError::Record {
                source_url: result.source.clone(),
                error,
            })?;
        written += 1;
    }

    let closing = if pretty && written > 0 { "\n]\n" } else { "]\n" };
    out.write_all(closing.as_bytes())
        .and_then(|()| out.flush())
        .map_err(OutputError::CloseBracket)?;

    Ok(written)
}

/// Encodes one record as an array element
fn encode_record(record: &ResultRecord, pretty: bool) -> OutputResult<String> {
    if pretty {
        let encoded = serde_json::to_string_pretty(record)?;
        Ok(encoded.replace('\n', &format!("\n{}", INDENT)))
    } else {
        Ok(serde_json::to_string(record)?)
    }
}
