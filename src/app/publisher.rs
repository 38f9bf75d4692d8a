//! Source publisher
//!
//! Feeds the crawl engine's source queue from a line-oriented byte stream.

use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Reads sources line by line into a bounded queue
#[derive(Debug, Clone, Copy)]
pub struct SourcePublisher {
    capacity: usize,
}

impl SourcePublisher {
    /// Creates a publisher whose queue holds two sources per worker
    pub fn new(num_workers: usize) -> Self {
        Self {
            capacity: num_workers.max(1) * 2,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Starts publishing `input` on a background task
    ///
    /// Every line, empty ones included, becomes one source. A trailing `\r`
    /// is dropped and invalid UTF-8 is replaced, so a garbled line turns into
    /// one source that fails to parse instead of ending the input. The queue is
    /// closed when the input ends, when reading fails, or as soon as `token`
    /// is canceled; a line read after cancellation is never published. A
    /// read error is logged and otherwise treated as the end of the input.
    ///
    /// # Returns
    ///
    /// The receiving end of the queue and the handle of the publishing task
    pub fn publish<R>(
        &self,
        token: CancellationToken,
        input: R,
    ) -> (mpsc::Receiver<String>, JoinHandle<()>)
    where
        R: AsyncRead + Send + Unpin + 'static,
    {
        let (tx, rx) = mpsc::channel(self.capacity);

        let handle = tokio::spawn(async move {
            let mut lines = BufReader::new(input).split(b'\n');

            loop {
                let line = tokio::select! {
                    biased;
                    _ = token.cancelled() => break,
                    line = lines.next_segment() => line,
                };

                let source = match line {
                    Ok(Some(line)) => decode_line(&line),
                    Ok(None) => break,
                    Err(e) => {
                        tracing::error!(error = %e, "could not read input for publishing");
                        break;
                    }
                };

                if token.is_cancelled() {
                    break;
                }

                tracing::debug!(source = %source, "publishing source");
                tokio::select! {
                    biased;
                    _ = token.cancelled() => break,
                    sent = tx.send(source) => {
                        if sent.is_err() {
                            break;
                        }
                    }
                }
            }

            tracing::debug!("stopped publishing sources");
        });

        (rx, handle)
    }
}

fn decode_line(line: &[u8]) -> String {
    let line = line.strip_suffix(b"\r").unwrap_or(line);
    String::from_utf8_lossy(line).into_owned()
}
