//! Input source selection
//!
//! Sources can come from command-line arguments, a file, or any reader such as
//! a piped stdin. The first usable candidate wins; the rest are ignored.

use crate::app::ExitCode;
use std::fmt;
use std::io::Cursor;
use std::path::PathBuf;
use thiserror::Error;
use tokio::io::AsyncRead;

/// Byte stream of newline-separated sources
pub type Input = Box<dyn AsyncRead + Send + Unpin>;

/// A candidate place to read sources from
pub enum InputSource {
    /// Sources given directly; usable when non-empty
    Links(Vec<String>),

    /// A file with one source per line; usable when the path is non-empty
    File(PathBuf),

    /// Any reader, always usable
    Reader(Input),
}

impl fmt::Debug for InputSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Links(links) => f.debug_tuple("Links").field(links).finish(),
            Self::File(path) => f.debug_tuple("File").field(path).finish(),
            Self::Reader(_) => f.write_str("Reader(..)"),
        }
    }
}

/// Errors that prevent a run from reading any sources
#[derive(Debug, Error)]
pub enum InputError {
    #[error("no input source")]
    NoInputSource,

    #[error("could not open input file: {0}")]
    Open(#[from] std::io::Error),

    #[error("unsupported input source: {0}")]
    Unsupported(String),
}

impl InputError {
    pub fn exit_code(&self) -> ExitCode {
        match self {
            Self::NoInputSource => ExitCode::NoInputSource,
            Self::Open(_) => ExitCode::OpenInputSource,
            Self::Unsupported(_) => ExitCode::UnsupportedInputSource,
        }
    }
}

/// Opens the first usable candidate
///
/// Links are joined with newlines into an in-memory stream. A file is opened
/// for reading; a path naming a directory is rejected as unsupported.
pub async fn open_input<I>(candidates: I) -> Result<Input, InputError>
where
    I: IntoIterator<Item = InputSource>,
{
    for candidate in candidates {
        match candidate {
            InputSource::Links(links) if !links.is_empty() => {
                tracing::debug!(count = links.len(), "reading sources from arguments");
                return Ok(Box::new(Cursor::new(links.join("\n").into_bytes())));
            }
            InputSource::File(path) if !path.as_os_str().is_empty() => {
                let file = tokio::fs::File::open(&path).await?;
                if file.metadata().await?.is_dir() {
                    return Err(InputError::Unsupported(format!(
                        "{} is a directory",
                        path.display()
                    )));
                }
                tracing::debug!(path = %path.display(), "reading sources from file");
                return Ok(Box::new(file));
            }
            InputSource::Reader(reader) => {
                tracing::debug!("reading sources from stream");
                return Ok(reader);
            }
            _ => continue,
        }
    }

    Err(InputError::NoInputSource)
}
