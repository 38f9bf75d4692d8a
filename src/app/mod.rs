//! Pipeline orchestration
//!
//! [`run`] wires the pieces of a crawl together:
//!
//! ```text
//! input ──> SourcePublisher ──> LinkCrawler workers ──> ResultSink ──> out
//! ```
//!
//! The stages run concurrently and share one cancellation token. An
//! interrupt watcher races the pipeline: Ctrl-C (or SIGTERM) cancels the run
//! and makes it exit with [`ExitCode::OperationCanceled`].

mod input;
mod publisher;

pub use input::{open_input, Input, InputError, InputSource};
pub use publisher::SourcePublisher;

use crate::config::{validate_num_workers, CrawlerConfig, Verbosity};
use crate::crawler::LinkCrawler;
use crate::extract::ExtractorRegistry;
use crate::output::ResultSink;
use std::future::Future;
use std::io::Write;
use std::sync::{Arc, Mutex, PoisonError};
use tokio_util::sync::CancellationToken;

/// Outcome of a run, mapped one-to-one onto process exit codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ExitCode {
    Ok = 0,
    OperationCanceled = 1,
    NoInputSource = 2,
    OpenInputSource = 3,
    UnsupportedInputSource = 4,
    BadArgs = 5,
    Output = 6,
}

impl ExitCode {
    pub fn as_u8(self) -> u8 {
        self as u8
    }
}

impl From<ExitCode> for std::process::ExitCode {
    fn from(code: ExitCode) -> Self {
        std::process::ExitCode::from(code.as_u8())
    }
}

/// Everything a run needs besides its input
pub struct Config {
    /// Destination of the JSON report
    pub out: Box<dyn Write + Send>,

    /// Destination of top-level error messages
    pub err: Box<dyn Write + Send>,

    pub crawler: CrawlerConfig,

    /// Indent the JSON report
    pub pretty_output: bool,

    pub verbosity: Verbosity,
}

/// Runs a crawl until it completes or the process is interrupted
///
/// See [`run_until`].
pub async fn run<I>(config: Config, sources: I) -> ExitCode
where
    I: IntoIterator<Item = InputSource>,
{
    run_until(config, sources, interrupt_signal()).await
}

/// Runs a crawl until it completes or `interrupt` resolves
///
/// # Steps
///
/// 1. Open the first usable input source
/// 2. Check that the worker count lies within 1..=24
/// 3. Build the crawl engine with the default extractors
/// 4. Publish, crawl and write the report concurrently
///
/// Failures in the first three steps are written to `config.err` and no
/// request is made. Per-source failures never fail the run; they are part of
/// the report.
///
/// # Returns
///
/// * `ExitCode::Ok` - Every source was processed and the report was written
/// * `ExitCode::OperationCanceled` - `interrupt` resolved before the run finished
/// * `ExitCode::Output` - The report could not be written
/// * Any other code - The run could not start
pub async fn run_until<I, F>(mut config: Config, sources: I, interrupt: F) -> ExitCode
where
    I: IntoIterator<Item = InputSource>,
    F: Future<Output = ()> + Send + 'static,
{
    let input = match open_input(sources).await {
        Ok(input) => input,
        Err(e) => {
            report(&mut config.err, &e);
            return e.exit_code();
        }
    };

    if let Err(e) = validate_num_workers(config.crawler.num_workers) {
        report(&mut config.err, &e);
        return ExitCode::BadArgs;
    }

    let crawler = match LinkCrawler::new(&config.crawler, ExtractorRegistry::with_defaults()) {
        Ok(crawler) => crawler,
        Err(e) => {
            report(&mut config.err, &e);
            return ExitCode::BadArgs;
        }
    };

    let pipeline = Pipeline {
        publisher: SourcePublisher::new(crawler.num_workers()),
        crawler,
        sink: ResultSink::for_verbosity(config.verbosity, config.pretty_output),
        out: config.out,
        err: config.err,
        report_to_err: config.verbosity == Verbosity::Silent,
    };

    pipeline.run(input, interrupt).await
}

/// Resolves on Ctrl-C, or on SIGTERM on unix
pub async fn interrupt_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        match signal(SignalKind::terminate()) {
            Ok(mut terminate) => {
                tokio::select! {
                    _ = ctrl_c() => {}
                    _ = terminate.recv() => {}
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "could not listen for SIGTERM");
                ctrl_c().await;
            }
        }
    }

    #[cfg(not(unix))]
    ctrl_c().await;
}

async fn ctrl_c() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "could not listen for Ctrl-C");
        std::future::pending::<()>().await;
    }
}

fn report(err: &mut dyn Write, error: &dyn std::fmt::Display) {
    // Nothing sensible is left to do if the error stream is gone too.
    let _ = writeln!(err, "{}", error);
}

struct Pipeline {
    publisher: SourcePublisher,
    crawler: LinkCrawler,
    sink: ResultSink,
    out: Box<dyn Write + Send>,
    err: Box<dyn Write + Send>,
    /// Logging is off in silent mode, so output errors go to `err` instead
    report_to_err: bool,
}

impl Pipeline {
    async fn run<F>(self, input: Input, interrupt: F) -> ExitCode
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let token = CancellationToken::new();
        let code = Arc::new(Mutex::new(ExitCode::Ok));

        let watcher = tokio::spawn({
            let token = token.clone();
            let code = Arc::clone(&code);
            async move {
                tokio::select! {
                    _ = interrupt => {
                        tracing::debug!("received interrupt, canceling run");
                        *lock(&code) = ExitCode::OperationCanceled;
                        token.cancel();
                    }
                    _ = token.cancelled() => {}
                }
            }
        });

        let work = tokio::spawn({
            let token = token.clone();
            let code = Arc::clone(&code);
            async move {
                let _cancel_on_exit = token.clone().drop_guard();
                let Pipeline {
                    publisher,
                    crawler,
                    sink,
                    mut out,
                    mut err,
                    report_to_err,
                } = self;

                let (sources, publishing) = publisher.publish(token.clone(), input);
                let results = crawler.crawl_links(token.clone(), sources);

                let outcome = match sink.consume(&mut out, results).await {
                    Ok(written) => {
                        tracing::debug!(records = written, "report written");
                        ExitCode::Ok
                    }
                    Err(e) => {
                        tracing::error!(error = %e, "failed to write report");
                        if report_to_err {
                            report(&mut err, &e);
                        }
                        ExitCode::Output
                    }
                };

                {
                    let mut code = lock(&code);
                    if outcome != ExitCode::Ok && *code != ExitCode::OperationCanceled {
                        *code = outcome;
                    }
                }

                token.cancel();
                if let Err(e) = publishing.await {
                    tracing::error!(error = %e, "source publisher failed");
                }
            }
        });

        let (watched, worked) = tokio::join!(watcher, work);
        for joined in [watched, worked] {
            if let Err(e) = joined {
                tracing::error!(error = %e, "pipeline task failed");
            }
        }

        let code = *lock(&code);
        code
    }
}

fn lock(code: &Mutex<ExitCode>) -> std::sync::MutexGuard<'_, ExitCode> {
    code.lock().unwrap_or_else(PoisonError::into_inner)
}
