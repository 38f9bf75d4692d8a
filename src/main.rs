//! Link Census main entry point
//!
//! This is the command-line interface for the Link Census crawler.

use clap::Parser;
use link_census::app::{self, InputSource};
use link_census::config::{load_settings, Settings, Verbosity};
use std::io::IsTerminal;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

/// Link Census: count the internal and external links of web pages
///
/// Pages are read from the command line, from a file, or from stdin (one per
/// line) and crawled concurrently. The report is a JSON array with one entry
/// per page, written to stdout.
#[derive(Parser, Debug)]
#[command(name = "link-census")]
#[command(version)]
#[command(about = "Count the internal and external links of web pages", long_about = None)]
struct Cli {
    /// Pages to crawl; https is assumed when the scheme is missing
    #[arg(value_name = "LINK")]
    links: Vec<String>,

    /// Read pages from a file, one per line
    #[arg(short, long, value_name = "PATH")]
    file: Option<PathBuf>,

    /// Number of pages crawled in parallel (1-24)
    #[arg(short, long, value_name = "NUM")]
    parallel: Option<usize>,

    /// Per-request timeout in seconds
    #[arg(short, long, value_name = "SECONDS")]
    timeout: Option<u64>,

    /// Write the report on a single line
    #[arg(long)]
    no_pretty: bool,

    /// Log to stderr (-v errors, -vv debug); the report is then written at the end
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Path to a TOML settings file
    #[arg(short, long, value_name = "CONFIG")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let verbosity = Verbosity::from_occurrences(cli.verbose);
    setup_logging(verbosity);

    let settings = match &cli.config {
        Some(path) => match load_settings(path) {
            Ok(settings) => settings,
            Err(e) => {
                eprintln!("{}: {}", path.display(), e);
                return app::ExitCode::BadArgs.into();
            }
        },
        None => Settings::default(),
    };

    let mut crawler = settings.crawler_config();
    if let Some(parallel) = cli.parallel {
        crawler.num_workers = parallel;
    }
    if let Some(timeout) = cli.timeout {
        crawler.timeout = Duration::from_secs(timeout);
    }

    let config = app::Config {
        out: Box::new(std::io::stdout()),
        err: Box::new(std::io::stderr()),
        crawler,
        pretty_output: settings.output.pretty && !cli.no_pretty,
        verbosity,
    };

    let mut sources = vec![InputSource::Links(cli.links)];
    if let Some(file) = cli.file {
        sources.push(InputSource::File(file));
    }
    if !std::io::stdin().is_terminal() {
        sources.push(InputSource::Reader(Box::new(tokio::io::stdin())));
    }

    app::run(config, sources).await.into()
}

/// Sets up the logging/tracing subscriber based on verbosity level
///
/// Logs go to stderr so that stdout only ever carries the report.
fn setup_logging(verbosity: Verbosity) {
    let filter = match verbosity {
        Verbosity::Silent => EnvFilter::new("off"),
        Verbosity::Error => EnvFilter::new("error"),
        Verbosity::Debug => EnvFilter::new("link_census=debug,warn"),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}
