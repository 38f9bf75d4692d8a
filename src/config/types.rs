use serde::Deserialize;
use std::time::Duration;

/// Worker count used when none is configured or the configured one is below 1
pub const DEFAULT_NUM_WORKERS: usize = 10;

/// Upper bound on concurrent crawl workers
pub const MAX_NUM_WORKERS: usize = 24;

/// Per-request timeout used when none is configured
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// User agent sent with every request; some sites refuse obvious bots
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/99.0.4844.51 Safari/537.36";

/// How much diagnostic output a run produces
///
/// Anything above `Silent` shares stderr with log lines, which is why the
/// orchestrator switches to buffered result output in that case.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord)]
pub enum Verbosity {
    #[default]
    Silent,
    Error,
    Debug,
}

impl Verbosity {
    /// Maps the number of `-v` flags to a level
    pub fn from_occurrences(count: u8) -> Self {
        match count {
            0 => Self::Silent,
            1 => Self::Error,
            _ => Self::Debug,
        }
    }
}

/// Crawl engine configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawlerConfig {
    /// Number of concurrent crawl workers
    pub num_workers: usize,

    /// Timeout applied to each HTTP request, body included
    pub timeout: Duration,

    /// Value of the `User-Agent` header
    pub user_agent: String,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            num_workers: DEFAULT_NUM_WORKERS,
            timeout: DEFAULT_TIMEOUT,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

/// Contents of an optional TOML settings file
///
/// Every key may be omitted. Command-line flags take precedence over values
/// read from the file.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub crawler: CrawlerSettings,
    pub output: OutputSettings,
}

/// `[crawler]` table of the settings file
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CrawlerSettings {
    /// Number of concurrent crawl workers
    pub workers: usize,

    /// Per-request timeout in seconds
    #[serde(rename = "timeout-secs")]
    pub timeout_secs: u64,

    #[serde(rename = "user-agent")]
    pub user_agent: String,
}

impl Default for CrawlerSettings {
    fn default() -> Self {
        Self {
            workers: DEFAULT_NUM_WORKERS,
            timeout_secs: DEFAULT_TIMEOUT.as_secs(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

/// `[output]` table of the settings file
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OutputSettings {
    /// Indent the JSON report
    pub pretty: bool,
}

impl Default for OutputSettings {
    fn default() -> Self {
        Self { pretty: true }
    }
}

impl Settings {
    /// Builds the engine configuration described by the `[crawler]` table
    pub fn crawler_config(&self) -> CrawlerConfig {
        CrawlerConfig {
            num_workers: self.crawler.workers,
            timeout: Duration::from_secs(self.crawler.timeout_secs),
            user_agent: self.crawler.user_agent.clone(),
        }
    }
}
