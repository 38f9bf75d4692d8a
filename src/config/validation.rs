use crate::config::types::{Settings, MAX_NUM_WORKERS};
use crate::ConfigError;

/// Validates a settings file
pub fn validate(settings: &Settings) -> Result<(), ConfigError> {
    validate_num_workers(settings.crawler.workers)?;

    if settings.crawler.timeout_secs == 0 {
        return Err(ConfigError::Validation(
            "timeout-secs must be greater than 0".to_string(),
        ));
    }

    if settings.crawler.user_agent.trim().is_empty() {
        return Err(ConfigError::Validation(
            "user-agent cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Checks that a worker count lies within `1..=MAX_NUM_WORKERS`
///
/// The crawl engine clamps out-of-range counts on its own; this check is for
/// the boundaries where a bad count should be reported to the user instead.
pub fn validate_num_workers(num_workers: usize) -> Result<(), ConfigError> {
    if num_workers < 1 {
        return Err(ConfigError::Validation(
            "number of workers must be greater than 0".to_string(),
        ));
    }

    if num_workers > MAX_NUM_WORKERS {
        return Err(ConfigError::Validation(format!(
            "maximum workers is {}",
            MAX_NUM_WORKERS
        )));
    }

    Ok(())
}
