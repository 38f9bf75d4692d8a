use crate::config::types::Settings;
use crate::config::validation::validate;
use crate::ConfigError;
use std::path::Path;

/// Loads and validates a settings file from the given path
///
/// # Arguments
///
/// * `path` - Path to the TOML settings file
///
/// # Returns
///
/// * `Ok(Settings)` - Successfully loaded and validated settings
/// * `Err(ConfigError)` - Failed to load, parse, or validate the file
///
/// # Example
///
/// ```no_run
/// use std::path::Path;
/// use link_census::config::load_settings;
///
/// let settings = load_settings(Path::new("link-census.toml")).unwrap();
/// println!("Timeout: {}s", settings.crawler.timeout_secs);
/// ```
pub fn load_settings(path: &Path) -> Result<Settings, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let settings: Settings = toml::from_str(&content)?;
    validate(&settings)?;

    tracing::debug!(path = %path.display(), "loaded settings file");
    Ok(settings)
}
