//! Configuration validation logic.

use regex::Regex;
use url::Url;

use crate::config::loader::Config;
use crate::error::{Error, Result};

/// Maximum account handle length.
const MAX_HANDLE_LENGTH: usize = 15;

/// Validate the entire configuration.
pub fn validate_config(config: &Config) -> Result<()> {
    validate_endpoint(&config.browser.timeline_endpoint)?;
    validate_timing(config)?;
    validate_base_url(&config.site.base_url)?;

    if config.download.concurrency == 0 {
        return Err(invalid("download.concurrency", "must be at least 1"));
    }

    Ok(())
}

fn invalid(field: &str, message: impl Into<String>) -> Error {
    Error::ConfigValidation {
        field: field.to_string(),
        message: message.into(),
    }
}

/// Validate the timeline endpoint pattern.
pub fn validate_endpoint(pattern: &str) -> Result<()> {
    if pattern.trim().is_empty() {
        return Err(Error::MissingConfig("browser.timeline_endpoint".to_string()));
    }

    Regex::new(pattern).map_err(|e| invalid("browser.timeline_endpoint", e.to_string()))?;
    Ok(())
}

/// Validate timeouts, attempts and scroll intervals.
///
/// None may be zero, or stagnation detection turns into a busy loop.
pub fn validate_timing(config: &Config) -> Result<()> {
    let timing = &config.timing;

    for (field, value) in [
        ("timing.startup_timeout_ms", timing.startup_timeout_ms),
        ("timing.attempt_timeout_ms", timing.attempt_timeout_ms),
        ("timing.login_poll_ms", timing.login_poll_ms),
        ("timing.login_timeout_secs", timing.login_timeout_secs),
    ] {
        if value == 0 {
            return Err(invalid(field, "must be greater than zero"));
        }
    }

    if timing.provoke_attempts == 0 {
        return Err(invalid("timing.provoke_attempts", "must be at least 1"));
    }

    let intervals = &timing.scroll_intervals_ms;
    if intervals.is_empty() {
        return Err(invalid(
            "timing.scroll_intervals_ms",
            "at least one interval is required",
        ));
    }

    if intervals.contains(&0) {
        return Err(invalid(
            "timing.scroll_intervals_ms",
            "intervals must be greater than zero",
        ));
    }

    if intervals.windows(2).any(|w| w[0] > w[1]) {
        return Err(invalid(
            "timing.scroll_intervals_ms",
            format!("intervals must be ascending (got {:?})", intervals),
        ));
    }

    Ok(())
}

fn validate_base_url(base_url: &str) -> Result<()> {
    let url = Url::parse(base_url)?;
    if url.scheme() != "https" && url.scheme() != "http" {
        return Err(invalid("site.base_url", "must be an http(s) URL"));
    }
    Ok(())
}

/// Pattern every account handle matches.
const HANDLE_PATTERN: &str = r"^[A-Za-z0-9_]+$";

/// Validate account folder names given on the command line.
pub fn validate_folders<S: AsRef<str>, I: IntoIterator<Item = S>>(folders: I) -> Result<()> {
    let handle_pattern = handle_regex()?;

    for folder in folders {
        check_handle(&handle_pattern, folder.as_ref())?;
    }

    Ok(())
}

/// Keep the listed folders that are valid account handles, warning about the rest.
pub fn filter_valid_folders(folders: Vec<String>) -> Result<Vec<String>> {
    let handle_pattern = handle_regex()?;

    Ok(folders
        .into_iter()
        .filter(|folder| match check_handle(&handle_pattern, folder) {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!("Skipping folder: {}", e);
                false
            }
        })
        .collect())
}

fn handle_regex() -> Result<Regex> {
    Regex::new(HANDLE_PATTERN).map_err(|e| Error::Config(format!("Invalid handle pattern: {}", e)))
}

fn check_handle(handle_pattern: &Regex, folder: &str) -> Result<()> {
    if folder.is_empty() || folder.len() > MAX_HANDLE_LENGTH {
        return Err(invalid(
            "folder",
            format!(
                "'{}' must be between 1 and {} characters",
                folder, MAX_HANDLE_LENGTH
            ),
        ));
    }

    if !handle_pattern.is_match(folder) {
        return Err(invalid(
            "folder",
            format!(
                "'{}' contains invalid characters. Only letters, digits and underscores allowed.",
                folder
            ),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate_config(&Config::default()).is_ok());
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let mut config = Config::default();
        config.timing.attempt_timeout_ms = 0;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_zero_attempts_rejected() {
        let mut config = Config::default();
        config.timing.provoke_attempts = 0;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_intervals_validation() {
        let mut config = Config::default();

        config.timing.scroll_intervals_ms = vec![];
        assert!(validate_timing(&config).is_err());

        config.timing.scroll_intervals_ms = vec![10, 0, 100];
        assert!(validate_timing(&config).is_err());

        config.timing.scroll_intervals_ms = vec![100, 50];
        assert!(validate_timing(&config).is_err());

        config.timing.scroll_intervals_ms = vec![20, 20, 200];
        assert!(validate_timing(&config).is_ok());
    }

    #[test]
    fn test_bad_endpoint_rejected() {
        assert!(validate_endpoint("(unclosed").is_err());
        assert!(validate_endpoint("").is_err());
    }

    #[test]
    fn test_zero_concurrency_rejected() {
        let mut config = Config::default();
        config.download.concurrency = 0;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_valid_folders() {
        assert!(validate_folders(["some_user", "User123"]).is_ok());
    }

    #[test]
    fn test_invalid_folders() {
        assert!(validate_folders(["has-dash"]).is_err());
        assert!(validate_folders(["way_too_long_handle_name"]).is_err());
        assert!(validate_folders([""]).is_err());
    }

    #[test]
    fn test_stray_directories_are_filtered_not_fatal() {
        let dir = tempfile::tempdir().unwrap();
        for name in [".git", "old-backup", "sixteen_chars_ab", "someone", "Other_1"] {
            std::fs::create_dir(dir.path().join(name)).unwrap();
        }
        std::fs::write(dir.path().join("someone.txt"), "1").unwrap();

        let listed = crate::fs::list_folders(dir.path()).unwrap();
        let folders = filter_valid_folders(listed).unwrap();

        assert_eq!(folders, vec!["Other_1", "someone"]);
    }
}
