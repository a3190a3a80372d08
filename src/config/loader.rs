//! Configuration structures and loading logic.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::browser::BrowserSettings;
use crate::error::{Error, Result};
use crate::stream::{StreamConfig, DEFAULT_TIMELINE_ENDPOINT};

/// Main configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub browser: BrowserConfig,

    #[serde(default)]
    pub timing: TimingConfig,

    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub download: DownloadConfig,

    #[serde(default)]
    pub site: SiteConfig,
}

/// Browser configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrowserConfig {
    /// Run without a visible window. Login always uses a visible window.
    #[serde(default)]
    pub headless: bool,

    /// Chromium executable; autodetected when unset.
    #[serde(default)]
    pub executable: Option<PathBuf>,

    /// Pattern matching the timeline data endpoint URL.
    #[serde(default = "default_timeline_endpoint")]
    pub timeline_endpoint: String,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            headless: false,
            executable: None,
            timeline_endpoint: default_timeline_endpoint(),
        }
    }
}

/// Timeouts and pacing, in milliseconds unless noted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimingConfig {
    /// Wait for the first timeline response after navigation.
    #[serde(default = "default_startup_timeout")]
    pub startup_timeout_ms: u64,

    /// Pause after the first response before pulling.
    #[serde(default = "default_settle_delay")]
    pub settle_delay_ms: u64,

    /// Wait for new data after each scroll attempt.
    #[serde(default = "default_attempt_timeout")]
    pub attempt_timeout_ms: u64,

    /// Scroll attempts before a timeline is considered exhausted.
    #[serde(default = "default_provoke_attempts")]
    pub provoke_attempts: u32,

    /// Escalating waits between scrolls, shortest first.
    #[serde(default = "default_scroll_intervals")]
    pub scroll_intervals_ms: Vec<u64>,

    /// Cookie polling interval while waiting for login.
    #[serde(default = "default_login_poll")]
    pub login_poll_ms: u64,

    /// Give up waiting for login after this many seconds.
    #[serde(default = "default_login_timeout")]
    pub login_timeout_secs: u64,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            startup_timeout_ms: default_startup_timeout(),
            settle_delay_ms: default_settle_delay(),
            attempt_timeout_ms: default_attempt_timeout(),
            provoke_attempts: default_provoke_attempts(),
            scroll_intervals_ms: default_scroll_intervals(),
            login_poll_ms: default_login_poll(),
            login_timeout_secs: default_login_timeout(),
        }
    }
}

impl TimingConfig {
    pub fn stream_config(&self) -> StreamConfig {
        StreamConfig {
            startup_timeout: Duration::from_millis(self.startup_timeout_ms),
            settle_delay: Duration::from_millis(self.settle_delay_ms),
            attempt_timeout: Duration::from_millis(self.attempt_timeout_ms),
            attempts: self.provoke_attempts,
        }
    }

    pub fn scroll_intervals(&self) -> Vec<Duration> {
        self.scroll_intervals_ms
            .iter()
            .map(|ms| Duration::from_millis(*ms))
            .collect()
    }

    pub fn login_poll(&self) -> Duration {
        Duration::from_millis(self.login_poll_ms)
    }

    pub fn login_timeout(&self) -> Duration {
        Duration::from_secs(self.login_timeout_secs)
    }
}

/// Storage configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Root holding one folder per account, progress files and the session.
    #[serde(default = "default_storage_root")]
    pub root: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            root: default_storage_root(),
        }
    }
}

/// Download configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DownloadConfig {
    /// Maximum attachments fetched at once.
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            concurrency: default_concurrency(),
        }
    }
}

/// Target site configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
        }
    }
}

fn default_timeline_endpoint() -> String {
    DEFAULT_TIMELINE_ENDPOINT.to_string()
}

fn default_startup_timeout() -> u64 {
    10_000
}

fn default_settle_delay() -> u64 {
    2_000
}

fn default_attempt_timeout() -> u64 {
    5_000
}

fn default_provoke_attempts() -> u32 {
    3
}

fn default_scroll_intervals() -> Vec<u64> {
    vec![10, 50, 100]
}

fn default_login_poll() -> u64 {
    1_000
}

fn default_login_timeout() -> u64 {
    600
}

fn default_storage_root() -> PathBuf {
    PathBuf::from("./scraped")
}

fn default_concurrency() -> usize {
    10
}

fn default_base_url() -> String {
    "https://twitter.com".to_string()
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                Error::Config(format!(
                    "Configuration file not found: {}. Create one from config.example.toml",
                    path.display()
                ))
            } else {
                Error::Io(e)
            }
        })?;

        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    pub fn storage_root(&self) -> &Path {
        &self.storage.root
    }

    pub fn browser_settings(&self) -> BrowserSettings {
        BrowserSettings {
            headless: self.browser.headless,
            executable: self.browser.executable.clone(),
        }
    }

    /// Timeline URL harvested for an account folder.
    pub fn timeline_url(&self, folder: &str) -> String {
        format!("{}/{}/media", self.site.base_url.trim_end_matches('/'), folder)
    }
}
