//! Configuration module for the media-harvester.
//!
//! This module handles:
//! - Loading configuration from TOML files
//! - CLI argument merging
//! - Configuration validation

pub mod loader;
pub mod validation;

pub use loader::{
    BrowserConfig, Config, DownloadConfig, SiteConfig, StorageConfig, TimingConfig,
};
pub use validation::{filter_valid_folders, validate_config, validate_folders};
