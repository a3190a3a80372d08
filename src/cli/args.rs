//! Command-line argument definitions using clap.

use clap::Parser;
use std::path::PathBuf;

use crate::config::Config;

/// Timeline media harvester CLI.
#[derive(Parser, Debug)]
#[command(
    name = "media-harvester",
    version,
    about = "Harvest photo attachments from account media timelines",
    long_about = "Drives a real browser through each account's media timeline, collects \
                  every photo attachment the page loads, and downloads the new ones.\n\n\
                  Each folder under the storage root is one account handle."
)]
pub struct Args {
    /// Path to configuration file.
    #[arg(short, long, default_value = "config.toml", env = "HARVESTER_CONFIG")]
    pub config: PathBuf,

    /// Storage root holding one folder per account.
    #[arg(short, long, env = "HARVESTER_ROOT")]
    pub root: Option<PathBuf>,

    /// Account folder(s) to harvest. Defaults to every folder under the root.
    #[arg(short, long = "folder")]
    pub folders: Vec<String>,

    /// Run the harvesting browser without a window.
    #[arg(long)]
    pub headless: bool,

    /// Maximum parallel downloads.
    #[arg(long)]
    pub concurrency: Option<usize>,

    /// Harvest and list new items without downloading or saving progress.
    #[arg(long)]
    pub dry_run: bool,

    /// Enable debug logging.
    #[arg(long)]
    pub debug: bool,
}

impl Args {
    /// Merge CLI arguments into an existing config, overriding where specified.
    pub fn merge_into_config(&self, config: &mut Config) {
        if let Some(root) = &self.root {
            config.storage.root = root.clone();
        }

        if let Some(concurrency) = self.concurrency {
            config.download.concurrency = concurrency;
        }

        // Only override if set to non-default
        if self.headless {
            config.browser.headless = true;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let args = Args::parse_from(["media-harvester"]);
        assert_eq!(args.config, PathBuf::from("config.toml"));
        assert!(args.folders.is_empty());
        assert!(!args.dry_run);
    }

    #[test]
    fn test_repeated_folders() {
        let args = Args::parse_from(["media-harvester", "-f", "first", "--folder", "second"]);
        assert_eq!(args.folders, vec!["first", "second"]);
    }

    #[test]
    fn test_merge_overrides() {
        let args = Args::parse_from([
            "media-harvester",
            "--root",
            "/data",
            "--concurrency",
            "3",
            "--headless",
        ]);
        let mut config = Config::default();
        args.merge_into_config(&mut config);

        assert_eq!(config.storage.root, PathBuf::from("/data"));
        assert_eq!(config.download.concurrency, 3);
        assert!(config.browser.headless);
    }

    #[test]
    fn test_merge_keeps_config_when_unset() {
        let args = Args::parse_from(["media-harvester"]);
        let mut config = Config::default();
        config.browser.headless = true;
        config.download.concurrency = 7;
        args.merge_into_config(&mut config);

        assert!(config.browser.headless);
        assert_eq!(config.download.concurrency, 7);
    }
}
