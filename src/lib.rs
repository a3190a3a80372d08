//! Media Harvester - timeline photo harvesting through a real browser.
//!
//! The harvester opens an account's media timeline in Chromium, listens to
//! the timeline data responses the page itself requests, and turns them into
//! a pull-based stream of [`MediaRecord`]s. Pulling from an empty stream
//! scrolls the page to provoke more data until the timeline is exhausted.
//!
//! # Features
//!
//! - Response interception instead of scraping rendered markup
//! - Host-side scroll policy with stagnation detection
//! - Interactive login with a persisted cookie session
//! - Per-folder progress so each run stops at the previous harvest
//! - Concurrent attachment downloads
//!
//! # Example
//!
//! ```no_run
//! use std::collections::HashSet;
//! use std::path::Path;
//! use media_harvester::{get_or_create_session, Config, Harvester, SessionStore};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::load(Path::new("config.toml"))?;
//!     let store = SessionStore::in_root(config.storage_root());
//!     let credential = get_or_create_session(&config, &store).await?;
//!
//!     let harvester = Harvester::from_config(&config)?;
//!     if let Some(stream) = harvester.open(&config.timeline_url("someone"), &credential).await? {
//!         while let Some(record) = stream.next().await {
//!             println!("{} {:?}", record.id, record.attachment_urls);
//!         }
//!         stream.close().await;
//!     }
//!     Ok(())
//! }
//! ```

pub mod browser;
pub mod cli;
pub mod config;
pub mod download;
pub mod error;
pub mod fs;
pub mod media;
pub mod output;
pub mod session;
pub mod stream;

// Re-exports for convenience
pub use browser::Harvester;
pub use config::Config;
pub use download::{download_records, harvest_timeline, DownloadStats, FolderState, GlobalState};
pub use error::{Error, Result};
pub use media::{parse_entry, MediaRecord, Rejection};
pub use session::{get_or_create_session, SessionCredential, SessionStore};
pub use stream::{MediaStream, StreamState};
