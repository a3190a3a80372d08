//! Download module for harvesting and fetching content.
//!
//! This module provides:
//! - Harvest and download state tracking
//! - Timeline harvesting up to the previous run
//! - Concurrent attachment downloading

pub mod media;
pub mod state;
pub mod timeline;

pub use media::download_records;
pub use state::{DownloadStats, FolderState, GlobalState};
pub use timeline::{collect_new_records, drain_stream, harvest_timeline};
