//! Browser automation module.
//!
//! Provides:
//! - The narrow page primitive interface used by the stream engine
//! - A Chromium backend over the DevTools protocol
//! - Response interception feeding the stream
//! - The harvester that opens authenticated timeline streams

pub mod actions;
pub mod chrome;
pub mod harvester;
pub mod intercept;

pub use actions::{CellMarker, PageActions, ResourceRelease};
pub use chrome::{BrowserSettings, ChromeBrowser, ChromePage};
pub use harvester::Harvester;
