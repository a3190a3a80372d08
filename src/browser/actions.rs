//! Page primitives the harvesting engine relies on.
//!
//! Scrolling policy lives on the host side; only these small DOM queries and
//! actions run inside the page, which keeps the policy testable without a browser.

use async_trait::async_trait;

use crate::error::Result;

/// Content key of a rendered timeline cell.
///
/// Built from the cell's content (its status link when present) rather than
/// node identity, since the listing recycles DOM nodes while virtualizing.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CellMarker(pub String);

impl CellMarker {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// DOM primitives executed in the page context.
#[async_trait]
pub trait PageActions: Send + Sync {
    /// Close an interstitial sheet dialog if one is showing. Returns whether one was found.
    async fn dismiss_dialog(&self) -> Result<bool>;

    /// Marker of the last rendered content cell, or `None` if the listing is not rendered.
    async fn last_cell(&self) -> Result<Option<CellMarker>>;

    /// Scroll the cell identified by `marker` into view.
    async fn scroll_into_view(&self, marker: &CellMarker) -> Result<()>;
}

/// The browser resource owned by a stream, released exactly once on close.
#[async_trait]
pub trait ResourceRelease: Send + Sync {
    async fn release(&self) -> Result<()>;
}
