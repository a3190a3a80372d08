//! Media record representation.

use chrono::{DateTime, Utc};
use serde::Serialize;
use url::Url;

/// A timeline item together with the photo attachments it carries.
///
/// Records are only built from fully resolved entries: the identifier and the
/// creation time are always present and every attachment is a parsed URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MediaRecord {
    /// Stable identifier of the timeline item.
    pub id: String,

    /// When the item was originally posted.
    pub created_at: DateTime<Utc>,

    /// Photo locators, in the order the item lists them.
    pub attachment_urls: Vec<Url>,
}

impl MediaRecord {
    /// Whether the record carries anything worth downloading.
    pub fn has_attachments(&self) -> bool {
        !self.attachment_urls.is_empty()
    }

    /// Creation time as milliseconds since the Unix epoch, used as a filename prefix.
    pub fn created_millis(&self) -> i64 {
        self.created_at.timestamp_millis()
    }
}
