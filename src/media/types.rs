//! Raw timeline payload type definitions.
//!
//! Every field is optional: the upstream shape is undocumented and changes
//! without notice, so presence is checked by the parser rather than by serde.

use serde::Deserialize;

/// Top-level body of a timeline data response.
#[derive(Debug, Default, Deserialize)]
pub struct TimelinePayload {
    pub data: Option<PayloadData>,
}

#[derive(Debug, Default, Deserialize)]
pub struct PayloadData {
    pub user: Option<UserNode>,
}

#[derive(Debug, Default, Deserialize)]
pub struct UserNode {
    pub result: Option<UserResult>,
}

#[derive(Debug, Default, Deserialize)]
pub struct UserResult {
    /// Older responses nest the timeline under `timeline_v2`, newer ones under `timeline`.
    #[serde(alias = "timeline")]
    pub timeline_v2: Option<TimelineWrapper>,
}

#[derive(Debug, Default, Deserialize)]
pub struct TimelineWrapper {
    pub timeline: Option<Timeline>,
}

#[derive(Debug, Default, Deserialize)]
pub struct Timeline {
    pub instructions: Option<Vec<Instruction>>,
}

/// One timeline mutation directive.
#[derive(Debug, Deserialize)]
pub struct Instruction {
    #[serde(rename = "type")]
    pub kind: Option<String>,

    /// Entries are kept as raw JSON so one malformed entry cannot poison its siblings.
    #[serde(default)]
    pub entries: Vec<serde_json::Value>,
}

/// Instruction type that carries new content entries.
pub const ADD_ENTRIES: &str = "TimelineAddEntries";

impl Instruction {
    pub fn is_add_entries(&self) -> bool {
        self.kind.as_deref() == Some(ADD_ENTRIES)
    }
}

impl TimelinePayload {
    /// The instruction list, if the response has the expected shape.
    pub fn into_instructions(self) -> Option<Vec<Instruction>> {
        self.data?.user?.result?.timeline_v2?.timeline?.instructions
    }
}

/// A single timeline entry.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawEntry {
    pub entry_id: Option<String>,
    pub content: Option<EntryContent>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntryContent {
    pub item_content: Option<ItemContent>,
}

#[derive(Debug, Deserialize)]
pub struct ItemContent {
    pub tweet_results: Option<TweetResults>,
}

#[derive(Debug, Deserialize)]
pub struct TweetResults {
    pub result: Option<TweetResult>,
}

/// Variant name of a plain item.
pub const PLAIN_VARIANT: &str = "Tweet";

/// Variant name of an item wrapped with visibility limits.
pub const LIMITED_VARIANT: &str = "TweetWithVisibilityResults";

#[derive(Debug, Deserialize)]
pub struct TweetResult {
    #[serde(rename = "__typename")]
    pub typename: Option<String>,

    pub legacy: Option<Legacy>,

    /// Inner item when `typename` is the visibility-limited variant.
    pub tweet: Option<Box<TweetResult>>,
}

#[derive(Debug, Deserialize)]
pub struct Legacy {
    pub id_str: Option<String>,
    pub conversation_id_str: Option<String>,
    pub created_at: Option<String>,
    pub extended_entities: Option<Entities>,
    pub entities: Option<Entities>,
}

#[derive(Debug, Deserialize)]
pub struct Entities {
    pub media: Option<Vec<RawMedia>>,
}

#[derive(Debug, Deserialize)]
pub struct RawMedia {
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub media_url_https: Option<String>,
}
