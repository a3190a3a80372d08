//! Timeline entry parsing.

use chrono::{DateTime, Utc};
use thiserror::Error;
use url::Url;

use crate::media::record::MediaRecord;
use crate::media::types::{Legacy, RawEntry, RawMedia, TweetResult, LIMITED_VARIANT, PLAIN_VARIANT};

/// Timestamp layout used by the legacy substructure, e.g. `Wed Oct 10 20:19:24 +0000 2018`.
const CREATED_AT_FORMAT: &str = "%a %b %d %H:%M:%S %z %Y";

/// Media type retained from an entry.
const PHOTO: &str = "photo";

/// Why a timeline entry did not produce a record.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Rejection {
    /// No nested item payload, e.g. a cursor or module entry.
    #[error("entry has no item result")]
    MissingResult,

    #[error("unsupported result variant '{0}'")]
    UnsupportedVariant(String),

    #[error("item id is missing")]
    MissingId,

    #[error("created time is missing")]
    MissingCreatedAt,

    #[error("created time '{0}' could not be parsed")]
    InvalidCreatedAt(String),

    #[error("media url is missing")]
    MissingMediaUrl,

    #[error("media url '{0}' is not a valid URL")]
    InvalidMediaUrl(String),

    #[error("entry does not match the expected shape: {0}")]
    Malformed(String),
}

impl Rejection {
    /// Whether this rejection hints at upstream drift rather than an ordinary non-item entry.
    pub fn is_anomaly(&self) -> bool {
        !matches!(self, Rejection::MissingResult | Rejection::UnsupportedVariant(_))
    }
}

/// Parse a raw timeline entry into a record.
///
/// Anomalies are logged; structural non-items (cursors, promoted modules)
/// are rejected quietly.
pub fn parse_entry(raw: &serde_json::Value) -> Result<MediaRecord, Rejection> {
    let result = try_parse_entry(raw);

    if let Err(rejection) = &result {
        if rejection.is_anomaly() {
            tracing::warn!("Skipping entry: {}, possibly the API changed", rejection);
        } else {
            tracing::trace!("Skipping entry: {}", rejection);
        }
    }

    result
}

fn try_parse_entry(raw: &serde_json::Value) -> Result<MediaRecord, Rejection> {
    let entry: RawEntry = serde_json::from_value(raw.clone())
        .map_err(|e| Rejection::Malformed(e.to_string()))?;

    let result = entry
        .content
        .and_then(|c| c.item_content)
        .and_then(|i| i.tweet_results)
        .and_then(|t| t.result)
        .ok_or(Rejection::MissingResult)?;

    let legacy = unwrap_variant(result)?;

    let id = non_empty(legacy.id_str)
        .or_else(|| non_empty(legacy.conversation_id_str))
        .ok_or(Rejection::MissingId)?;

    let created_raw = legacy.created_at.ok_or(Rejection::MissingCreatedAt)?;
    let created_at = parse_created_at(&created_raw)?;

    let media = legacy
        .extended_entities
        .and_then(|e| e.media)
        .or_else(|| legacy.entities.and_then(|e| e.media))
        .unwrap_or_default();

    let attachment_urls = photo_urls(&media)?;

    Ok(MediaRecord {
        id,
        created_at,
        attachment_urls,
    })
}

/// Reduce a result to its legacy substructure, unwrapping the visibility-limited variant.
fn unwrap_variant(result: TweetResult) -> Result<Legacy, Rejection> {
    let item = match result.typename.as_deref() {
        Some(PLAIN_VARIANT) => result,
        Some(LIMITED_VARIANT) => *result.tweet.ok_or(Rejection::MissingResult)?,
        other => {
            return Err(Rejection::UnsupportedVariant(
                other.unwrap_or("<none>").to_string(),
            ))
        }
    };

    // The legacy block holds both id and timestamp; without it neither can be read.
    item.legacy.ok_or(Rejection::MissingId)
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

fn parse_created_at(raw: &str) -> Result<DateTime<Utc>, Rejection> {
    DateTime::parse_from_str(raw, CREATED_AT_FORMAT)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|_| Rejection::InvalidCreatedAt(raw.to_string()))
}

/// Collect photo locators in order. Any photo without a usable locator fails the whole entry.
fn photo_urls(media: &[RawMedia]) -> Result<Vec<Url>, Rejection> {
    media
        .iter()
        .filter(|m| m.kind.as_deref() == Some(PHOTO))
        .map(|m| {
            let raw = m
                .media_url_https
                .as_deref()
                .filter(|u| !u.is_empty())
                .ok_or(Rejection::MissingMediaUrl)?;
            Url::parse(raw).map_err(|_| Rejection::InvalidMediaUrl(raw.to_string()))
        })
        .collect()
}
