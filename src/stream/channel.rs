//! Bridges intercepted timeline responses into parsed records.

use std::sync::Arc;

use regex::Regex;

use crate::media::{parse_entry, MediaRecord, TimelinePayload};
use crate::stream::session::StreamSession;

/// Default pattern for the timeline data endpoint.
pub const DEFAULT_TIMELINE_ENDPOINT: &str = r".+/i/api/graphql/[-\w]+/User";

/// Feeds records from matching responses into a [`StreamSession`].
///
/// The channel is purely observational: it never blocks or alters requests.
#[derive(Debug, Clone)]
pub struct InterceptionChannel {
    session: Arc<StreamSession>,
    endpoint: Regex,
}

impl InterceptionChannel {
    pub fn new(session: Arc<StreamSession>, endpoint: Regex) -> Self {
        Self { session, endpoint }
    }

    /// Whether a response URL belongs to the timeline data endpoint.
    pub fn matches(&self, url: &str) -> bool {
        self.endpoint.is_match(url)
    }

    pub fn is_open(&self) -> bool {
        self.session.is_open()
    }

    /// Handle one finished response.
    ///
    /// Returns the number of records appended. Non-matching URLs, unparseable
    /// bodies and unexpected shapes yield zero and never fail the channel.
    /// Any response carrying an instruction list counts as an arrival, even
    /// when none of its entries parse.
    pub fn handle_response(&self, url: &str, body: &str) -> usize {
        if !self.matches(url) {
            return 0;
        }

        let records = match extract_records(body) {
            Some(records) => records,
            None => {
                tracing::debug!("Ignoring timeline response without instructions: {}", url);
                return 0;
            }
        };

        if records.is_empty() {
            tracing::debug!("Timeline response carried no usable entries");
            self.session.mark_arrival();
            return 0;
        }

        let added = self.session.push(records);
        self.session.mark_arrival();
        tracing::debug!("Buffered {} records from {}", added, url);
        added
    }
}

/// Parse a response body into records, in encounter order.
///
/// Returns `None` when the body is not JSON or lacks the instruction list.
pub fn extract_records(body: &str) -> Option<Vec<MediaRecord>> {
    let payload: TimelinePayload = match serde_json::from_str(body) {
        Ok(payload) => payload,
        Err(e) => {
            tracing::debug!("Failed to parse timeline response: {}", e);
            return None;
        }
    };

    let instructions = payload.into_instructions()?;

    let records = instructions
        .iter()
        .filter(|i| i.is_add_entries())
        .flat_map(|i| i.entries.iter())
        .filter_map(|entry| parse_entry(entry).ok())
        .collect();

    Some(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const ENDPOINT_URL: &str =
        "https://x.com/i/api/graphql/aBc-12_x/UserMedia?variables=%7B%7D";

    fn entry(id: &str) -> serde_json::Value {
        json!({
            "entryId": format!("tweet-{}", id),
            "content": { "itemContent": { "tweet_results": { "result": {
                "__typename": "Tweet",
                "legacy": {
                    "id_str": id,
                    "created_at": "Mon Jan 02 03:04:05 +0000 2023",
                    "extended_entities": { "media": [
                        { "type": "photo", "media_url_https": format!("https://pbs.example.com/{}.jpg", id) }
                    ]}
                }
            }}}}
        })
    }

    fn body(instructions: serde_json::Value) -> String {
        json!({
            "data": { "user": { "result": {
                "timeline_v2": { "timeline": { "instructions": instructions } }
            }}}
        })
        .to_string()
    }

    fn channel() -> (Arc<StreamSession>, InterceptionChannel) {
        let session = StreamSession::new();
        let endpoint = Regex::new(DEFAULT_TIMELINE_ENDPOINT).unwrap();
        (session.clone(), InterceptionChannel::new(session, endpoint))
    }

    #[test]
    fn test_endpoint_matching() {
        let (_, channel) = channel();
        assert!(channel.matches(ENDPOINT_URL));
        assert!(channel.matches("https://twitter.com/i/api/graphql/Q1w2/UserTweets"));
        assert!(!channel.matches("https://x.com/i/api/graphql/Q1w2/TweetDetail"));
        assert!(!channel.matches("https://pbs.example.com/media/a.jpg"));
    }

    #[test]
    fn test_only_add_entries_are_used() {
        let (session, channel) = channel();
        let body = body(json!([
            { "type": "TimelineClearCache" },
            { "type": "TimelinePinEntry", "entry": entry("0") },
            { "type": "TimelineAddEntries", "entries": [
                entry("1"),
                { "entryId": "cursor-top", "content": { "value": "c" } },
                entry("2")
            ]},
            { "type": "TimelineReplaceEntry", "entries": [entry("3")] },
            { "type": "TimelineTerminateTimeline", "direction": "Top" }
        ]));

        assert_eq!(channel.handle_response(ENDPOINT_URL, &body), 2);
        assert_eq!(session.pop().unwrap().id, "1");
        assert_eq!(session.pop().unwrap().id, "2");
        assert!(session.pop().is_none());
    }

    #[test]
    fn test_newer_timeline_key_is_accepted() {
        let (session, channel) = channel();
        let body = json!({
            "data": { "user": { "result": {
                "timeline": { "timeline": { "instructions": [
                    { "type": "TimelineAddEntries", "entries": [entry("8")] }
                ]}}
            }}}
        })
        .to_string();

        assert_eq!(channel.handle_response(ENDPOINT_URL, &body), 1);
        assert_eq!(session.pop().unwrap().id, "8");
    }

    #[test]
    fn test_non_matching_url_is_ignored() {
        let (session, channel) = channel();
        let body = body(json!([{ "type": "TimelineAddEntries", "entries": [entry("1")] }]));

        assert_eq!(
            channel.handle_response("https://x.com/i/api/graphql/abc/HomeTimeline", &body),
            0
        );
        assert!(!session.has_pending());
    }

    #[test]
    fn test_malformed_bodies_are_skipped() {
        let (session, channel) = channel();
        assert_eq!(channel.handle_response(ENDPOINT_URL, "<html>rate limited</html>"), 0);
        assert_eq!(
            channel.handle_response(ENDPOINT_URL, r#"{"errors":[{"message":"nope"}]}"#),
            0
        );
        assert_eq!(
            channel.handle_response(ENDPOINT_URL, r#"{"data":{"user":{"result":{}}}}"#),
            0
        );
        assert!(!session.has_pending());

        // The channel keeps working afterwards.
        let good = body(json!([{ "type": "TimelineAddEntries", "entries": [entry("1")] }]));
        assert_eq!(channel.handle_response(ENDPOINT_URL, &good), 1);
    }

    #[test]
    fn test_empty_instruction_list_counts_as_arrival() {
        let (session, channel) = channel();
        let cursors = body(json!([{ "type": "TimelineAddEntries", "entries": [
            { "entryId": "cursor-top-1", "content": { "value": "a" } },
            { "entryId": "cursor-bottom-1", "content": { "value": "b" } }
        ]}]));

        assert_eq!(channel.handle_response(ENDPOINT_URL, &cursors), 0);
        assert_eq!(session.arrivals(), 1);
        assert!(!session.has_pending());

        channel.handle_response(ENDPOINT_URL, "<html></html>");
        assert_eq!(session.arrivals(), 1);
    }

    #[test]
    fn test_responses_append_in_completion_order() {
        let (session, channel) = channel();
        let first = body(json!([{ "type": "TimelineAddEntries", "entries": [entry("r1")] }]));
        let second = body(json!([{ "type": "TimelineAddEntries", "entries": [entry("r2")] }]));

        channel.handle_response(ENDPOINT_URL, &first);
        channel.handle_response(ENDPOINT_URL, &second);

        assert_eq!(session.pop().unwrap().id, "r1");
        assert_eq!(session.pop().unwrap().id, "r2");
    }
}
