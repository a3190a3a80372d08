//! Network observation feeding the interception channel.

use std::collections::HashMap;
use std::future::Future;

use base64::Engine;
use chromiumoxide::cdp::browser_protocol::network::{
    EnableParams, EventLoadingFailed, EventLoadingFinished, EventResponseReceived,
    GetResponseBodyParams, RequestId,
};
use chromiumoxide::Page;
use futures::{Stream, StreamExt};
use tokio::task::JoinHandle;

use crate::error::{Error, Result};
use crate::stream::InterceptionChannel;

/// Matching requests whose bodies are not complete yet, keyed by request id.
#[derive(Debug, Default)]
pub struct InFlight {
    requests: HashMap<String, String>,
}

impl InFlight {
    /// Remember a response's URL if it belongs to the timeline endpoint.
    pub fn received(&mut self, channel: &InterceptionChannel, request_id: String, url: String) {
        if channel.matches(&url) {
            self.requests.insert(request_id, url);
        }
    }

    /// URL of a tracked request whose body just finished loading.
    pub fn finished(&mut self, request_id: &str) -> Option<String> {
        self.requests.remove(request_id)
    }

    /// Forget a tracked request that failed, returning its URL.
    pub fn failed(&mut self, request_id: &str) -> Option<String> {
        self.requests.remove(request_id)
    }

    pub fn len(&self) -> usize {
        self.requests.len()
    }

    pub fn is_empty(&self) -> bool {
        self.requests.is_empty()
    }
}

/// Start observing finished responses on `page`.
///
/// Requests proceed untouched; only response bodies of URLs matching the
/// channel's endpoint are read. Responses are handed to the channel in the
/// order they finish loading.
pub async fn spawn_interception(
    page: &Page,
    channel: InterceptionChannel,
) -> Result<JoinHandle<()>> {
    page.execute(EnableParams::default()).await?;

    let received = page
        .event_listener::<EventResponseReceived>()
        .await?
        .map(|e| (e.request_id.inner().clone(), e.response.url.clone()));
    let finished = page
        .event_listener::<EventLoadingFinished>()
        .await?
        .map(|e| e.request_id.inner().clone());
    let failed = page
        .event_listener::<EventLoadingFailed>()
        .await?
        .map(|e| (e.request_id.inner().clone(), e.error_text.clone()));
    let page = page.clone();

    let task = tokio::spawn(async move {
        let fetch = move |request_id: String| {
            let page = page.clone();
            async move { response_body(&page, RequestId::new(request_id)).await }
        };
        pump(received, finished, failed, channel, fetch).await;
        tracing::debug!("Interception stopped");
    });

    Ok(task)
}

/// Drive the three event streams into the channel until they end or the
/// channel closes.
///
/// `ResponseReceived` always precedes `LoadingFinished` for one request, but
/// they travel on separate streams; received events are drained first so a
/// finished event never overtakes the URL it needs.
pub async fn pump<R, F, X, B, Fut>(
    received: R,
    finished: F,
    failed: X,
    channel: InterceptionChannel,
    fetch: B,
) where
    R: Stream<Item = (String, String)>,
    F: Stream<Item = String>,
    X: Stream<Item = (String, String)>,
    B: Fn(String) -> Fut,
    Fut: Future<Output = Result<String>>,
{
    futures::pin_mut!(received, finished, failed);
    let mut in_flight = InFlight::default();

    loop {
        tokio::select! {
            biased;

            Some((request_id, url)) = received.next() => {
                in_flight.received(&channel, request_id, url);
            }
            Some(request_id) = finished.next() => {
                if let Some(url) = in_flight.finished(&request_id) {
                    match fetch(request_id).await {
                        Ok(body) => {
                            channel.handle_response(&url, &body);
                        }
                        Err(e) => {
                            tracing::debug!("Failed to read response body for {}: {}", url, e);
                        }
                    }
                }
            }
            Some((request_id, error)) = failed.next() => {
                if let Some(url) = in_flight.failed(&request_id) {
                    tracing::debug!("Timeline request failed: {} ({})", url, error);
                }
            }
            else => break,
        }

        if !channel.is_open() {
            break;
        }
    }
}

async fn response_body(page: &Page, request_id: RequestId) -> Result<String> {
    let response = page.execute(GetResponseBodyParams::new(request_id)).await?;

    if response.result.base64_encoded {
        decode_body(&response.result.body)
    } else {
        Ok(response.result.body.clone())
    }
}

fn decode_body(encoded: &str) -> Result<String> {
    let bytes = base64::engine::general_purpose::STANDARD
        .decode(encoded)
        .map_err(|e| Error::Browser(format!("Invalid base64 response body: {}", e)))?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stream::{StreamSession, StreamState, DEFAULT_TIMELINE_ENDPOINT};
    use regex::Regex;
    use serde_json::json;
    use std::sync::Arc;

    const TIMELINE: &str = "https://x.com/i/api/graphql/abc/UserMedia";
    const OTHER: &str = "https://x.com/i/api/graphql/abc/HomeTimeline";

    fn channel() -> (Arc<StreamSession>, InterceptionChannel) {
        let session = StreamSession::new();
        let endpoint = Regex::new(DEFAULT_TIMELINE_ENDPOINT).unwrap();
        (session.clone(), InterceptionChannel::new(session, endpoint))
    }

    fn body(id: &str) -> String {
        json!({ "data": { "user": { "result": { "timeline_v2": { "timeline": {
            "instructions": [{ "type": "TimelineAddEntries", "entries": [
                { "content": { "itemContent": { "tweet_results": { "result": {
                    "__typename": "Tweet",
                    "legacy": { "id_str": id, "created_at": "Mon Jan 02 03:04:05 +0000 2023" }
                }}}}}
            ]}]
        }}}}}})
        .to_string()
    }

    fn received(events: &[(&str, &str)]) -> impl Stream<Item = (String, String)> {
        let events: Vec<_> = events
            .iter()
            .map(|(id, url)| (id.to_string(), url.to_string()))
            .collect();
        futures::stream::iter(events)
    }

    fn finished(ids: &[&str]) -> impl Stream<Item = String> {
        let ids: Vec<_> = ids.iter().map(|id| id.to_string()).collect();
        futures::stream::iter(ids)
    }

    fn no_failures() -> impl Stream<Item = (String, String)> {
        futures::stream::empty()
    }

    /// Serves `body(request_id)` for every request.
    async fn echo(request_id: String) -> Result<String> {
        Ok(body(&request_id))
    }

    #[test]
    fn test_in_flight_tracks_only_matching_urls() {
        let (_, channel) = channel();
        let mut in_flight = InFlight::default();

        in_flight.received(&channel, "1".into(), TIMELINE.into());
        in_flight.received(&channel, "2".into(), OTHER.into());

        assert_eq!(in_flight.len(), 1);
        assert_eq!(in_flight.finished("2"), None);
        assert_eq!(in_flight.finished("1").as_deref(), Some(TIMELINE));
        assert!(in_flight.is_empty());
    }

    #[test]
    fn test_in_flight_failed_request_is_forgotten() {
        let (_, channel) = channel();
        let mut in_flight = InFlight::default();
        in_flight.received(&channel, "1".into(), TIMELINE.into());

        assert_eq!(in_flight.failed("1").as_deref(), Some(TIMELINE));
        assert_eq!(in_flight.finished("1"), None);
    }

    #[tokio::test]
    async fn test_queued_events_are_never_dropped() {
        // Both event kinds for every request are already queued when the pump starts.
        for _ in 0..32 {
            let (session, channel) = channel();
            pump(
                received(&[("1", TIMELINE), ("2", TIMELINE), ("3", TIMELINE)]),
                finished(&["1", "2", "3"]),
                no_failures(),
                channel,
                echo,
            )
            .await;

            assert_eq!(session.pending_len(), 3);
        }
    }

    #[tokio::test]
    async fn test_records_follow_finish_order() {
        let (session, channel) = channel();
        pump(
            received(&[("a", TIMELINE), ("b", TIMELINE)]),
            finished(&["b", "a"]),
            no_failures(),
            channel,
            echo,
        )
        .await;

        assert_eq!(session.pop().unwrap().id, "b");
        assert_eq!(session.pop().unwrap().id, "a");
    }

    #[tokio::test]
    async fn test_non_matching_bodies_are_not_fetched() {
        let (session, channel) = channel();
        let fetched = Arc::new(parking_lot::Mutex::new(Vec::new()));
        let log = fetched.clone();

        pump(
            received(&[("1", OTHER), ("2", TIMELINE)]),
            finished(&["1", "2"]),
            no_failures(),
            channel,
            move |request_id: String| {
                log.lock().push(request_id.clone());
                echo(request_id)
            },
        )
        .await;

        assert_eq!(*fetched.lock(), vec!["2".to_string()]);
        assert_eq!(session.pending_len(), 1);
    }

    #[tokio::test]
    async fn test_failed_request_and_body_errors_are_skipped() {
        let (session, channel) = channel();
        pump(
            received(&[("1", TIMELINE), ("2", TIMELINE), ("3", TIMELINE)]),
            finished(&["2", "3"]),
            futures::stream::iter(vec![("1".to_string(), "net::ERR_FAILED".to_string())]),
            channel,
            |request_id: String| async move {
                if request_id == "2" {
                    Err(Error::Browser("No resource with given identifier".into()))
                } else {
                    Ok(body(&request_id))
                }
            },
        )
        .await;

        assert_eq!(session.pending_len(), 1);
        assert_eq!(session.pop().unwrap().id, "3");
    }

    #[tokio::test]
    async fn test_pump_stops_once_channel_closes() {
        let (session, channel) = channel();
        session.finish(StreamState::Closed);

        pump(
            received(&[("1", TIMELINE)]),
            finished(&["1"]),
            no_failures(),
            channel,
            echo,
        )
        .await;

        assert!(!session.has_pending());
    }

    #[test]
    fn test_decode_base64_body() {
        assert_eq!(decode_body("eyJhIjoxfQ==").unwrap(), r#"{"a":1}"#);
        assert!(decode_body("!!not base64!!").is_err());
    }
}
