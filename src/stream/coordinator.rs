//! Pull-based media stream over an intercepted, scrolled timeline page.

use std::sync::Arc;
use std::time::Duration;

use futures::Stream;
use tokio::sync::Mutex as AsyncMutex;
use tokio::time::{sleep, timeout};

use crate::browser::{PageActions, ResourceRelease};
use crate::media::MediaRecord;
use crate::stream::scroll::ScrollDriver;
use crate::stream::session::{Awaiter, StreamSession, StreamState};

/// Timing policy for establishing and provoking a stream.
#[derive(Debug, Clone)]
pub struct StreamConfig {
    /// How long to wait for the first data arrival after navigation.
    pub startup_timeout: Duration,
    /// Pause after a successful establishment so the page can finish rendering.
    pub settle_delay: Duration,
    /// How long each provoking attempt waits for new data.
    pub attempt_timeout: Duration,
    /// Provoking attempts before the stream is considered exhausted.
    pub attempts: u32,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            startup_timeout: Duration::from_secs(10),
            settle_delay: Duration::from_secs(2),
            attempt_timeout: Duration::from_secs(5),
            attempts: 3,
        }
    }
}

/// Handle to a live media stream.
///
/// Cloning is cheap and every clone refers to the same stream, so one task
/// may pull while another calls [`MediaStream::close`]. A finished stream
/// cannot be restarted; harvest again for a new one.
#[derive(Clone)]
pub struct MediaStream {
    inner: Arc<Inner>,
}

struct Inner {
    session: Arc<StreamSession>,
    page: Arc<dyn PageActions>,
    resource: Box<dyn ResourceRelease>,
    scroll: ScrollDriver,
    config: StreamConfig,
    pull: AsyncMutex<()>,
}

impl MediaStream {
    /// Assemble a stream from an already wired session and page.
    ///
    /// The interception channel must already be feeding `session`.
    pub fn new(
        session: Arc<StreamSession>,
        page: Arc<dyn PageActions>,
        resource: Box<dyn ResourceRelease>,
        scroll: ScrollDriver,
        config: StreamConfig,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                session,
                page,
                resource,
                scroll,
                config,
                pull: AsyncMutex::new(()),
            }),
        }
    }

    /// Wait for the first timeline response before handing out the stream.
    ///
    /// `startup` must come from [`StreamSession::arm_arrival`] before navigation
    /// began. A response without usable entries still establishes the stream,
    /// which then simply ends empty. Returns `None` after releasing the browser
    /// if no timeline response arrives within the startup timeout.
    pub async fn establish(self, startup: Awaiter) -> Option<Self> {
        let started = matches!(
            timeout(self.inner.config.startup_timeout, startup.fired()).await,
            Ok(true)
        ) || self.inner.session.arrivals() > 0;

        if !started {
            tracing::error!("Failed to start media feed");
            self.shutdown(StreamState::Closed).await;
            return None;
        }

        sleep(self.inner.config.settle_delay).await;
        Some(self)
    }

    /// Pull the next record, provoking the page for more data when the buffer is empty.
    ///
    /// Returns `None` once the stream is exhausted or closed.
    pub async fn next(&self) -> Option<MediaRecord> {
        let _pull = self.inner.pull.lock().await;
        let session = &self.inner.session;

        if !session.is_open() {
            return None;
        }

        if let Some(record) = session.pop() {
            return Some(record);
        }

        let attempts = self.inner.config.attempts.max(1);
        let mut awaiter = session.arm();

        for attempt in 1..=attempts {
            if !session.is_open() {
                return None;
            }

            let arrivals_before = session.arrivals();

            match self.inner.scroll.scroll_to_bottom(&*self.inner.page).await {
                Ok(report) => tracing::trace!("Scroll finished: {:?}", report),
                Err(e) => tracing::warn!("Scrolling failed: {}", e),
            }

            let _ = timeout(self.inner.config.attempt_timeout, awaiter.fired()).await;

            if session.has_pending() {
                break;
            }

            // Replace the episode so a stale signal cannot be taken for fresh data.
            awaiter = session.arm();

            if !session.is_open() {
                return None;
            }

            tracing::info!(
                "Waiting longer than usual for media to load... {}/{}{}",
                attempt,
                attempts,
                if session.arrivals() > arrivals_before {
                    " (empty response)"
                } else {
                    ""
                }
            );
        }

        match session.pop() {
            Some(record) => Some(record),
            None => {
                tracing::info!("No more media found, ending stream");
                self.shutdown(StreamState::Exhausted).await;
                None
            }
        }
    }

    /// Close the stream and release the browser.
    ///
    /// Idempotent and safe to call while another task is pulling; the
    /// browser is released at most once no matter how often this is called.
    pub async fn close(&self) {
        self.shutdown(StreamState::Closed).await;
    }

    pub fn state(&self) -> StreamState {
        self.inner.session.state()
    }

    /// Records buffered but not yet pulled.
    pub fn buffered(&self) -> usize {
        self.inner.session.pending_len()
    }

    /// Adapt the handle into a [`futures::Stream`].
    pub fn into_stream(self) -> impl Stream<Item = MediaRecord> {
        futures::stream::unfold(self, |stream| async move {
            let record = stream.next().await?;
            Some((record, stream))
        })
    }

    async fn shutdown(&self, state: StreamState) {
        if !self.inner.session.finish(state) {
            return;
        }

        if let Err(e) = self.inner.resource.release().await {
            tracing::warn!("Failed to release browser: {}", e);
        }
    }
}
