//! Shared state between the interception producer and the stream consumer.

use std::collections::VecDeque;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::oneshot;

use crate::media::MediaRecord;

/// Observable lifecycle of a stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamState {
    /// Records may still arrive.
    Open,
    /// Provoking gave up without new data.
    Exhausted,
    /// Closed by the caller, or establishment failed.
    Closed,
}

/// Pending records plus the single wake slot for a waiting consumer.
///
/// Buffer mutation and the wake signal share one lock, so a push can never
/// slip between a consumer's emptiness check and its arming of the awaiter.
///
/// Arrivals are tracked apart from records: a timeline response with an
/// instruction list but no usable entries still proves the feed is live.
#[derive(Debug)]
pub struct StreamSession {
    inner: Mutex<Inner>,
}

#[derive(Debug)]
struct Inner {
    pending: VecDeque<MediaRecord>,
    awaiter: Option<oneshot::Sender<()>>,
    arrival: Option<oneshot::Sender<()>>,
    arrivals: u64,
    state: StreamState,
}

/// Receiving half of one waiting episode.
#[derive(Debug)]
pub struct Awaiter(oneshot::Receiver<()>);

impl Awaiter {
    /// Resolves `true` when its event happened, `false` if the episode was
    /// superseded by a fresh awaiter or the session closed.
    pub async fn fired(self) -> bool {
        self.0.await.is_ok()
    }
}

impl StreamSession {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            inner: Mutex::new(Inner {
                pending: VecDeque::new(),
                awaiter: None,
                arrival: None,
                arrivals: 0,
                state: StreamState::Open,
            }),
        })
    }

    /// Install a fresh awaiter, dropping any previous one so it can never fire late.
    pub fn arm(&self) -> Awaiter {
        let (tx, rx) = oneshot::channel();
        self.inner.lock().awaiter = Some(tx);
        Awaiter(rx)
    }

    /// Install a fresh awaiter for the next timeline response, records or not.
    pub fn arm_arrival(&self) -> Awaiter {
        let (tx, rx) = oneshot::channel();
        self.inner.lock().arrival = Some(tx);
        Awaiter(rx)
    }

    /// Note that a timeline response was seen and wake the arrival awaiter.
    pub fn mark_arrival(&self) {
        let mut inner = self.inner.lock();
        if inner.state != StreamState::Open {
            return;
        }

        inner.arrivals += 1;
        if let Some(tx) = inner.arrival.take() {
            let _ = tx.send(());
        }
    }

    /// Timeline responses seen so far, including empty ones.
    pub fn arrivals(&self) -> u64 {
        self.inner.lock().arrivals
    }

    /// Append records in order and wake the current awaiter.
    ///
    /// Returns how many records were accepted; nothing is accepted once the
    /// session has left the open state.
    pub fn push<I>(&self, records: I) -> usize
    where
        I: IntoIterator<Item = MediaRecord>,
    {
        let mut inner = self.inner.lock();
        if inner.state != StreamState::Open {
            return 0;
        }

        let before = inner.pending.len();
        inner.pending.extend(records);
        let added = inner.pending.len() - before;

        if added > 0 {
            if let Some(tx) = inner.awaiter.take() {
                // The receiver may already be gone after a timeout; that is fine.
                let _ = tx.send(());
            }
        }

        added
    }

    /// Take the oldest pending record.
    pub fn pop(&self) -> Option<MediaRecord> {
        self.inner.lock().pending.pop_front()
    }

    pub fn has_pending(&self) -> bool {
        !self.inner.lock().pending.is_empty()
    }

    pub fn pending_len(&self) -> usize {
        self.inner.lock().pending.len()
    }

    pub fn state(&self) -> StreamState {
        self.inner.lock().state
    }

    pub fn is_open(&self) -> bool {
        self.state() == StreamState::Open
    }

    /// Move out of the open state.
    ///
    /// Returns `true` only for the call that performed the transition, which
    /// makes that caller responsible for releasing the browser.
    pub fn finish(&self, state: StreamState) -> bool {
        let mut inner = self.inner.lock();
        if inner.state != StreamState::Open {
            return false;
        }
        inner.state = state;
        inner.awaiter = None;
        inner.arrival = None;
        true
    }
}
