// ── Reactive state subscription ──
//
// Subscription type for consuming state publications from the
// coordinator.

use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use futures_core::Stream;
use tokio::sync::watch;
use tokio_stream::wrappers::WatchStream;

use crate::store::SyncState;

/// A subscription to state publications.
///
/// Provides both point-in-time snapshot access and change notification
/// via [`changed`](Self::changed), or conversion to a `Stream`.
pub struct StateStream {
    current: Arc<SyncState>,
    receiver: watch::Receiver<Arc<SyncState>>,
}

impl StateStream {
    pub(crate) fn new(receiver: watch::Receiver<Arc<SyncState>>) -> Self {
        let current = receiver.borrow().clone();
        Self { current, receiver }
    }

    /// The snapshot captured at creation or last `changed()` return.
    pub fn current(&self) -> &Arc<SyncState> {
        &self.current
    }

    /// The latest snapshot (may have changed since creation).
    pub fn latest(&self) -> Arc<SyncState> {
        self.receiver.borrow().clone()
    }

    /// Wait for the next publication, returning the new snapshot.
    /// Returns `None` when the coordinator has been dropped.
    pub async fn changed(&mut self) -> Option<Arc<SyncState>> {
        self.receiver.changed().await.ok()?;
        let snapshot = self.receiver.borrow_and_update().clone();
        self.current = snapshot.clone();
        Some(snapshot)
    }

    /// Convert into a `Stream` for use with `StreamExt` combinators.
    pub fn into_stream(self) -> StateWatchStream {
        StateWatchStream {
            inner: WatchStream::new(self.receiver),
        }
    }
}

/// `Stream` adapter backed by a `watch::Receiver`. Yields a new
/// `Arc<SyncState>` snapshot on every publication.
pub struct StateWatchStream {
    inner: WatchStream<Arc<SyncState>>,
}

impl Stream for StateWatchStream {
    type Item = Arc<SyncState>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Pin::new(&mut self.inner).poll_next(cx)
    }
}
