// ── Collection feeds ──
//
// Change notification for one echo-store collection.

use std::sync::Arc;

use futures_core::Stream;
use tokio::sync::watch;
use tokio_stream::wrappers::WatchStream;

use crate::model::{EntityId, Identified};

type Items<T> = Arc<Vec<Arc<T>>>;

/// Follows one collection of the [`EchoStore`](super::EchoStore).
///
/// Every server listing and every echoed create publishes a new
/// snapshot; readers never see a half-written list.
pub struct CollectionFeed<T> {
    rx: watch::Receiver<Items<T>>,
}

impl<T: Identified + Send + Sync + 'static> CollectionFeed<T> {
    pub(crate) fn new(rx: watch::Receiver<Items<T>>) -> Self {
        Self { rx }
    }

    /// The newest published items.
    pub fn items(&self) -> Items<T> {
        self.rx.borrow().clone()
    }

    /// Look up one item in the newest snapshot.
    pub fn find(&self, id: &EntityId) -> Option<Arc<T>> {
        self.rx.borrow().iter().find(|item| item.id() == id).cloned()
    }

    /// Wait for the next write and return what it published.
    /// `None` once the store is gone.
    pub async fn next(&mut self) -> Option<Items<T>> {
        self.rx.changed().await.ok()?;
        Some(self.rx.borrow_and_update().clone())
    }

    /// The current items, then one snapshot per write.
    pub fn into_stream(self) -> impl Stream<Item = Items<T>> {
        WatchStream::new(self.rx)
    }
}
