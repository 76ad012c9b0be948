// ── Query subscriptions ──

use std::pin::Pin;
use std::task::{Context, Poll};

use futures_core::Stream;
use tokio::sync::watch;
use tokio_stream::wrappers::WatchStream;

use super::entry::{FetchResult, Query};
use super::state::QueryState;

/// Keeps a query's subscriber count up while alive.
struct SubscriberGuard<T: Send + Sync + 'static> {
    query: Query<T>,
}

impl<T: Send + Sync + 'static> Drop for SubscriberGuard<T> {
    fn drop(&mut self) {
        self.query.release();
    }
}

/// A live view of one query. Dropping it unsubscribes.
pub struct Subscription<T: Send + Sync + 'static> {
    receiver: watch::Receiver<QueryState<T>>,
    guard: SubscriberGuard<T>,
}

impl<T: Send + Sync + 'static> Subscription<T> {
    pub(super) fn new(query: Query<T>, receiver: watch::Receiver<QueryState<T>>) -> Self {
        Self {
            receiver,
            guard: SubscriberGuard { query },
        }
    }

    /// The latest state.
    pub fn state(&self) -> QueryState<T> {
        self.receiver.borrow().clone()
    }

    /// Wait for the next state change.
    /// Returns `None` once the query itself is gone.
    pub async fn changed(&mut self) -> Option<QueryState<T>> {
        self.receiver.changed().await.ok()?;
        Some(self.receiver.borrow_and_update().clone())
    }

    /// Wait until the state satisfies `predicate` (checked against the
    /// current state first).
    pub async fn wait_for(
        &mut self,
        predicate: impl FnMut(&QueryState<T>) -> bool,
    ) -> Option<QueryState<T>> {
        let state = self.receiver.wait_for(predicate).await.ok()?;
        Some((*state).clone())
    }

    /// Ask the query to revalidate, joining any in-flight fetch.
    pub async fn revalidate(&self) -> FetchResult<T> {
        self.guard.query.revalidate().await
    }

    pub fn query(&self) -> &Query<T> {
        &self.guard.query
    }

    /// Convert into a `Stream` of states, starting with the current one.
    /// The stream keeps the subscription alive.
    pub fn into_stream(self) -> QueryStream<T> {
        let Self { receiver, guard } = self;
        QueryStream {
            inner: WatchStream::new(receiver),
            _guard: guard,
        }
    }
}

/// `Stream` adapter over a [`Subscription`].
pub struct QueryStream<T: Send + Sync + 'static> {
    inner: WatchStream<QueryState<T>>,
    _guard: SubscriberGuard<T>,
}

impl<T: Send + Sync + 'static> Stream for QueryStream<T> {
    type Item = QueryState<T>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Pin::new(&mut self.inner).poll_next(cx)
    }
}
