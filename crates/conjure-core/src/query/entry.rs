// ── Query ──
//
// One cached, shared fetch per key. Subscribers observe its state through a
// `watch` channel; concurrent fetches join one in-flight future; a sequence
// number keeps late responses from overwriting newer ones.

use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use futures_util::FutureExt;
use futures_util::future::{BoxFuture, Shared};
use tokio::sync::watch;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace, warn};

use super::key::QueryKey;
use super::policy::{RevalidateEvent, RevalidationPolicy};
use super::state::QueryState;
use super::subscription::Subscription;
use crate::error::CoreError;

/// Outcome of one fetch, shared between everyone who awaited it.
pub type FetchResult<T> = Result<Arc<T>, CoreError>;

type Fetcher<T> = Arc<dyn Fn() -> BoxFuture<'static, Result<T, CoreError>> + Send + Sync>;
type SuccessHook<T> = Arc<dyn Fn(&T) + Send + Sync>;
type SharedFetch<T> = Shared<BoxFuture<'static, FetchResult<T>>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FetchMode {
    /// Always start a new request.
    Force,
    /// Join the in-flight request if there is one.
    Dedupe,
    /// Like `Dedupe`, but skip entirely if a success is recent enough.
    IfStale,
}

struct InFlight<T> {
    seq: u64,
    future: SharedFetch<T>,
}

/// Fetch bookkeeping. Guarded by one lock so "is there a fetch?",
/// "is the data fresh?" and "which response is newest?" are answered
/// atomically.
struct Slot<T> {
    in_flight: Option<InFlight<T>>,
    last_success: Option<Instant>,
    /// Highest sequence number handed out.
    issued: u64,
    /// Sequence number of the response currently reflected in state.
    applied: u64,
}

#[derive(Default)]
struct Subscribers {
    count: usize,
    poll_cancel: Option<CancellationToken>,
}

/// A shared, revalidating fetch for one [`QueryKey`].
///
/// Cheaply cloneable; clones share state.
pub struct Query<T: Send + Sync + 'static> {
    inner: Arc<QueryInner<T>>,
}

struct QueryInner<T: Send + Sync + 'static> {
    key: QueryKey,
    policy: RevalidationPolicy,
    fetcher: Fetcher<T>,
    on_success: Option<SuccessHook<T>>,
    state: watch::Sender<QueryState<T>>,
    slot: Mutex<Slot<T>>,
    subscribers: Mutex<Subscribers>,
    cancel: CancellationToken,
}

impl<T: Send + Sync + 'static> Clone for Query<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

fn lock<G>(m: &Mutex<G>) -> MutexGuard<'_, G> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

impl<T: Send + Sync + 'static> Query<T> {
    pub fn builder<F, Fut>(key: QueryKey, fetcher: F) -> QueryBuilder<T>
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, CoreError>> + Send + 'static,
    {
        QueryBuilder {
            key,
            policy: RevalidationPolicy::default(),
            fetcher: Arc::new(move || fetcher().boxed()),
            on_success: None,
            cancel: None,
        }
    }

    pub fn key(&self) -> &QueryKey {
        &self.inner.key
    }

    pub fn policy(&self) -> &RevalidationPolicy {
        &self.inner.policy
    }

    /// The current state, without subscribing.
    pub fn state(&self) -> QueryState<T> {
        self.inner.state.borrow().clone()
    }

    pub fn subscriber_count(&self) -> usize {
        lock(&self.inner.subscribers).count
    }

    /// Whether the background poll task is running.
    pub fn is_polling(&self) -> bool {
        lock(&self.inner.subscribers)
            .poll_cancel
            .as_ref()
            .is_some_and(|t| !t.is_cancelled())
    }

    /// Start observing this query.
    ///
    /// Fetches unless a success landed within the dedupe interval. The
    /// first subscriber starts polling (if the policy asks for it); the
    /// last one to drop stops it.
    pub fn subscribe(&self) -> Subscription<T> {
        let receiver = self.inner.state.subscribe();
        self.acquire();

        if let Some((seq, future)) = self.begin(FetchMode::IfStale) {
            let query = self.clone();
            tokio::spawn(async move {
                if let Err(e) = query.drive(seq, future).await {
                    debug!(key = %query.inner.key, error = %e, "mount fetch failed");
                }
            });
        }

        Subscription::new(self.clone(), receiver)
    }

    /// Fetch, joining any request already in flight.
    pub async fn revalidate(&self) -> FetchResult<T> {
        match self.begin(FetchMode::Dedupe) {
            Some((seq, future)) => self.drive(seq, future).await,
            None => Err(CoreError::Cancelled),
        }
    }

    /// Fetch now, bypassing de-duplication. Used after mutations so the
    /// result reflects the write.
    pub async fn revalidate_now(&self) -> FetchResult<T> {
        match self.begin(FetchMode::Force) {
            Some((seq, future)) => self.drive(seq, future).await,
            None => Err(CoreError::Cancelled),
        }
    }

    /// React to a focus or reconnect signal. Revalidates only while
    /// subscribed and only if the policy opts in. Returns whether a
    /// revalidation ran.
    pub async fn notify(&self, event: RevalidateEvent) -> bool {
        if !self.inner.policy.revalidates_on(event) || self.subscriber_count() == 0 {
            return false;
        }
        debug!(key = %self.inner.key, %event, "revalidating");
        if let Err(e) = self.revalidate().await {
            debug!(key = %self.inner.key, %event, error = %e, "revalidation failed");
        }
        true
    }

    // ── Fetch machinery ──────────────────────────────────────────────

    /// Register (or join) a fetch. The slot is updated before this
    /// returns, so a second caller always sees the first one's request.
    fn begin(&self, mode: FetchMode) -> Option<(u64, SharedFetch<T>)> {
        if self.inner.cancel.is_cancelled() {
            return None;
        }

        let mut slot = lock(&self.inner.slot);
        if mode != FetchMode::Force {
            if let Some(f) = &slot.in_flight {
                trace!(key = %self.inner.key, seq = f.seq, "joining in-flight fetch");
                return Some((f.seq, f.future.clone()));
            }
        }
        if mode == FetchMode::IfStale
            && slot
                .last_success
                .is_some_and(|at| at.elapsed() < self.inner.policy.dedupe_interval)
        {
            trace!(key = %self.inner.key, "fresh enough, skipping fetch");
            return None;
        }

        slot.issued += 1;
        let seq = slot.issued;
        let future = (self.inner.fetcher)()
            .map(|result| result.map(Arc::new))
            .boxed()
            .shared();
        slot.in_flight = Some(InFlight {
            seq,
            future: future.clone(),
        });
        drop(slot);

        debug!(key = %self.inner.key, seq, ?mode, "fetch started");
        self.inner.state.send_if_modified(|s| {
            let changed = !s.is_validating;
            s.is_validating = true;
            changed
        });
        Some((seq, future))
    }

    async fn drive(&self, seq: u64, future: SharedFetch<T>) -> FetchResult<T> {
        let result = tokio::select! {
            biased;
            () = self.inner.cancel.cancelled() => return Err(CoreError::Cancelled),
            result = future => result,
        };
        self.settle(seq, &result);
        result
    }

    /// Apply a finished fetch unless something newer already landed.
    fn settle(&self, seq: u64, result: &FetchResult<T>) {
        let mut slot = lock(&self.inner.slot);
        if slot.in_flight.as_ref().is_some_and(|f| f.seq == seq) {
            slot.in_flight = None;
        }
        if seq <= slot.applied {
            trace!(key = %self.inner.key, seq, applied = slot.applied, "discarding stale response");
            return;
        }
        slot.applied = seq;
        if result.is_ok() {
            slot.last_success = Some(Instant::now());
        }
        let still_validating = slot.issued > slot.applied;

        // Applied under the slot lock so writes land in sequence order.
        match result {
            Ok(data) => {
                if let Some(hook) = &self.inner.on_success {
                    hook(data);
                }
                self.inner.state.send_modify(|s| {
                    s.data = Some(Arc::clone(data));
                    s.error = None;
                    s.is_validating = still_validating;
                });
            }
            Err(e) => {
                warn!(key = %self.inner.key, seq, error = %e, "fetch failed");
                self.inner.state.send_modify(|s| {
                    s.error = Some(e.clone());
                    s.is_validating = still_validating;
                });
            }
        }
    }

    // ── Subscriber accounting ────────────────────────────────────────

    fn acquire(&self) {
        let mut subs = lock(&self.inner.subscribers);
        subs.count += 1;
        if subs.count == 1 {
            if let Some(every) = self.inner.policy.poll_period() {
                let token = self.inner.cancel.child_token();
                tokio::spawn(poll_task(self.clone(), every, token.clone()));
                subs.poll_cancel = Some(token);
            }
        }
    }

    pub(super) fn release(&self) {
        let mut subs = lock(&self.inner.subscribers);
        subs.count = subs.count.saturating_sub(1);
        if subs.count == 0 {
            if let Some(token) = subs.poll_cancel.take() {
                trace!(key = %self.inner.key, "last subscriber gone, stopping poll");
                token.cancel();
            }
        }
    }
}

// ── Builder ──────────────────────────────────────────────────────────

pub struct QueryBuilder<T: Send + Sync + 'static> {
    key: QueryKey,
    policy: RevalidationPolicy,
    fetcher: Fetcher<T>,
    on_success: Option<SuccessHook<T>>,
    cancel: Option<CancellationToken>,
}

impl<T: Send + Sync + 'static> QueryBuilder<T> {
    pub fn policy(mut self, policy: RevalidationPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Run `hook` with every successful response that gets applied.
    pub fn on_success(mut self, hook: impl Fn(&T) + Send + Sync + 'static) -> Self {
        self.on_success = Some(Arc::new(hook));
        self
    }

    /// Tie the query's lifetime to `parent`: cancelling it stops polling
    /// and fails pending fetches with [`CoreError::Cancelled`].
    pub fn cancel_with(mut self, parent: &CancellationToken) -> Self {
        self.cancel = Some(parent.child_token());
        self
    }

    pub fn build(self) -> Query<T> {
        let (state, _) = watch::channel(QueryState::default());
        Query {
            inner: Arc::new(QueryInner {
                key: self.key,
                policy: self.policy,
                fetcher: self.fetcher,
                on_success: self.on_success,
                state,
                slot: Mutex::new(Slot {
                    in_flight: None,
                    last_success: None,
                    issued: 0,
                    applied: 0,
                }),
                subscribers: Mutex::new(Subscribers::default()),
                cancel: self.cancel.unwrap_or_default(),
            }),
        }
    }
}

// ── Background tasks ─────────────────────────────────────────────────

async fn poll_task<T: Send + Sync + 'static>(
    query: Query<T>,
    every: Duration,
    cancel: CancellationToken,
) {
    let mut interval = tokio::time::interval(every);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    interval.tick().await; // consume the immediate first tick

    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            _ = interval.tick() => {
                if let Err(e) = query.revalidate().await {
                    debug!(key = %query.inner.key, error = %e, "periodic revalidation failed");
                }
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::query::key::Resource;
    use crate::query::policy::TRIGGERS_POLL_INTERVAL;

    fn key() -> QueryKey {
        QueryKey::list(Resource::Triggers)
    }

    /// Each fetch resolves to its issue order (1, 2, ...) after one yield.
    fn counting(policy: RevalidationPolicy) -> (Query<usize>, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let query = Query::builder(key(), move || {
            let n = counter.fetch_add(1, Ordering::SeqCst) + 1;
            async move {
                tokio::task::yield_now().await;
                Ok::<_, CoreError>(n)
            }
        })
        .policy(policy)
        .build();
        (query, calls)
    }

    #[tokio::test]
    async fn starts_loading_until_first_response() {
        let (query, _) = counting(RevalidationPolicy::manual());
        assert!(query.state().is_loading());

        let mut sub = query.subscribe();
        let state = sub.wait_for(|s| !s.is_loading()).await.unwrap();
        assert_eq!(state.data(), Some(&1));
        assert!(!state.is_validating);
    }

    #[tokio::test]
    async fn simultaneous_subscribers_share_one_request() {
        let (query, calls) = counting(RevalidationPolicy::manual());
        let mut a = query.subscribe();
        let mut b = query.subscribe();

        a.wait_for(|s| s.data.is_some()).await.unwrap();
        b.wait_for(|s| s.data.is_some()).await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(query.subscriber_count(), 2);
    }

    #[tokio::test]
    async fn concurrent_revalidations_are_deduplicated() {
        let (query, calls) = counting(RevalidationPolicy::manual());
        let (a, b) = tokio::join!(query.revalidate(), query.revalidate());
        assert_eq!(*a.unwrap(), 1);
        assert_eq!(*b.unwrap(), 1);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn forced_revalidation_bypasses_dedup() {
        let (query, calls) = counting(RevalidationPolicy::manual());
        let (_, forced) = tokio::join!(query.revalidate(), query.revalidate_now());
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(*forced.unwrap(), 2);
        assert_eq!(query.state().data(), Some(&2));
    }

    #[tokio::test(start_paused = true)]
    async fn remount_within_dedupe_interval_does_not_refetch() {
        let (query, calls) = counting(RevalidationPolicy::manual());
        let mut sub = query.subscribe();
        sub.wait_for(|s| s.data.is_some()).await.unwrap();
        drop(sub);

        let _again = query.subscribe();
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        tokio::time::sleep(Duration::from_secs(3)).await;
        let _later = query.subscribe();
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn polls_only_while_subscribed() {
        let (query, calls) = counting(RevalidationPolicy::polling(TRIGGERS_POLL_INTERVAL));
        let sub = query.subscribe();
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(query.is_polling());

        tokio::time::sleep(Duration::from_millis(5_000)).await;
        assert_eq!(calls.load(Ordering::SeqCst), 2);

        drop(sub);
        assert!(!query.is_polling());
        tokio::time::sleep(Duration::from_secs(30)).await;
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn late_response_never_overwrites_newer_one() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let query = Query::builder(key(), move || {
            let counter = Arc::clone(&counter);
            async move {
                let n = counter.fetch_add(1, Ordering::SeqCst) + 1;
                if n == 1 {
                    tokio::time::sleep(Duration::from_millis(500)).await;
                }
                Ok::<_, CoreError>(n)
            }
        })
        .policy(RevalidationPolicy::manual())
        .build();

        let (slow, fast) = tokio::join!(query.revalidate(), query.revalidate_now());
        assert_eq!(*slow.unwrap(), 1);
        assert_eq!(*fast.unwrap(), 2);
        assert_eq!(query.state().data(), Some(&2));
    }

    #[tokio::test]
    async fn failures_keep_data_and_success_clears_error() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let query = Query::builder(key(), move || {
            let n = counter.fetch_add(1, Ordering::SeqCst) + 1;
            async move {
                if n == 2 {
                    Err(CoreError::Api {
                        message: "boom".into(),
                        status: 500,
                    })
                } else {
                    Ok(n)
                }
            }
        })
        .policy(RevalidationPolicy::manual())
        .build();

        query.revalidate().await.unwrap();
        assert!(query.revalidate().await.is_err());
        let state = query.state();
        assert_eq!(state.data(), Some(&1));
        assert!(state.error.is_some());
        assert!(!state.is_loading());

        query.revalidate().await.unwrap();
        let state = query.state();
        assert_eq!(state.data(), Some(&3));
        assert!(state.error.is_none());
    }

    #[tokio::test]
    async fn events_respect_policy_and_subscription() {
        let (query, calls) = counting(RevalidationPolicy::on_reconnect_only());
        assert!(!query.notify(RevalidateEvent::Reconnect).await);

        let mut sub = query.subscribe();
        sub.wait_for(|s| s.data.is_some()).await.unwrap();

        assert!(!query.notify(RevalidateEvent::Focus).await);
        assert!(query.notify(RevalidateEvent::Reconnect).await);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn success_hook_sees_applied_data() {
        let seen = Arc::new(AtomicUsize::new(0));
        let sink = Arc::clone(&seen);
        let query = Query::builder(key(), || async { Ok::<_, CoreError>(41_usize) })
            .on_success(move |n| sink.store(*n + 1, Ordering::SeqCst))
            .build();

        query.revalidate().await.unwrap();
        assert_eq!(seen.load(Ordering::SeqCst), 42);
    }

    #[tokio::test]
    async fn cancelled_parent_stops_fetching() {
        let root = CancellationToken::new();
        let query = Query::builder(key(), || async { Ok::<_, CoreError>(1_usize) })
            .cancel_with(&root)
            .build();

        root.cancel();
        assert_eq!(query.revalidate().await.unwrap_err(), CoreError::Cancelled);
    }
}
