// ── Data synchronization ──
//
// Stale-while-revalidate queries: cached per key, de-duplicated while in
// flight, refreshed on a timer or on focus/reconnect signals, and forced
// after mutations.

mod cache;
mod entry;
mod key;
mod policy;
mod state;
mod subscription;

pub use cache::QueryCache;
pub use entry::{FetchResult, Query, QueryBuilder};
pub use key::{QueryKey, Resource};
pub use policy::{
    DEFAULT_DEDUPE_INTERVAL, RevalidateEvent, RevalidationPolicy, TRIGGERS_POLL_INTERVAL,
};
pub use state::QueryState;
pub use subscription::{QueryStream, Subscription};
