// ── Reactive storage ──

mod collection;
mod echo_store;
mod feed;

pub use echo_store::EchoStore;
pub use feed::CollectionFeed;
