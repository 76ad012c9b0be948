// ── Per-item query cache ──

use dashmap::DashMap;

use super::entry::Query;
use crate::model::EntityId;

/// Lazily created queries for single items, one per id.
pub struct QueryCache<T: Send + Sync + 'static> {
    queries: DashMap<EntityId, Query<T>>,
}

impl<T: Send + Sync + 'static> QueryCache<T> {
    pub fn new() -> Self {
        Self {
            queries: DashMap::new(),
        }
    }

    /// The query for `id`, building it on first use.
    pub fn get_or_insert_with(&self, id: &EntityId, build: impl FnOnce() -> Query<T>) -> Query<T> {
        self.queries
            .entry(id.clone())
            .or_insert_with(build)
            .value()
            .clone()
    }

    pub fn get(&self, id: &EntityId) -> Option<Query<T>> {
        self.queries.get(id).map(|q| q.value().clone())
    }

    pub fn remove(&self, id: &EntityId) -> Option<Query<T>> {
        self.queries.remove(id).map(|(_, q)| q)
    }

    /// Every cached query, for broadcasting focus/reconnect.
    pub fn all(&self) -> Vec<Query<T>> {
        self.queries.iter().map(|q| q.value().clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.queries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queries.is_empty()
    }
}

impl<T: Send + Sync + 'static> Default for QueryCache<T> {
    fn default() -> Self {
        Self::new()
    }
}
