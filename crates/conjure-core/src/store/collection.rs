// ── Generic reactive entity collection ──
//
// Concurrent storage with O(1) id lookups, a stable server order, and
// push-based change notification via `watch` channels.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, PoisonError};

use dashmap::DashMap;
use tokio::sync::watch;

use crate::model::{EntityId, Identified};

/// A reactive collection for a single entity type.
///
/// Uses `DashMap` for concurrent lookups and `watch` channels for
/// push-based change notification. `order` is the source of truth for
/// iteration order; every mutation holds it while touching `by_id`, then
/// rebuilds the snapshot subscribers receive.
pub(crate) struct EntityCollection<T: Identified + Send + Sync + 'static> {
    by_id: DashMap<EntityId, Arc<T>>,

    /// Ids in display order. At most one entry per id.
    order: Mutex<Vec<EntityId>>,

    /// Version counter, bumped on every mutation.
    version: watch::Sender<u64>,

    /// Full ordered snapshot, rebuilt on mutation.
    snapshot: watch::Sender<Arc<Vec<Arc<T>>>>,
}

impl<T: Identified + Send + Sync + 'static> EntityCollection<T> {
    pub(crate) fn new() -> Self {
        let (version, _) = watch::channel(0u64);
        let (snapshot, _) = watch::channel(Arc::new(Vec::new()));

        Self {
            by_id: DashMap::new(),
            order: Mutex::new(Vec::new()),
            version,
            snapshot,
        }
    }

    /// Replace the whole collection, keeping the incoming order.
    ///
    /// Duplicate ids collapse to one entry: the last value wins and the
    /// first position is kept. Entities missing from `items` are pruned.
    pub(crate) fn replace_all(&self, items: Vec<T>) {
        let mut order = self.order.lock().unwrap_or_else(PoisonError::into_inner);

        let mut next_order = Vec::with_capacity(items.len());
        let mut seen = HashSet::with_capacity(items.len());
        for item in items {
            let id = item.id().clone();
            if seen.insert(id.clone()) {
                next_order.push(id.clone());
            }
            self.by_id.insert(id, Arc::new(item));
        }
        self.by_id.retain(|id, _| seen.contains(id));
        *order = next_order;

        self.publish(&order);
    }

    /// Append an entity, or replace it in place if its id is already
    /// present. Returns `true` if the id was new.
    pub(crate) fn upsert(&self, item: T) -> bool {
        let mut order = self.order.lock().unwrap_or_else(PoisonError::into_inner);

        let id = item.id().clone();
        let is_new = self.by_id.insert(id.clone(), Arc::new(item)).is_none();
        if is_new {
            order.push(id);
        }

        self.publish(&order);
        is_new
    }

    /// Look up an entity by its `EntityId`.
    pub(crate) fn get(&self, id: &EntityId) -> Option<Arc<T>> {
        self.by_id.get(id).map(|r| Arc::clone(r.value()))
    }

    /// Get the current snapshot (cheap `Arc` clone).
    pub(crate) fn snapshot(&self) -> Arc<Vec<Arc<T>>> {
        self.snapshot.borrow().clone()
    }

    /// Subscribe to snapshot changes via a `watch::Receiver`.
    pub(crate) fn subscribe(&self) -> watch::Receiver<Arc<Vec<Arc<T>>>> {
        self.snapshot.subscribe()
    }

    /// Remove all entities.
    pub(crate) fn clear(&self) {
        let mut order = self.order.lock().unwrap_or_else(PoisonError::into_inner);
        self.by_id.clear();
        order.clear();
        self.publish(&order);
    }

    pub(crate) fn len(&self) -> usize {
        self.by_id.len()
    }

    pub(crate) fn version(&self) -> u64 {
        *self.version.borrow()
    }

    // ── Private helpers ──────────────────────────────────────────────

    /// Rebuild the ordered snapshot and broadcast it. Caller holds `order`.
    fn publish(&self, order: &[EntityId]) {
        let values: Vec<Arc<T>> = order.iter().filter_map(|id| self.get(id)).collect();
        // `send_modify` updates unconditionally, even with zero receivers.
        self.snapshot.send_modify(|snap| *snap = Arc::new(values));
        self.version.send_modify(|v| *v += 1);
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq)]
    struct Item {
        id: EntityId,
        label: &'static str,
    }

    impl Identified for Item {
        fn id(&self) -> &EntityId {
            &self.id
        }
    }

    fn item(id: &str, label: &'static str) -> Item {
        Item {
            id: EntityId::from(id),
            label,
        }
    }

    fn labels(col: &EntityCollection<Item>) -> Vec<&'static str> {
        col.snapshot().iter().map(|i| i.label).collect()
    }

    #[test]
    fn replace_all_preserves_server_order() {
        let col = EntityCollection::new();
        col.replace_all(vec![item("3", "c"), item("1", "a"), item("2", "b")]);
        assert_eq!(labels(&col), ["c", "a", "b"]);
    }

    #[test]
    fn duplicate_ids_keep_first_position_and_last_value() {
        let col = EntityCollection::new();
        col.replace_all(vec![item("1", "old"), item("2", "b"), item("1", "new")]);
        assert_eq!(labels(&col), ["new", "b"]);
        assert_eq!(col.len(), 2);
    }

    #[test]
    fn replace_all_prunes_missing_entities() {
        let col = EntityCollection::new();
        col.replace_all(vec![item("1", "a"), item("2", "b")]);
        col.replace_all(vec![item("2", "b2")]);

        assert!(col.get(&EntityId::from("1")).is_none());
        assert_eq!(labels(&col), ["b2"]);
    }

    #[test]
    fn upsert_appends_new_and_replaces_existing_in_place() {
        let col = EntityCollection::new();
        col.replace_all(vec![item("1", "a"), item("2", "b")]);

        assert!(col.upsert(item("3", "c")));
        assert!(!col.upsert(item("1", "a2")));
        assert_eq!(labels(&col), ["a2", "b", "c"]);
    }

    #[test]
    fn every_mutation_bumps_version_and_notifies() {
        let col = EntityCollection::new();
        let mut rx = col.subscribe();
        let before = col.version();

        col.upsert(item("1", "a"));
        assert!(rx.has_changed().unwrap());
        assert_eq!(rx.borrow_and_update().len(), 1);

        col.clear();
        assert!(col.snapshot().is_empty());
        assert_eq!(col.version(), before + 2);
    }
}
