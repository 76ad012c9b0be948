// ── Local echo store ──
//
// The last server-confirmed state of every effect and trigger, held
// locally so views render without a round-trip. List fetches write the
// whole collection; creates append. Nothing here is optimistic.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::watch;
use tracing::debug;

use super::collection::EntityCollection;
use super::feed::CollectionFeed;
use crate::model::{Effect, EntityId, Trigger};

/// Locally mirrored effects and triggers.
///
/// Owned by whoever builds the [`Dashboard`](crate::Dashboard) and handed
/// in, so tests and multiple dashboards never share hidden state.
pub struct EchoStore {
    pub(crate) effects: EntityCollection<Effect>,
    pub(crate) triggers: EntityCollection<Trigger>,
    pub(crate) effects_synced: watch::Sender<Option<DateTime<Utc>>>,
    pub(crate) triggers_synced: watch::Sender<Option<DateTime<Utc>>>,
}

impl EchoStore {
    pub fn new() -> Self {
        let (effects_synced, _) = watch::channel(None);
        let (triggers_synced, _) = watch::channel(None);

        Self {
            effects: EntityCollection::new(),
            triggers: EntityCollection::new(),
            effects_synced,
            triggers_synced,
        }
    }

    /// Drop everything, including sync timestamps.
    pub fn reset(&self) {
        self.effects.clear();
        self.triggers.clear();
        self.effects_synced.send_replace(None);
        self.triggers_synced.send_replace(None);
    }

    // ── Writers ──────────────────────────────────────────────────────

    /// Replace every effect with a fresh server listing.
    pub fn set_effects(&self, effects: Vec<Effect>) {
        debug!(count = effects.len(), "echo store: set effects");
        self.effects.replace_all(effects);
        self.effects_synced.send_replace(Some(Utc::now()));
    }

    /// Replace every trigger with a fresh server listing.
    pub fn set_triggers(&self, triggers: Vec<Trigger>) {
        debug!(count = triggers.len(), "echo store: set triggers");
        self.triggers.replace_all(triggers);
        self.triggers_synced.send_replace(Some(Utc::now()));
    }

    /// Append a newly created effect. Returns `true` if its id was new.
    pub fn add_effect(&self, effect: Effect) -> bool {
        self.effects.upsert(effect)
    }

    /// Append a newly created trigger. Returns `true` if its id was new.
    pub fn add_trigger(&self, trigger: Trigger) -> bool {
        self.triggers.upsert(trigger)
    }

    // ── Snapshot accessors ───────────────────────────────────────────

    pub fn effects_snapshot(&self) -> Arc<Vec<Arc<Effect>>> {
        self.effects.snapshot()
    }

    pub fn triggers_snapshot(&self) -> Arc<Vec<Arc<Trigger>>> {
        self.triggers.snapshot()
    }

    pub fn effect(&self, id: &EntityId) -> Option<Arc<Effect>> {
        self.effects.get(id)
    }

    pub fn trigger(&self, id: &EntityId) -> Option<Arc<Trigger>> {
        self.triggers.get(id)
    }

    pub fn effect_count(&self) -> usize {
        self.effects.len()
    }

    pub fn trigger_count(&self) -> usize {
        self.triggers.len()
    }

    // ── Subscriptions ────────────────────────────────────────────────

    pub fn subscribe_effects(&self) -> CollectionFeed<Effect> {
        CollectionFeed::new(self.effects.subscribe())
    }

    pub fn subscribe_triggers(&self) -> CollectionFeed<Trigger> {
        CollectionFeed::new(self.triggers.subscribe())
    }

    // ── Sync metadata ────────────────────────────────────────────────

    /// When the effect list was last written from a server listing.
    pub fn effects_last_sync(&self) -> Option<DateTime<Utc>> {
        *self.effects_synced.borrow()
    }

    pub fn triggers_last_sync(&self) -> Option<DateTime<Utc>> {
        *self.triggers_synced.borrow()
    }

    /// Seconds since the trigger list was last synced, if ever.
    pub fn triggers_data_age_secs(&self) -> Option<i64> {
        self.triggers_last_sync()
            .map(|t| Utc::now().signed_duration_since(t).num_seconds())
    }
}

impl Default for EchoStore {
    fn default() -> Self {
        Self::new()
    }
}
