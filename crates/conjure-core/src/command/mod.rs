// ── Command API ──
//
// All write operations flow through a unified `Command` enum. The
// dashboard routes each variant to its endpoint and revalidates the
// affected queries once the write succeeds.

pub mod requests;

use crate::model::{Effect, EntityId, Trigger};

pub use requests::{
    CreateEffectRequest, CreateTriggerRequest, UpdateEffectRequest, UpdateTriggerRequest,
};

/// Every write operation against the backend.
#[derive(Debug, Clone)]
pub enum Command {
    // ── Effect operations ────────────────────────────────────────────
    CreateEffect(CreateEffectRequest),
    UpdateEffect {
        id: EntityId,
        update: UpdateEffectRequest,
    },
    DeleteEffect {
        id: EntityId,
    },

    // ── Trigger operations ───────────────────────────────────────────
    CreateTrigger(CreateTriggerRequest),
    UpdateTrigger {
        id: EntityId,
        update: UpdateTriggerRequest,
    },
    DeleteTrigger {
        id: EntityId,
    },
    ToggleTrigger {
        id: EntityId,
    },
    CancelTrigger {
        id: EntityId,
    },
}

/// What a successfully executed command hands back.
#[derive(Debug, Clone)]
pub enum CommandResult {
    Ok,
    Effect(Effect),
    Trigger(Trigger),
}
