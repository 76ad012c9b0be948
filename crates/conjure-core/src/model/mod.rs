// ── Domain model ──
//
// Typed views of what the backend stores. `convert` builds these from the
// loose wire types in `conjure-api`.

pub mod effect;
pub mod entity_id;
pub mod trigger;
pub mod user;

pub use effect::{Effect, EffectKind, EffectParameters, ParameterValue};
pub use entity_id::{EntityId, Identified};
pub use trigger::{Trigger, TriggerCondition};
pub use user::{Session, User};
