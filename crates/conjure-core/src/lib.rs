// conjure-core: Reactive data layer between conjure-api and consumers (CLI).

pub mod command;
pub mod config;
pub mod convert;
pub mod dashboard;
pub mod error;
pub mod model;
pub mod query;
pub mod store;
pub mod view;

// ── Primary re-exports ──────────────────────────────────────────────
pub use command::requests::*;
pub use command::{Command, CommandResult};
pub use config::{DEFAULT_API_URL, DashboardConfig};
pub use dashboard::{Dashboard, TriggerPage};
pub use error::CoreError;
pub use query::{
    Query, QueryKey, QueryState, RevalidateEvent, RevalidationPolicy, Subscription,
};
pub use store::{CollectionFeed, EchoStore};

// Re-export model types at the crate root for ergonomics.
pub use model::{
    Effect, EffectKind, EffectParameters, EntityId, ParameterValue, Session, Trigger,
    TriggerCondition, User,
};
