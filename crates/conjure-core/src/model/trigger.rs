// ── Trigger domain types ──

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::effect::EffectParameters;
use super::entity_id::{EntityId, Identified};

// ── TriggerCondition ────────────────────────────────────────────────

/// When a trigger fires.
///
/// On the wire this is `{ "type": <kind>, "value": <any> }`. Kinds we
/// don't model, or known kinds carrying a non-string value, stay
/// [`Opaque`](Self::Opaque) so they round-trip unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TriggerCondition {
    /// Cron-like schedule.
    Time { schedule: String },
    /// Named game/server event.
    Event { name: String },
    /// Boolean expression, wire kind `condition`.
    #[serde(rename = "condition")]
    Expression { expr: String },
    #[serde(rename = "opaque")]
    Opaque { kind: String, value: Value },
}

impl TriggerCondition {
    pub const TIME: &'static str = "time";
    pub const EVENT: &'static str = "event";
    pub const EXPRESSION: &'static str = "condition";

    /// Build from the wire `type` and `value`.
    pub fn from_parts(kind: &str, value: Value) -> Self {
        match (kind, value) {
            (Self::TIME, Value::String(schedule)) => Self::Time { schedule },
            (Self::EVENT, Value::String(name)) => Self::Event { name },
            (Self::EXPRESSION, Value::String(expr)) => Self::Expression { expr },
            (kind, value) => Self::Opaque {
                kind: kind.to_owned(),
                value,
            },
        }
    }

    /// Split back into the wire `type` and `value`.
    pub fn to_parts(&self) -> (&str, Value) {
        match self {
            Self::Time { schedule } => (Self::TIME, Value::String(schedule.clone())),
            Self::Event { name } => (Self::EVENT, Value::String(name.clone())),
            Self::Expression { expr } => (Self::EXPRESSION, Value::String(expr.clone())),
            Self::Opaque { kind, value } => (kind, value.clone()),
        }
    }

    /// The wire kind (`time`, `event`, `condition`, or whatever the
    /// backend sent).
    pub fn kind(&self) -> &str {
        match self {
            Self::Time { .. } => Self::TIME,
            Self::Event { .. } => Self::EVENT,
            Self::Expression { .. } => Self::EXPRESSION,
            Self::Opaque { kind, .. } => kind,
        }
    }
}

impl fmt::Display for TriggerCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Time { schedule } => write!(f, "time: {schedule}"),
            Self::Event { name } => write!(f, "event: {name}"),
            Self::Expression { expr } => write!(f, "condition: {expr}"),
            Self::Opaque { kind, value } if value.is_null() => f.write_str(kind),
            Self::Opaque { kind, value } => write!(f, "{kind}: {value}"),
        }
    }
}

// ── Trigger ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trigger {
    pub id: EntityId,
    pub name: String,
    pub condition: TriggerCondition,
    pub effect_id: Option<EntityId>,
    pub enabled: bool,
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub parameters: EffectParameters,
}

impl Trigger {
    pub fn status_label(&self) -> &'static str {
        if self.enabled { "Enabled" } else { "Disabled" }
    }
}

impl Identified for Trigger {
    fn id(&self) -> &EntityId {
        &self.id
    }
}
