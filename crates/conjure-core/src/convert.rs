// ── API-to-domain type conversions ──
//
// Bridges raw `conjure_api` wire types into canonical `conjure_core::model`
// domain types, and typed command requests back into wire bodies. Missing
// or malformed optional data falls back to defaults instead of failing.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde_json::{Map, Value};

use conjure_api::types::{
    ConditionWire, EffectCreate, EffectResponse, EffectUpdate, TriggerCreate, TriggerResponse,
    TriggerUpdate,
};

use crate::command::{
    CreateEffectRequest, CreateTriggerRequest, UpdateEffectRequest, UpdateTriggerRequest,
};
use crate::model::{
    Effect, EffectKind, EffectParameters, EntityId, ParameterValue, Session, Trigger,
    TriggerCondition, User,
};

/// Kind recorded for triggers that arrive with neither a condition nor a type.
const UNKNOWN_CONDITION_KIND: &str = "unknown";

// ── Helpers ────────────────────────────────────────────────────────

/// Parse a backend timestamp. Accepts RFC 3339 and the offset-less ISO
/// form Python's `datetime.isoformat()` emits (read as UTC).
fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|naive| naive.and_utc())
}

fn parameters_from_map(map: Map<String, Value>) -> EffectParameters {
    map.into_iter()
        .map(|(k, v)| (k, ParameterValue::from(v)))
        .collect()
}

/// Anything but a JSON object reads as "no parameters".
fn parameters_from_value(value: Value) -> EffectParameters {
    match value {
        Value::Object(map) => parameters_from_map(map),
        _ => EffectParameters::default(),
    }
}

/// Resolve a trigger's condition from its `condition` payload and the
/// top-level `type` some endpoints send alongside (or instead of) it.
fn condition_from_wire(condition: Option<Value>, trigger_type: Option<&str>) -> TriggerCondition {
    match condition {
        Some(Value::Object(mut obj)) if obj.get("type").is_some_and(Value::is_string) => {
            let kind = match obj.remove("type") {
                Some(Value::String(kind)) => kind,
                _ => UNKNOWN_CONDITION_KIND.to_owned(),
            };
            let value = obj.remove("value").unwrap_or(Value::Null);
            TriggerCondition::from_parts(&kind, value)
        }
        Some(value) => TriggerCondition::from_parts(
            trigger_type.unwrap_or(UNKNOWN_CONDITION_KIND),
            value,
        ),
        None => TriggerCondition::from_parts(
            trigger_type.unwrap_or(UNKNOWN_CONDITION_KIND),
            Value::Null,
        ),
    }
}

fn condition_to_wire(condition: &TriggerCondition) -> ConditionWire {
    let (kind, value) = condition.to_parts();
    ConditionWire {
        kind: kind.to_owned(),
        value,
    }
}

impl From<EffectParameters> for Map<String, Value> {
    fn from(params: EffectParameters) -> Self {
        params
            .iter()
            .map(|(k, v)| (k.to_owned(), Value::from(v.clone())))
            .collect()
    }
}

// ── Effects ────────────────────────────────────────────────────────

impl From<EffectResponse> for Effect {
    fn from(e: EffectResponse) -> Self {
        Self {
            id: EntityId::from(e.id),
            name: e.name,
            kind: EffectKind::from(e.effect_type),
            parameters: parameters_from_value(e.parameters),
            description: e.description,
        }
    }
}

impl From<CreateEffectRequest> for EffectCreate {
    fn from(req: CreateEffectRequest) -> Self {
        Self {
            name: req.name,
            effect_type: req.kind.into(),
            parameters: req.parameters.into(),
            description: req.description,
        }
    }
}

impl From<UpdateEffectRequest> for EffectUpdate {
    fn from(req: UpdateEffectRequest) -> Self {
        Self {
            name: req.name,
            effect_type: req.kind.map(String::from),
            parameters: req.parameters.map(Map::from),
            description: req.description,
        }
    }
}

// ── Triggers ───────────────────────────────────────────────────────

impl From<TriggerResponse> for Trigger {
    fn from(t: TriggerResponse) -> Self {
        let condition = condition_from_wire(t.condition, t.trigger_type.as_deref());
        Self {
            id: EntityId::from(t.id),
            name: t.name,
            condition,
            effect_id: t.effect_id.map(EntityId::from),
            enabled: t.enabled,
            created_at: t.created_at.as_deref().and_then(parse_timestamp),
            description: t.description,
            parameters: t.parameters.map(parameters_from_map).unwrap_or_default(),
        }
    }
}

impl From<CreateTriggerRequest> for TriggerCreate {
    fn from(req: CreateTriggerRequest) -> Self {
        Self {
            name: req.name,
            trigger_type: req.condition.kind().to_owned(),
            condition: condition_to_wire(&req.condition),
            effect_id: req.effect_id.map(EntityId::into_inner),
            enabled: req.enabled,
            description: req.description,
            parameters: req.parameters.into(),
        }
    }
}

impl From<UpdateTriggerRequest> for TriggerUpdate {
    fn from(req: UpdateTriggerRequest) -> Self {
        Self {
            name: req.name,
            trigger_type: req.condition.as_ref().map(|c| c.kind().to_owned()),
            condition: req.condition.as_ref().map(condition_to_wire),
            effect_id: req.effect_id.map(EntityId::into_inner),
            enabled: req.enabled,
            description: req.description,
            parameters: req.parameters.map(Map::from),
        }
    }
}

// ── Session ────────────────────────────────────────────────────────

impl From<conjure_api::types::User> for User {
    fn from(u: conjure_api::types::User) -> Self {
        Self {
            id: EntityId::from(u.id),
            email: u.email,
            username: u.username,
        }
    }
}

impl From<conjure_api::types::AuthResponse> for Session {
    fn from(r: conjure_api::types::AuthResponse) -> Self {
        Self {
            token_type: r.token_type,
            expires_in: r.expires_in,
            user: r.user.map(User::from),
        }
    }
}
