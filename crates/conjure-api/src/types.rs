// Wire types for the effects/triggers REST API.
//
// These mirror the JSON the backend sends and accepts. They stay loose
// (strings, raw JSON values) on purpose; `conjure-core` converts them into
// the typed domain model.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

// ── Identifier handling ──────────────────────────────────────────────

/// The backend emits ids as strings or integers depending on the store.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawId {
    Text(String),
    Number(i64),
}

impl From<RawId> for String {
    fn from(id: RawId) -> Self {
        match id {
            RawId::Text(s) => s,
            RawId::Number(n) => n.to_string(),
        }
    }
}

fn flexible_id<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
    RawId::deserialize(d).map(String::from)
}

fn flexible_id_opt<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
    Ok(Option::<RawId>::deserialize(d)?.map(String::from))
}

fn default_enabled() -> bool {
    true
}

// ── Effects ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct EffectResponse {
    #[serde(deserialize_with = "flexible_id")]
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub effect_type: String,
    #[serde(default)]
    pub parameters: Value,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct EffectCreate {
    pub name: String,
    #[serde(rename = "type")]
    pub effect_type: String,
    pub parameters: Map<String, Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Partial effect update. Absent fields are left untouched server-side.
#[derive(Debug, Clone, Default, Serialize)]
pub struct EffectUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub effect_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parameters: Option<Map<String, Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

// ── Triggers ─────────────────────────────────────────────────────────

/// `{ "type": <kind>, "value": <anything> }`
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ConditionWire {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub value: Value,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TriggerResponse {
    #[serde(deserialize_with = "flexible_id")]
    pub id: String,
    pub name: String,
    #[serde(rename = "type", default)]
    pub trigger_type: Option<String>,
    #[serde(default)]
    pub condition: Option<Value>,
    #[serde(default, alias = "effectId", deserialize_with = "flexible_id_opt")]
    pub effect_id: Option<String>,
    #[serde(default = "default_enabled", alias = "is_active", alias = "isActive")]
    pub enabled: bool,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub parameters: Option<Map<String, Value>>,
}

/// `GET /api/triggers` answers either a bare array or a paged envelope.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum TriggerListResponse {
    Bare(Vec<TriggerResponse>),
    Paged {
        triggers: Vec<TriggerResponse>,
        #[serde(default)]
        total: Option<u64>,
    },
}

impl TriggerListResponse {
    pub fn total(&self) -> usize {
        match self {
            Self::Bare(items) => items.len(),
            Self::Paged { triggers, total } => total
                .and_then(|t| usize::try_from(t).ok())
                .unwrap_or(triggers.len()),
        }
    }

    pub fn into_items(self) -> Vec<TriggerResponse> {
        match self {
            Self::Bare(items) | Self::Paged { triggers: items, .. } => items,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct TriggerCreate {
    pub name: String,
    /// Mirrors `condition.type`; list views read it directly.
    #[serde(rename = "type")]
    pub trigger_type: String,
    pub condition: ConditionWire,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub effect_id: Option<String>,
    pub enabled: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Map::is_empty")]
    pub parameters: Map<String, Value>,
}

/// Partial trigger update. Absent fields are left untouched server-side.
#[derive(Debug, Clone, Default, Serialize)]
pub struct TriggerUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub trigger_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub condition: Option<ConditionWire>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub effect_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parameters: Option<Map<String, Value>>,
}

// ── Auth ─────────────────────────────────────────────────────────────

#[derive(Serialize)]
pub(crate) struct LoginRequest<'a> {
    pub email: &'a str,
    pub password: &'a str,
}

#[derive(Serialize)]
pub(crate) struct RegisterRequest<'a> {
    pub email: &'a str,
    pub password: &'a str,
    pub username: &'a str,
}

#[derive(Serialize)]
pub(crate) struct ResetPasswordRequest<'a> {
    pub email: &'a str,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct User {
    #[serde(deserialize_with = "flexible_id")]
    pub id: String,
    pub email: String,
    pub username: String,
}

#[derive(Clone, Deserialize)]
pub struct AuthResponse {
    pub access_token: String,
    #[serde(default = "default_token_type")]
    pub token_type: String,
    #[serde(default)]
    pub expires_in: Option<u64>,
    #[serde(default)]
    pub user: Option<User>,
}

fn default_token_type() -> String {
    "bearer".into()
}

impl fmt::Debug for AuthResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthResponse")
            .field("access_token", &"[REDACTED]")
            .field("token_type", &self.token_type)
            .field("expires_in", &self.expires_in)
            .field("user", &self.user)
            .finish()
    }
}
