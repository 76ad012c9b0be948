// ── Effect domain types ──

use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use strum::EnumString;

use super::entity_id::{EntityId, Identified};

// ── EffectKind ──────────────────────────────────────────────────────

/// What an effect renders as.
///
/// Matching is exact. Unknown kinds, and known kinds in another casing,
/// survive verbatim as [`Other`](Self::Other) so a newer backend never
/// breaks listing.
#[derive(Debug, Clone, PartialEq, Eq, Hash, EnumString, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum EffectKind {
    #[strum(serialize = "particle")]
    Particle,
    #[strum(serialize = "sound")]
    Sound,
    #[strum(serialize = "visual")]
    Visual,
    #[strum(default)]
    Other(String),
}

impl EffectKind {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Particle => "particle",
            Self::Sound => "sound",
            Self::Visual => "visual",
            Self::Other(s) => s,
        }
    }

    /// The kinds the backend documents, in display order.
    pub const KNOWN: [Self; 3] = [Self::Particle, Self::Sound, Self::Visual];
}

impl fmt::Display for EffectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<String> for EffectKind {
    fn from(s: String) -> Self {
        s.parse().unwrap_or(Self::Other(s))
    }
}

impl From<EffectKind> for String {
    fn from(kind: EffectKind) -> Self {
        match kind {
            EffectKind::Other(s) => s,
            known => known.as_str().to_owned(),
        }
    }
}

// ── Parameters ──────────────────────────────────────────────────────

/// A single parameter value. Anything that isn't a scalar is kept as
/// raw JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParameterValue {
    Flag(bool),
    Number(f64),
    Text(String),
    Opaque(serde_json::Value),
}

impl ParameterValue {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Flag(b) => Some(*b),
            _ => None,
        }
    }
}

impl fmt::Display for ParameterValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Flag(b) => write!(f, "{b}"),
            Self::Number(n) => write!(f, "{n}"),
            Self::Text(s) => f.write_str(s),
            Self::Opaque(v) => write!(f, "{v}"),
        }
    }
}

impl From<serde_json::Value> for ParameterValue {
    fn from(v: serde_json::Value) -> Self {
        match v {
            serde_json::Value::Bool(b) => Self::Flag(b),
            serde_json::Value::Number(n) => n
                .as_f64()
                .map_or_else(|| Self::Opaque(serde_json::Value::Number(n)), Self::Number),
            serde_json::Value::String(s) => Self::Text(s),
            other => Self::Opaque(other),
        }
    }
}

impl From<ParameterValue> for serde_json::Value {
    fn from(p: ParameterValue) -> Self {
        match p {
            ParameterValue::Flag(b) => Self::Bool(b),
            ParameterValue::Number(n) => {
                serde_json::Number::from_f64(n).map_or(Self::Null, Self::Number)
            }
            ParameterValue::Text(s) => Self::String(s),
            ParameterValue::Opaque(v) => v,
        }
    }
}

/// Freeform effect parameters, keyed by name.
///
/// `intensity`, `duration` (milliseconds) and `color` are the keys the
/// backend understands; everything else passes through untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EffectParameters(BTreeMap<String, ParameterValue>);

impl EffectParameters {
    pub const INTENSITY: &'static str = "intensity";
    pub const DURATION: &'static str = "duration";
    pub const COLOR: &'static str = "color";

    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&ParameterValue> {
        self.0.get(key)
    }

    pub fn insert(
        &mut self,
        key: impl Into<String>,
        value: ParameterValue,
    ) -> Option<ParameterValue> {
        self.0.insert(key.into(), value)
    }

    pub fn intensity(&self) -> Option<f64> {
        self.get(Self::INTENSITY).and_then(ParameterValue::as_f64)
    }

    /// Raw duration in milliseconds as sent by the backend.
    pub fn duration_ms(&self) -> Option<f64> {
        self.get(Self::DURATION).and_then(ParameterValue::as_f64)
    }

    /// Duration as a [`Duration`]; negative or non-finite values yield `None`.
    pub fn duration(&self) -> Option<Duration> {
        self.duration_ms()
            .filter(|ms| ms.is_finite() && *ms >= 0.0)
            .map(|ms| Duration::from_secs_f64(ms / 1000.0))
    }

    pub fn color(&self) -> Option<&str> {
        self.get(Self::COLOR).and_then(ParameterValue::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ParameterValue)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(String, ParameterValue)> for EffectParameters {
    fn from_iter<I: IntoIterator<Item = (String, ParameterValue)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

// ── Effect ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Effect {
    pub id: EntityId,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: EffectKind,
    #[serde(default)]
    pub parameters: EffectParameters,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Identified for Effect {
    fn id(&self) -> &EntityId {
        &self.id
    }
}
