// ── Typed request structs for Command payloads ──

use serde::{Deserialize, Serialize};

use crate::model::{EffectKind, EffectParameters, EntityId, TriggerCondition};

// ── Effects ────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateEffectRequest {
    pub name: String,
    #[serde(alias = "type")]
    pub kind: EffectKind,
    #[serde(default)]
    pub parameters: EffectParameters,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateEffectRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(alias = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<EffectKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parameters: Option<EffectParameters>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl UpdateEffectRequest {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.kind.is_none()
            && self.parameters.is_none()
            && self.description.is_none()
    }
}

// ── Triggers ───────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateTriggerRequest {
    pub name: String,
    pub condition: TriggerCondition,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub effect_id: Option<EntityId>,
    pub enabled: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub parameters: EffectParameters,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateTriggerRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub condition: Option<TriggerCondition>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub effect_id: Option<EntityId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parameters: Option<EffectParameters>,
}

impl UpdateTriggerRequest {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.condition.is_none()
            && self.effect_id.is_none()
            && self.enabled.is_none()
            && self.description.is_none()
            && self.parameters.is_none()
    }
}
