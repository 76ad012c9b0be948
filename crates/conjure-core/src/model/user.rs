// ── Session domain types ──

use serde::{Deserialize, Serialize};

use super::entity_id::EntityId;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: EntityId,
    pub email: String,
    pub username: String,
}

/// What a successful login leaves behind. The token itself lives in the
/// token store and is never exposed here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub token_type: String,
    pub expires_in: Option<u64>,
    pub user: Option<User>,
}
