// Effect endpoints
//
// Pass-throughs to `/api/magic-effects`. No local validation; the backend
// owns every rule about what an effect may contain.

use tracing::warn;

use crate::client::{ApiClient, Auth};
use crate::error::Error;
use crate::types::{EffectCreate, EffectResponse, EffectUpdate};

const EFFECTS_PATH: &str = "/api/magic-effects";

fn effect_path(id: &str) -> String {
    format!("{EFFECTS_PATH}/{id}")
}

impl ApiClient {
    /// List every effect.
    ///
    /// `GET /api/magic-effects`
    pub async fn list_effects(&self) -> Result<Vec<EffectResponse>, Error> {
        self.get(EFFECTS_PATH, Auth::Optional)
            .await
            .inspect_err(|e| warn!(error = %e, "failed to fetch effects"))
    }

    /// Fetch a single effect.
    ///
    /// `GET /api/magic-effects/{id}`
    pub async fn get_effect(&self, id: &str) -> Result<EffectResponse, Error> {
        self.get(&effect_path(id), Auth::Optional)
            .await
            .inspect_err(|e| warn!(id, error = %e, "failed to fetch effect"))
    }

    /// `POST /api/magic-effects`
    pub async fn create_effect(&self, body: &EffectCreate) -> Result<EffectResponse, Error> {
        self.post(EFFECTS_PATH, body, Auth::Optional)
            .await
            .inspect_err(|e| warn!(error = %e, "failed to create effect"))
    }

    /// Partial update.
    ///
    /// `PUT /api/magic-effects/{id}`
    pub async fn update_effect(
        &self,
        id: &str,
        body: &EffectUpdate,
    ) -> Result<EffectResponse, Error> {
        self.put(&effect_path(id), body, Auth::Optional)
            .await
            .inspect_err(|e| warn!(id, error = %e, "failed to update effect"))
    }

    /// `DELETE /api/magic-effects/{id}`
    pub async fn delete_effect(&self, id: &str) -> Result<(), Error> {
        self.delete(&effect_path(id), Auth::Optional)
            .await
            .inspect_err(|e| warn!(id, error = %e, "failed to delete effect"))
    }
}
