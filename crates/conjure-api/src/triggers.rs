// Trigger endpoints
//
// Pass-throughs to `/api/triggers`, plus the toggle action. Cancelling a
// trigger is the same request as deleting it.

use tracing::warn;

use crate::client::{ApiClient, Auth};
use crate::error::Error;
use crate::types::{TriggerCreate, TriggerListResponse, TriggerResponse, TriggerUpdate};

const TRIGGERS_PATH: &str = "/api/triggers";

fn trigger_path(id: &str) -> String {
    format!("{TRIGGERS_PATH}/{id}")
}

impl ApiClient {
    /// List every trigger, flattening the paged envelope if the backend
    /// sends one.
    ///
    /// `GET /api/triggers`
    pub async fn list_triggers(&self) -> Result<Vec<TriggerResponse>, Error> {
        let resp: TriggerListResponse = self
            .get(TRIGGERS_PATH, Auth::Optional)
            .await
            .inspect_err(|e| warn!(error = %e, "failed to list triggers"))?;
        Ok(resp.into_items())
    }

    /// One page of triggers.
    ///
    /// `GET /api/triggers?limit=&offset=`
    pub async fn list_triggers_page(
        &self,
        limit: u32,
        offset: u32,
    ) -> Result<TriggerListResponse, Error> {
        self.get_with_params(
            TRIGGERS_PATH,
            &[("limit", limit.to_string()), ("offset", offset.to_string())],
            Auth::Optional,
        )
        .await
        .inspect_err(|e| warn!(limit, offset, error = %e, "failed to list triggers"))
    }

    /// `GET /api/triggers/{id}`
    pub async fn get_trigger(&self, id: &str) -> Result<TriggerResponse, Error> {
        self.get(&trigger_path(id), Auth::Optional)
            .await
            .inspect_err(|e| warn!(id, error = %e, "failed to fetch trigger"))
    }

    /// `POST /api/triggers`
    pub async fn create_trigger(&self, body: &TriggerCreate) -> Result<TriggerResponse, Error> {
        self.post(TRIGGERS_PATH, body, Auth::Optional)
            .await
            .inspect_err(|e| warn!(error = %e, "failed to create trigger"))
    }

    /// Partial update.
    ///
    /// `PUT /api/triggers/{id}`
    pub async fn update_trigger(
        &self,
        id: &str,
        body: &TriggerUpdate,
    ) -> Result<TriggerResponse, Error> {
        self.put(&trigger_path(id), body, Auth::Optional)
            .await
            .inspect_err(|e| warn!(id, error = %e, "failed to update trigger"))
    }

    /// `DELETE /api/triggers/{id}`
    pub async fn delete_trigger(&self, id: &str) -> Result<(), Error> {
        self.delete(&trigger_path(id), Auth::Optional)
            .await
            .inspect_err(|e| warn!(id, error = %e, "failed to delete trigger"))
    }

    /// Flip the enabled flag server-side and return the updated trigger.
    ///
    /// `POST /api/triggers/{id}/toggle`
    pub async fn toggle_trigger(&self, id: &str) -> Result<TriggerResponse, Error> {
        let path = format!("{}/toggle", trigger_path(id));
        self.post(&path, &serde_json::json!({}), Auth::Optional)
            .await
            .inspect_err(|e| warn!(id, error = %e, "failed to toggle trigger"))
    }

    /// Cancel a pending trigger. Same wire call as [`delete_trigger`](Self::delete_trigger).
    pub async fn cancel_trigger(&self, id: &str) -> Result<(), Error> {
        self.delete_trigger(id).await
    }
}
