//! REST table backend: a hosted table API addressed over HTTP with
//! bearer-token authorization and PostgREST-style row filters.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use uuid::Uuid;

use crate::models::plan::{NewPlanRow, PlanRow, RowPatch};
use crate::storage::{PlanStore, StoreError};

const TABLE: &str = "training_plan";
const HTTP_TIMEOUT_SECS: u64 = 30;

pub struct RestStore {
    client: Client,
    base_url: String,
    token: String,
}

impl RestStore {
    pub fn new(base_url: String, token: String) -> Self {
        Self {
            client: Client::builder()
                .timeout(std::time::Duration::from_secs(HTTP_TIMEOUT_SECS))
                .build()
                .expect("Failed to build HTTP client"),
            base_url: base_url.trim_end_matches('/').to_string(),
            token,
        }
    }

    fn table_url(&self) -> String {
        format!("{}/{TABLE}", self.base_url)
    }

    fn authed(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        req.header("apikey", &self.token)
            .bearer_auth(&self.token)
            .header("content-type", "application/json")
    }

    /// Maps a non-2xx response into `StoreError::Api` with the body text.
    async fn check(response: reqwest::Response) -> Result<reqwest::Response, StoreError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let message = response.text().await.unwrap_or_default();
        Err(StoreError::Api {
            status: status.as_u16(),
            message,
        })
    }
}

#[async_trait]
impl PlanStore for RestStore {
    async fn list(&self, user_id: Uuid) -> Result<Vec<PlanRow>, StoreError> {
        let response = self
            .authed(self.client.get(self.table_url()))
            .query(&[
                ("user_id", format!("eq.{user_id}")),
                ("order", "workout,exercise,set_number".to_string()),
            ])
            .send()
            .await?;
        let rows: Vec<PlanRow> = Self::check(response).await?.json().await?;
        Ok(rows)
    }

    async fn insert(&self, rows: &[NewPlanRow]) -> Result<Vec<PlanRow>, StoreError> {
        if rows.is_empty() {
            return Ok(vec![]);
        }
        let response = self
            .authed(self.client.post(self.table_url()))
            .header("prefer", "return=representation")
            .json(rows)
            .send()
            .await?;
        let stored: Vec<PlanRow> = Self::check(response).await?.json().await?;
        tracing::info!("Inserted {} rows into {TABLE}", stored.len());
        Ok(stored)
    }

    async fn update(&self, id: Uuid, patch: &RowPatch) -> Result<PlanRow, StoreError> {
        let response = self
            .authed(self.client.patch(self.table_url()))
            .query(&[("id", format!("eq.{id}"))])
            .header("prefer", "return=representation")
            .json(patch)
            .send()
            .await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Err(StoreError::RowNotFound(format!("Row {id} not found")));
        }
        let mut updated: Vec<PlanRow> = Self::check(response).await?.json().await?;
        updated
            .pop()
            .ok_or_else(|| StoreError::RowNotFound(format!("Row {id} not found")))
    }

    async fn delete(&self, id: Uuid) -> Result<(), StoreError> {
        let response = self
            .authed(self.client.delete(self.table_url()))
            .query(&[("id", format!("eq.{id}"))])
            .send()
            .await?;
        Self::check(response).await?;
        Ok(())
    }

    async fn delete_all(&self, user_id: Uuid) -> Result<u64, StoreError> {
        let response = self
            .authed(self.client.delete(self.table_url()))
            .query(&[("user_id", format!("eq.{user_id}"))])
            .header("prefer", "return=representation")
            .send()
            .await?;
        let removed: Vec<PlanRow> = Self::check(response).await?.json().await?;
        tracing::info!("Deleted {} rows for user {user_id}", removed.len());
        Ok(removed.len() as u64)
    }

    async fn batch_update(&self, updates: &[(Uuid, RowPatch)]) -> Result<(), StoreError> {
        // The table API has no multi-row patch; updates run one by one and a
        // mid-sequence failure leaves the earlier ones applied.
        for (id, patch) in updates {
            self.update(*id, patch).await?;
        }
        Ok(())
    }
}
