//! Data access for training-plan rows.
//!
//! One contract, two interchangeable remote backends selected by
//! configuration: a REST table API (`RestStore`) and a spreadsheet cell API
//! (`SheetStore`). Both are opaque HTTP collaborators; neither is retried on
//! failure. Last write wins at the remote store.

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::models::plan::{NewPlanRow, PlanRow, RowPatch};

pub mod rest;
pub mod sheets;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Backend error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("{0}")]
    RowNotFound(String),
}

/// The storage contract every backend implements.
///
/// Operations map one-to-one onto user actions; there is no transaction
/// spanning calls. Bulk plan replacement is delete_all followed by insert
/// and is deliberately not atomic.
#[async_trait]
pub trait PlanStore: Send + Sync {
    /// All rows belonging to one user, in backend order.
    async fn list(&self, user_id: Uuid) -> Result<Vec<PlanRow>, StoreError>;

    /// Bulk insert; returns the stored rows with assigned ids.
    async fn insert(&self, rows: &[NewPlanRow]) -> Result<Vec<PlanRow>, StoreError>;

    /// Applies a partial update to one row and returns the updated row.
    async fn update(&self, id: Uuid, patch: &RowPatch) -> Result<PlanRow, StoreError>;

    /// Deletes one row by id.
    async fn delete(&self, id: Uuid) -> Result<(), StoreError>;

    /// Deletes every row of one user, returning the number removed.
    async fn delete_all(&self, user_id: Uuid) -> Result<u64, StoreError>;

    /// Applies several partial updates. Sequential, not transactional: a
    /// failure leaves earlier updates in place.
    async fn batch_update(&self, updates: &[(Uuid, RowPatch)]) -> Result<(), StoreError>;
}
