//! Outbound webhook notifications plus the contact-form endpoint feeding it.
//!
//! The target receives a flat key/value JSON payload. Delivery is a single
//! attempt with a fixed 10 second timeout; a failed delivery is surfaced to
//! the caller and never retried.

use std::collections::BTreeMap;

use axum::{extract::State, http::StatusCode, Json};
use reqwest::Client;
use serde::Deserialize;

use crate::errors::AppError;
use crate::state::AppState;

const WEBHOOK_TIMEOUT_SECS: u64 = 10;

#[derive(Clone)]
pub struct WebhookClient {
    client: Client,
    url: String,
}

impl WebhookClient {
    pub fn new(url: String) -> Self {
        Self {
            client: Client::builder()
                .timeout(std::time::Duration::from_secs(WEBHOOK_TIMEOUT_SECS))
                .build()
                .expect("Failed to build HTTP client"),
            url,
        }
    }

    pub async fn notify(&self, payload: &BTreeMap<String, String>) -> Result<(), AppError> {
        let response = self
            .client
            .post(&self.url)
            .json(payload)
            .send()
            .await
            .map_err(|e| AppError::Webhook(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::Webhook(format!(
                "webhook target responded with status {status}"
            )));
        }
        tracing::info!("Webhook notification delivered");
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
pub struct ContactRequest {
    pub name: String,
    pub email: String,
    pub message: String,
}

/// Builds the flat payload sent to the webhook target. Pure and separate
/// from the handler so the shape is testable.
pub fn contact_payload(request: &ContactRequest) -> BTreeMap<String, String> {
    BTreeMap::from([
        ("form".to_string(), "contact".to_string()),
        ("name".to_string(), request.name.trim().to_string()),
        ("email".to_string(), request.email.trim().to_string()),
        ("message".to_string(), request.message.trim().to_string()),
        (
            "submitted_at".to_string(),
            chrono::Utc::now().to_rfc3339(),
        ),
    ])
}

/// POST /api/v1/contact
///
/// Required fields are checked before any remote call; an invalid submission
/// never reaches the webhook target.
pub async fn handle_contact(
    State(state): State<AppState>,
    Json(request): Json<ContactRequest>,
) -> Result<StatusCode, AppError> {
    for (field, value) in [
        ("name", &request.name),
        ("email", &request.email),
        ("message", &request.message),
    ] {
        if value.trim().is_empty() {
            return Err(AppError::Validation(format!("{field} is required")));
        }
    }

    let webhook = state
        .webhook
        .as_ref()
        .ok_or_else(|| AppError::Webhook("no webhook target configured".to_string()))?;

    webhook.notify(&contact_payload(&request)).await?;
    Ok(StatusCode::ACCEPTED)
}
