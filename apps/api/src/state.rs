use std::sync::Arc;

use crate::auth::sessions::SessionStore;
use crate::auth::AuthClient;
use crate::llm_client::LlmClient;
use crate::storage::PlanStore;
use crate::webhook::WebhookClient;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// Plan storage behind the backend-neutral contract; the concrete
    /// implementation is chosen from config at startup.
    pub store: Arc<dyn PlanStore>,
    pub auth: AuthClient,
    pub llm: LlmClient,
    /// Live login sessions, created at login and destroyed at logout.
    pub sessions: SessionStore,
    /// Absent when no webhook target is configured.
    pub webhook: Option<WebhookClient>,
}
