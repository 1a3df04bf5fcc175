mod auth;
mod config;
mod errors;
mod llm_client;
mod models;
mod parser;
mod plan;
mod routes;
mod state;
mod storage;
mod webhook;

use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::auth::sessions::SessionStore;
use crate::auth::AuthClient;
use crate::config::{Config, StorageConfig};
use crate::llm_client::LlmClient;
use crate::routes::build_router;
use crate::state::AppState;
use crate::storage::rest::RestStore;
use crate::storage::sheets::SheetStore;
use crate::storage::PlanStore;
use crate::webhook::WebhookClient;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails fast on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_CRATE_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Hantel API v{}", env!("CARGO_PKG_VERSION"));

    // Initialize the configured plan storage backend
    let store = build_store(&config.storage);

    // Initialize the external auth service client
    let auth = AuthClient::new(config.auth_base_url.clone(), config.auth_api_key.clone());
    info!("Auth client initialized");

    // Initialize LLM client
    let llm = LlmClient::new(config.anthropic_api_key.clone());
    info!("LLM client initialized (model: {})", llm_client::MODEL);

    // Optional outbound webhook target for the contact form
    let webhook = config.webhook_url.clone().map(WebhookClient::new);
    if webhook.is_some() {
        info!("Webhook client initialized");
    }

    // Build app state
    let state = AppState {
        store,
        auth,
        llm,
        sessions: SessionStore::new(),
        webhook,
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()); // TODO: tighten CORS in production

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

fn build_store(storage: &StorageConfig) -> Arc<dyn PlanStore> {
    match storage {
        StorageConfig::Rest { base_url, token } => {
            info!("Plan storage: REST table backend at {base_url}");
            Arc::new(RestStore::new(base_url.clone(), token.clone()))
        }
        StorageConfig::Sheets {
            base_url,
            api_key,
            spreadsheet_id,
            sheet_name,
            sheet_gid,
        } => {
            info!("Plan storage: spreadsheet backend, sheet '{sheet_name}'");
            Arc::new(SheetStore::new(
                base_url.clone(),
                api_key.clone(),
                spreadsheet_id.clone(),
                sheet_name.clone(),
                *sheet_gid,
            ))
        }
    }
}
