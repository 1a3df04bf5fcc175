//! AI plan generation: prompt the coach model, parse its answer into rows,
//! and activate the result as the user's current plan.
//!
//! Activation is delete-all-then-insert-all with no transaction. A failure
//! between the two calls can leave the user with zero rows; the error is
//! surfaced and the user retries. When the parse yields zero rows the old
//! plan is left untouched and only the warnings are returned.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use crate::errors::AppError;
use crate::llm_client::prompts::{COACH_SYSTEM, PLAN_PROMPT_TEMPLATE};
use crate::llm_client::{ChatMessage, LlmClient};
use crate::models::plan::PlanRow;
use crate::parser::{parse_plan_text, ParseWarning, ParsedPlan};
use crate::storage::PlanStore;

const DEFAULT_DAYS_PER_WEEK: u8 = 3;

#[derive(Debug, Deserialize)]
pub struct GeneratePlanRequest {
    pub goals: String,
    pub experience: Option<String>,
    pub days_per_week: Option<u8>,
}

#[derive(Debug, Serialize)]
pub struct GeneratePlanResponse {
    /// False when parsing produced no rows and the old plan was kept.
    pub activated: bool,
    pub inserted: usize,
    pub rows: Vec<PlanRow>,
    pub warnings: Vec<ParseWarning>,
}

pub fn build_plan_prompt(request: &GeneratePlanRequest) -> String {
    PLAN_PROMPT_TEMPLATE
        .replace("{goals}", request.goals.trim())
        .replace(
            "{experience}",
            request
                .experience
                .as_deref()
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .unwrap_or("keine Angabe"),
        )
        .replace(
            "{days_per_week}",
            &request
                .days_per_week
                .unwrap_or(DEFAULT_DAYS_PER_WEEK)
                .to_string(),
        )
}

/// Full pipeline: LLM call, parse, replace the stored plan.
pub async fn generate_and_activate(
    store: &dyn PlanStore,
    llm: &LlmClient,
    user_id: Uuid,
    request: &GeneratePlanRequest,
) -> Result<GeneratePlanResponse, AppError> {
    let prompt = build_plan_prompt(request);
    let plan_text = llm
        .chat_text(&[ChatMessage::user(prompt)], COACH_SYSTEM)
        .await
        .map_err(|e| AppError::Llm(format!("Plan generation failed: {e}")))?;

    let parsed = parse_plan_text(&plan_text, user_id, Utc::now().date_naive());
    activate_plan(store, user_id, parsed).await
}

/// Replaces the user's stored plan with the parsed rows. When the parse
/// yields no rows the old plan is kept untouched and `activated` is false.
pub async fn activate_plan(
    store: &dyn PlanStore,
    user_id: Uuid,
    parsed: ParsedPlan,
) -> Result<GeneratePlanResponse, AppError> {
    if parsed.rows.is_empty() {
        warn!("Generated plan text produced no rows for user {user_id}; keeping old plan");
        return Ok(GeneratePlanResponse {
            activated: false,
            inserted: 0,
            rows: vec![],
            warnings: parsed.warnings,
        });
    }

    let removed = store.delete_all(user_id).await?;
    let stored = store.insert(&parsed.rows).await?;
    info!(
        "Activated new plan for user {user_id}: {} rows replaced by {}",
        removed,
        stored.len()
    );

    Ok(GeneratePlanResponse {
        activated: true,
        inserted: stored.len(),
        rows: stored,
        warnings: parsed.warnings,
    })
}
