//! Axum route handlers for the plan API. Every handler resolves the caller's
//! session first; rows are always addressed through the session user's own
//! row set, so one user can never touch another user's plan.

use axum::{
    extract::{Path, Query, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::sessions::require_session;
use crate::errors::AppError;
use crate::models::plan::{NewPlanRow, PlanRow, RowPatch, DEFAULT_REPS, DEFAULT_SETS, MAX_SETS};
use crate::plan::export::{rows_to_csv, CSV_CONTENT_TYPE};
use crate::plan::generate::{generate_and_activate, GeneratePlanRequest, GeneratePlanResponse};
use crate::plan::{ensure_editable, next_set_number, renumber_sets, validate_patch};
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct PlanResponse {
    pub rows: Vec<PlanRow>,
}

#[derive(Debug, Deserialize)]
pub struct AddSetRequest {
    pub workout: String,
    pub exercise: String,
}

#[derive(Debug, Deserialize)]
pub struct ExerciseSpec {
    pub exercise: String,
    pub sets: Option<u32>,
    pub weight_kg: Option<f64>,
    pub reps: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct AddExerciseRequest {
    pub workout: String,
    #[serde(flatten)]
    pub spec: ExerciseSpec,
}

#[derive(Debug, Deserialize)]
pub struct AddWorkoutRequest {
    pub workout: String,
    pub exercises: Vec<ExerciseSpec>,
}

#[derive(Debug, Deserialize)]
pub struct CompleteRequest {
    pub rir: Option<i32>,
}

#[derive(Debug, Deserialize)]
pub struct ExerciseQuery {
    pub workout: String,
    pub exercise: String,
}

#[derive(Debug, Deserialize)]
pub struct WorkoutQuery {
    pub workout: String,
}

#[derive(Debug, Serialize)]
pub struct DeletedResponse {
    pub deleted: usize,
}

#[derive(Debug, Serialize)]
pub struct ResetResponse {
    pub reset: usize,
}

/// GET /api/v1/plan
pub async fn handle_get_plan(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<PlanResponse>, AppError> {
    let session = require_session(&state.sessions, &headers)?;
    let rows = state.store.list(session.user_id).await?;
    Ok(Json(PlanResponse { rows }))
}

/// POST /api/v1/plan/rows
///
/// Adds one set to an existing (workout, exercise) group, copying weight and
/// reps from the group's last set. A group with no sets yet starts at set 1
/// with defaults.
pub async fn handle_add_set(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<AddSetRequest>,
) -> Result<(StatusCode, Json<PlanRow>), AppError> {
    let session = require_session(&state.sessions, &headers)?;
    if request.workout.trim().is_empty() || request.exercise.trim().is_empty() {
        return Err(AppError::Validation(
            "workout and exercise are required".to_string(),
        ));
    }

    let rows = state.store.list(session.user_id).await?;
    let template = rows
        .iter()
        .filter(|r| r.workout == request.workout && r.exercise == request.exercise)
        .max_by_key(|r| r.set_number);

    let new_row = NewPlanRow {
        user_id: session.user_id,
        date: template.map(|t| t.date).unwrap_or_else(|| Utc::now().date_naive()),
        workout: request.workout.clone(),
        exercise: request.exercise.clone(),
        set_number: next_set_number(&rows, &request.workout, &request.exercise),
        weight_kg: template.map(|t| t.weight_kg).unwrap_or(0.0),
        reps: template
            .map(|t| t.reps.clone())
            .unwrap_or_else(|| DEFAULT_REPS.to_string()),
        completed: false,
        coach_message: template
            .map(|t| t.coach_message.clone())
            .unwrap_or_default(),
        rir: None,
    };

    let mut stored = state.store.insert(&[new_row]).await?;
    let row = stored
        .pop()
        .ok_or_else(|| AppError::Internal(anyhow::anyhow!("insert returned no row")))?;
    Ok((StatusCode::CREATED, Json(row)))
}

fn expand_exercise(
    user_id: Uuid,
    workout: &str,
    spec: &ExerciseSpec,
    start_set: i32,
) -> Result<Vec<NewPlanRow>, AppError> {
    if spec.exercise.trim().is_empty() {
        return Err(AppError::Validation("exercise name is required".to_string()));
    }
    let sets = spec.sets.unwrap_or(DEFAULT_SETS);
    if sets == 0 || sets > MAX_SETS {
        return Err(AppError::Validation(format!(
            "sets must be between 1 and {MAX_SETS}"
        )));
    }
    let weight_kg = spec.weight_kg.unwrap_or(0.0);
    if weight_kg < 0.0 || !weight_kg.is_finite() {
        return Err(AppError::Validation(
            "weight_kg must be a non-negative number".to_string(),
        ));
    }
    let reps = spec.reps.clone().unwrap_or_else(|| DEFAULT_REPS.to_string());
    let date = Utc::now().date_naive();

    Ok((0..sets as i32)
        .map(|offset| NewPlanRow {
            user_id,
            date,
            workout: workout.to_string(),
            exercise: spec.exercise.trim().to_string(),
            set_number: start_set + offset,
            weight_kg,
            reps: reps.clone(),
            completed: false,
            coach_message: String::new(),
            rir: None,
        })
        .collect())
}

/// POST /api/v1/plan/exercise
pub async fn handle_add_exercise(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<AddExerciseRequest>,
) -> Result<(StatusCode, Json<PlanResponse>), AppError> {
    let session = require_session(&state.sessions, &headers)?;
    if request.workout.trim().is_empty() {
        return Err(AppError::Validation("workout is required".to_string()));
    }

    let existing = state.store.list(session.user_id).await?;
    let start = next_set_number(&existing, &request.workout, &request.spec.exercise);
    let rows = expand_exercise(session.user_id, &request.workout, &request.spec, start)?;
    let stored = state.store.insert(&rows).await?;
    Ok((StatusCode::CREATED, Json(PlanResponse { rows: stored })))
}

/// POST /api/v1/plan/workout
pub async fn handle_add_workout(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<AddWorkoutRequest>,
) -> Result<(StatusCode, Json<PlanResponse>), AppError> {
    let session = require_session(&state.sessions, &headers)?;
    if request.workout.trim().is_empty() {
        return Err(AppError::Validation("workout is required".to_string()));
    }
    if request.exercises.is_empty() {
        return Err(AppError::Validation(
            "at least one exercise is required".to_string(),
        ));
    }

    let mut rows = Vec::new();
    for spec in &request.exercises {
        rows.extend(expand_exercise(session.user_id, &request.workout, spec, 1)?);
    }
    let stored = state.store.insert(&rows).await?;
    Ok((StatusCode::CREATED, Json(PlanResponse { rows: stored })))
}

/// Looks up one of the session user's rows by id.
async fn find_owned_row(state: &AppState, user_id: Uuid, id: Uuid) -> Result<PlanRow, AppError> {
    let rows = state.store.list(user_id).await?;
    rows.into_iter()
        .find(|r| r.id == id)
        .ok_or_else(|| AppError::NotFound(format!("Row {id} not found")))
}

/// PATCH /api/v1/plan/rows/:id
pub async fn handle_update_row(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    headers: HeaderMap,
    Json(patch): Json<RowPatch>,
) -> Result<Json<PlanRow>, AppError> {
    let session = require_session(&state.sessions, &headers)?;
    validate_patch(&patch)?;

    let existing = find_owned_row(&state, session.user_id, id).await?;
    ensure_editable(&existing, &patch)?;

    let updated = state.store.update(id, &patch).await?;
    Ok(Json(updated))
}

/// POST /api/v1/plan/rows/:id/complete
pub async fn handle_complete_set(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    headers: HeaderMap,
    Json(request): Json<CompleteRequest>,
) -> Result<Json<PlanRow>, AppError> {
    let session = require_session(&state.sessions, &headers)?;
    if let Some(rir) = request.rir {
        if rir < 0 {
            return Err(AppError::Validation("rir must be >= 0".to_string()));
        }
    }

    // Idempotent: completing a completed set is a no-op.
    find_owned_row(&state, session.user_id, id).await?;
    let patch = RowPatch {
        completed: Some(true),
        rir: request.rir,
        ..Default::default()
    };
    let updated = state.store.update(id, &patch).await?;
    Ok(Json(updated))
}

/// DELETE /api/v1/plan/rows/:id
///
/// The surviving sets of the (workout, exercise) group are renumbered after
/// the delete so set numbers stay contiguous from 1.
pub async fn handle_delete_row(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    headers: HeaderMap,
) -> Result<StatusCode, AppError> {
    let session = require_session(&state.sessions, &headers)?;
    let rows = state.store.list(session.user_id).await?;
    let target = rows
        .iter()
        .find(|r| r.id == id)
        .cloned()
        .ok_or_else(|| AppError::NotFound(format!("Row {id} not found")))?;
    state.store.delete(id).await?;

    let remaining: Vec<PlanRow> = rows.into_iter().filter(|r| r.id != id).collect();
    let patches = renumber_sets(&remaining, &target.workout, &target.exercise);
    if !patches.is_empty() {
        state.store.batch_update(&patches).await?;
    }
    Ok(StatusCode::NO_CONTENT)
}

/// DELETE /api/v1/plan/exercise?workout=..&exercise=..
///
/// Removes every set of one exercise. Deletions run row by row; a failure
/// mid-way leaves the remaining sets in place.
pub async fn handle_delete_exercise(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<ExerciseQuery>,
) -> Result<Json<DeletedResponse>, AppError> {
    let session = require_session(&state.sessions, &headers)?;
    let rows = state.store.list(session.user_id).await?;
    let targets: Vec<Uuid> = rows
        .iter()
        .filter(|r| r.workout == query.workout && r.exercise == query.exercise)
        .map(|r| r.id)
        .collect();

    for id in &targets {
        state.store.delete(*id).await?;
    }
    Ok(Json(DeletedResponse {
        deleted: targets.len(),
    }))
}

/// DELETE /api/v1/plan/workout?workout=..
pub async fn handle_delete_workout(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<WorkoutQuery>,
) -> Result<Json<DeletedResponse>, AppError> {
    let session = require_session(&state.sessions, &headers)?;
    let rows = state.store.list(session.user_id).await?;
    let targets: Vec<Uuid> = rows
        .iter()
        .filter(|r| r.workout == query.workout)
        .map(|r| r.id)
        .collect();

    for id in &targets {
        state.store.delete(*id).await?;
    }
    Ok(Json(DeletedResponse {
        deleted: targets.len(),
    }))
}

/// POST /api/v1/plan/workout/reset
///
/// Clears the completed flag on every set of one workout so the session can
/// be trained again. Applied as a single batched update.
pub async fn handle_reset_workout(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<WorkoutQuery>,
) -> Result<Json<ResetResponse>, AppError> {
    let session = require_session(&state.sessions, &headers)?;
    let rows = state.store.list(session.user_id).await?;
    let updates: Vec<(Uuid, RowPatch)> = rows
        .iter()
        .filter(|r| r.workout == request.workout && r.completed)
        .map(|r| {
            (
                r.id,
                RowPatch {
                    completed: Some(false),
                    ..Default::default()
                },
            )
        })
        .collect();

    state.store.batch_update(&updates).await?;
    Ok(Json(ResetResponse {
        reset: updates.len(),
    }))
}

/// POST /api/v1/plan/generate
pub async fn handle_generate(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<GeneratePlanRequest>,
) -> Result<Json<GeneratePlanResponse>, AppError> {
    let session = require_session(&state.sessions, &headers)?;
    if request.goals.trim().is_empty() {
        return Err(AppError::Validation("goals cannot be empty".to_string()));
    }

    let response =
        generate_and_activate(state.store.as_ref(), &state.llm, session.user_id, &request).await?;
    Ok(Json(response))
}

/// GET /api/v1/plan/export.csv
pub async fn handle_export_csv(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    let session = require_session(&state.sessions, &headers)?;
    let rows = state.store.list(session.user_id).await?;
    let csv = rows_to_csv(&rows);
    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, CSV_CONTENT_TYPE),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"trainingsplan.csv\"",
            ),
        ],
        csv,
    )
        .into_response())
}
