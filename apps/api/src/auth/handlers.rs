//! Axum route handlers for the auth API.

use axum::{extract::State, http::HeaderMap, http::StatusCode, Json};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::sessions::bearer_token;
use crate::errors::AppError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: Uuid,
    pub user_id: Uuid,
    pub email: String,
}

#[derive(Debug, Serialize)]
pub struct SignupResponse {
    pub user_id: Uuid,
    pub email: String,
}

#[derive(Debug, Deserialize)]
pub struct ResetRequest {
    pub email: String,
}

fn require_credentials(email: &str, password: &str) -> Result<(), AppError> {
    if email.trim().is_empty() || password.is_empty() {
        return Err(AppError::Validation(
            "email and password are required".to_string(),
        ));
    }
    Ok(())
}

/// POST /api/v1/auth/login
pub async fn handle_login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, AppError> {
    require_credentials(&request.email, &request.password)?;

    let user = state.auth.sign_in(&request.email, &request.password).await?;
    let session = state.sessions.create(&user);

    Ok(Json(LoginResponse {
        token: session.token,
        user_id: session.user_id,
        email: session.email,
    }))
}

/// POST /api/v1/auth/signup
pub async fn handle_signup(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> Result<(StatusCode, Json<SignupResponse>), AppError> {
    require_credentials(&request.email, &request.password)?;

    let user = state.auth.sign_up(&request.email, &request.password).await?;

    Ok((
        StatusCode::CREATED,
        Json(SignupResponse {
            user_id: user.id,
            email: user.email,
        }),
    ))
}

/// POST /api/v1/auth/logout
///
/// Destroys the local session first; the remote sign-out is best-effort and
/// only logged on failure, since the local identity is already gone.
pub async fn handle_logout(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<StatusCode, AppError> {
    let token = bearer_token(&headers).ok_or(AppError::Unauthorized)?;
    let session = state.sessions.destroy(token).ok_or(AppError::Unauthorized)?;

    if !session.access_token.is_empty() {
        if let Err(e) = state.auth.sign_out(&session.access_token).await {
            tracing::warn!("Remote sign-out failed for user {}: {e}", session.user_id);
        }
    }

    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/v1/auth/reset
pub async fn handle_reset_password(
    State(state): State<AppState>,
    Json(request): Json<ResetRequest>,
) -> Result<StatusCode, AppError> {
    if request.email.trim().is_empty() {
        return Err(AppError::Validation("email is required".to_string()));
    }
    state.auth.reset_password(&request.email).await?;
    Ok(StatusCode::ACCEPTED)
}
