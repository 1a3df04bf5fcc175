pub mod health;

use axum::{
    routing::{get, patch, post},
    Router,
};

use crate::auth::handlers as auth_handlers;
use crate::plan::handlers as plan_handlers;
use crate::state::AppState;
use crate::webhook;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Auth API
        .route("/api/v1/auth/login", post(auth_handlers::handle_login))
        .route("/api/v1/auth/signup", post(auth_handlers::handle_signup))
        .route("/api/v1/auth/logout", post(auth_handlers::handle_logout))
        .route(
            "/api/v1/auth/reset",
            post(auth_handlers::handle_reset_password),
        )
        // Plan API
        .route("/api/v1/plan", get(plan_handlers::handle_get_plan))
        .route("/api/v1/plan/rows", post(plan_handlers::handle_add_set))
        .route(
            "/api/v1/plan/rows/:id",
            patch(plan_handlers::handle_update_row).delete(plan_handlers::handle_delete_row),
        )
        .route(
            "/api/v1/plan/rows/:id/complete",
            post(plan_handlers::handle_complete_set),
        )
        .route(
            "/api/v1/plan/exercise",
            post(plan_handlers::handle_add_exercise)
                .delete(plan_handlers::handle_delete_exercise),
        )
        .route(
            "/api/v1/plan/workout",
            post(plan_handlers::handle_add_workout).delete(plan_handlers::handle_delete_workout),
        )
        .route(
            "/api/v1/plan/workout/reset",
            post(plan_handlers::handle_reset_workout),
        )
        .route("/api/v1/plan/generate", post(plan_handlers::handle_generate))
        .route(
            "/api/v1/plan/export.csv",
            get(plan_handlers::handle_export_csv),
        )
        // Contact form
        .route("/api/v1/contact", post(webhook::handle_contact))
        .with_state(state)
}
