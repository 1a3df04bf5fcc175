//! In-memory session registry.
//!
//! A session is the explicit per-user request context: created at login,
//! looked up on every plan request via the bearer token, destroyed at logout.
//! A user holds at most one live session, so the map is bounded by the user
//! count. There is no ambient login state anywhere else in the service.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use axum::http::{header, HeaderMap};
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::errors::AppError;

#[derive(Debug, Clone)]
pub struct Session {
    pub token: Uuid,
    pub user_id: Uuid,
    pub email: String,
    /// Remote auth token, needed for remote sign-out.
    pub access_token: String,
}

#[derive(Clone, Default)]
pub struct SessionStore {
    inner: Arc<RwLock<HashMap<Uuid, Session>>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a session for a freshly authenticated user and returns it.
    /// Any earlier session of the same user is evicted, so repeated logins
    /// never accumulate entries.
    pub fn create(&self, user: &AuthUser) -> Session {
        let session = Session {
            token: Uuid::new_v4(),
            user_id: user.id,
            email: user.email.clone(),
            access_token: user.access_token.clone(),
        };
        let mut sessions = self.inner.write().expect("session lock poisoned");
        sessions.retain(|_, s| s.user_id != user.id);
        sessions.insert(session.token, session.clone());
        tracing::info!("Session created for user {}", session.user_id);
        session
    }

    pub fn get(&self, token: Uuid) -> Option<Session> {
        self.inner
            .read()
            .expect("session lock poisoned")
            .get(&token)
            .cloned()
    }

    /// Destroys a session, returning it if it existed.
    pub fn destroy(&self, token: Uuid) -> Option<Session> {
        let session = self
            .inner
            .write()
            .expect("session lock poisoned")
            .remove(&token);
        if let Some(s) = &session {
            tracing::info!("Session destroyed for user {}", s.user_id);
        }
        session
    }

    pub fn len(&self) -> usize {
        self.inner.read().expect("session lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Extracts the session token from an `Authorization: Bearer <uuid>` header.
pub fn bearer_token(headers: &HeaderMap) -> Option<Uuid> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .and_then(|v| v.trim().parse::<Uuid>().ok())
}

/// Resolves the request's session or fails with 401.
pub fn require_session(sessions: &SessionStore, headers: &HeaderMap) -> Result<Session, AppError> {
    bearer_token(headers)
        .and_then(|token| sessions.get(token))
        .ok_or(AppError::Unauthorized)
}
