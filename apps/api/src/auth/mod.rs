//! Client for the external email/password authentication service.
//!
//! The service is an opaque HTTP collaborator yielding an opaque user id and
//! access token; nothing is reimplemented here. Authentication failures are
//! terminal: surfaced to the user, never retried.

use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::errors::AppError;

pub mod handlers;
pub mod sessions;

const HTTP_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Auth service error (status {status}): {message}")]
    Api { status: u16, message: String },
}

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::InvalidCredentials => AppError::Unauthorized,
            other => AppError::Auth(other.to_string()),
        }
    }
}

/// Identity returned by the auth service after sign-in or sign-up.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthUser {
    pub id: Uuid,
    pub email: String,
    /// Remote access token, kept only to pass back on sign-out.
    #[serde(default)]
    pub access_token: String,
}

#[derive(Debug, Serialize)]
struct Credentials<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    user: RemoteUser,
}

#[derive(Debug, Deserialize)]
struct RemoteUser {
    id: Uuid,
    email: String,
}

#[derive(Clone)]
pub struct AuthClient {
    client: Client,
    base_url: String,
    api_key: String,
}

impl AuthClient {
    pub fn new(base_url: String, api_key: String) -> Self {
        Self {
            client: Client::builder()
                .timeout(std::time::Duration::from_secs(HTTP_TIMEOUT_SECS))
                .build()
                .expect("Failed to build HTTP client"),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
        }
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{path}", self.base_url)
    }

    pub async fn sign_in(&self, email: &str, password: &str) -> Result<AuthUser, AuthError> {
        let response = self
            .client
            .post(self.endpoint("token"))
            .query(&[("grant_type", "password")])
            .header("apikey", &self.api_key)
            .json(&Credentials { email, password })
            .send()
            .await?;

        match response.status() {
            StatusCode::BAD_REQUEST | StatusCode::UNAUTHORIZED => {
                Err(AuthError::InvalidCredentials)
            }
            status if status.is_success() => {
                let token: TokenResponse = response.json().await?;
                Ok(AuthUser {
                    id: token.user.id,
                    email: token.user.email,
                    access_token: token.access_token,
                })
            }
            status => Err(AuthError::Api {
                status: status.as_u16(),
                message: response.text().await.unwrap_or_default(),
            }),
        }
    }

    pub async fn sign_up(&self, email: &str, password: &str) -> Result<AuthUser, AuthError> {
        let response = self
            .client
            .post(self.endpoint("signup"))
            .header("apikey", &self.api_key)
            .json(&Credentials { email, password })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(AuthError::Api {
                status: status.as_u16(),
                message: response.text().await.unwrap_or_default(),
            });
        }
        let user: RemoteUser = response.json().await?;
        Ok(AuthUser {
            id: user.id,
            email: user.email,
            access_token: String::new(),
        })
    }

    /// Triggers a password-reset email. The service responds identically for
    /// known and unknown addresses, so there is nothing to report back.
    pub async fn reset_password(&self, email: &str) -> Result<(), AuthError> {
        let response = self
            .client
            .post(self.endpoint("recover"))
            .header("apikey", &self.api_key)
            .json(&serde_json::json!({ "email": email }))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(AuthError::Api {
                status: status.as_u16(),
                message: response.text().await.unwrap_or_default(),
            });
        }
        Ok(())
    }

    pub async fn sign_out(&self, access_token: &str) -> Result<(), AuthError> {
        let response = self
            .client
            .post(self.endpoint("logout"))
            .header("apikey", &self.api_key)
            .bearer_auth(access_token)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(AuthError::Api {
                status: status.as_u16(),
                message: response.text().await.unwrap_or_default(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_joins_without_double_slash() {
        let auth = AuthClient::new("https://auth.example.com/v1/".to_string(), "k".to_string());
        assert_eq!(auth.endpoint("token"), "https://auth.example.com/v1/token");
    }

    #[test]
    fn test_invalid_credentials_maps_to_unauthorized() {
        let app_err: AppError = AuthError::InvalidCredentials.into();
        assert!(matches!(app_err, AppError::Unauthorized));
    }

    #[test]
    fn test_api_error_maps_to_auth_error() {
        let app_err: AppError = AuthError::Api {
            status: 500,
            message: "boom".to_string(),
        }
        .into();
        assert!(matches!(app_err, AppError::Auth(_)));
    }

    #[test]
    fn test_token_response_deserializes() {
        let json = serde_json::json!({
            "access_token": "opaque-jwt",
            "token_type": "bearer",
            "user": { "id": "7f8a6f2e-52fc-4a70-9257-0f5cbf66ed93", "email": "a@b.de" }
        });
        let token: TokenResponse = serde_json::from_value(json).unwrap();
        assert_eq!(token.user.email, "a@b.de");
        assert_eq!(token.access_token, "opaque-jwt");
    }
}
