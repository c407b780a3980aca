//! Bearer-token authentication.
//!
//! Tokens are not decoded locally. The identity service's `/auth/v1/user`
//! endpoint validates them and returns the owning user.

use axum::{extract::FromRequestParts, http::request::Parts};
use serde::Deserialize;
use tracing::{instrument, warn};

use astrolabe_core::UserId;

use crate::error::{ApiError, set_sentry_user};
use crate::state::AppState;

const MISSING_TOKEN_MESSAGE: &str = "Missing or invalid Authorization header";
const INVALID_TOKEN_MESSAGE: &str = "Invalid or expired token";

/// The verified caller of a protected endpoint.
///
/// Use as an extractor; requests without a valid bearer token are rejected
/// with 401 before the handler runs.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub user_id: UserId,
}

#[derive(Deserialize)]
struct IdentityUser {
    id: UserId,
}

/// Verifies access tokens against the identity service.
#[derive(Debug, Clone)]
pub struct TokenVerifier {
    client: reqwest::Client,
    user_url: String,
}

impl TokenVerifier {
    #[must_use]
    pub fn new(identity_url: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            user_url: format!("{}/auth/v1/user", identity_url.trim_end_matches('/')),
        }
    }

    /// Resolve the user owning `token`.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Unauthorized` if the identity service rejects the
    /// token, and `ApiError::Internal` for any other failure.
    #[instrument(skip_all)]
    pub async fn verify(&self, token: &str) -> Result<AuthenticatedUser, ApiError> {
        let response = self
            .client
            .get(&self.user_url)
            .bearer_auth(token)
            .header("apikey", token)
            .send()
            .await
            .map_err(|e| ApiError::Internal(format!("Identity check failed: {e}")))?;

        let status = response.status();
        if status == reqwest::StatusCode::UNAUTHORIZED {
            return Err(ApiError::Unauthorized(INVALID_TOKEN_MESSAGE.to_string()));
        }
        if status.is_client_error() || status.is_server_error() {
            let body = response.text().await.unwrap_or_default();
            warn!(status = status.as_u16(), "Identity service rejected token check");
            return Err(ApiError::Internal(format!(
                "Identity service error: {} {body}",
                status.as_u16()
            )));
        }

        let user: IdentityUser = response
            .json()
            .await
            .map_err(|e| ApiError::Internal(format!("Failed to parse user: {e}")))?;

        Ok(AuthenticatedUser { user_id: user.id })
    }
}

/// Pull the token out of `Authorization: Bearer <token>`.
fn bearer_token(parts: &Parts) -> Option<&str> {
    parts
        .headers
        .get(axum::http::header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .filter(|token| !token.is_empty())
}

impl FromRequestParts<AppState> for AuthenticatedUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts)
            .ok_or_else(|| ApiError::Unauthorized(MISSING_TOKEN_MESSAGE.to_string()))?;

        let user = state.verifier().verify(token).await?;
        set_sentry_user(&user.user_id);
        Ok(user)
    }
}
