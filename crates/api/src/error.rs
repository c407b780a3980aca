//! Unified error handling for the billing API.
//!
//! Every failure is returned as `{"error": "<message>"}`. Upstream and
//! internal faults are captured to Sentry and their details kept out of the
//! response body.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::stripe::StripeError;

/// Application-level error type for the billing API.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Missing or rejected credentials.
    #[error("{0}")]
    Unauthorized(String),

    /// Malformed request from the client.
    #[error("{0}")]
    BadRequest(String),

    /// Stripe request failed.
    #[error("Stripe error: {0}")]
    Stripe(#[from] StripeError),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Stripe(_) => StatusCode::BAD_GATEWAY,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();

        if status.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "API request error"
            );
        }

        let message = match &self {
            Self::Unauthorized(m) | Self::BadRequest(m) => m.clone(),
            Self::Stripe(_) => "External service error".to_string(),
            Self::Internal(_) => "Internal server error".to_string(),
        };

        (status, Json(serde_json::json!({ "error": message }))).into_response()
    }
}

/// Set the Sentry user context for the verified caller.
pub fn set_sentry_user(user_id: &impl ToString) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(user_id.to_string()),
            ..Default::default()
        }));
    });
}
