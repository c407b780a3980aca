//! Stripe webhook receiver.

use axum::{Json, body::Bytes, extract::State, http::HeaderMap};
use secrecy::ExposeSecret;
use tracing::{info, instrument};

use crate::error::ApiError;
use crate::state::AppState;
use crate::stripe::webhook::{StripeEvent, verify_signature};

/// `POST /api/webhooks/stripe`
///
/// Subscription changes are acknowledged and logged; no local subscription
/// record is kept yet.
#[instrument(skip_all)]
pub async fn stripe(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<serde_json::Value>, ApiError> {
    let signature = headers
        .get("stripe-signature")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();

    let payload = std::str::from_utf8(&body)
        .map_err(|_| ApiError::BadRequest("Failed to read body".to_string()))?;

    verify_signature(
        payload,
        signature,
        state.config().stripe.webhook_secret.expose_secret(),
        chrono::Utc::now().timestamp(),
    )
    .map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let event: StripeEvent = serde_json::from_str(payload)
        .map_err(|_| ApiError::BadRequest("Invalid event payload".to_string()))?;

    if event.is_subscription_change() {
        info!(event_type = %event.event_type, "Stripe webhook processed");
    } else {
        info!(event_type = %event.event_type, "Stripe webhook: unhandled event type");
    }

    Ok(Json(serde_json::json!({ "received": true })))
}
