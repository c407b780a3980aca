//! Stripe webhook signature verification.
//!
//! The `Stripe-Signature` header looks like `t=1700000000,v1=<hex>,v1=<hex>`.
//! A payload is genuine when one of the `v1` values equals
//! `HMAC-SHA256(secret, "{t}.{payload}")` and `t` is within five minutes of
//! now.

use hmac::{Hmac, Mac};
use serde::Deserialize;
use sha2::Sha256;
use thiserror::Error;

type HmacSha256 = Hmac<Sha256>;

/// Maximum age (either direction) of a signed payload, in seconds.
pub const SIGNATURE_TOLERANCE_SECS: u64 = 300;

/// Webhook verification failures.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum WebhookError {
    #[error("Missing timestamp")]
    MissingTimestamp,
    #[error("Missing signature")]
    MissingSignature,
    #[error("Invalid timestamp")]
    InvalidTimestamp,
    #[error("Invalid signature")]
    InvalidSignature,
}

/// A Stripe event envelope.
#[derive(Debug, Deserialize)]
pub struct StripeEvent {
    #[serde(rename = "type")]
    pub event_type: String,
    pub data: StripeEventData,
}

#[derive(Debug, Deserialize)]
pub struct StripeEventData {
    pub object: serde_json::Value,
}

impl StripeEvent {
    /// Whether this event changes a subscription's state.
    #[must_use]
    pub fn is_subscription_change(&self) -> bool {
        matches!(
            self.event_type.as_str(),
            "customer.subscription.updated" | "customer.subscription.deleted"
        )
    }
}

/// Verify a webhook payload against its `Stripe-Signature` header.
///
/// `now` is the current Unix time in seconds.
///
/// # Errors
///
/// Returns `WebhookError` if the header is malformed, the timestamp is out
/// of tolerance, or no signature matches.
pub fn verify_signature(
    payload: &str,
    header: &str,
    secret: &str,
    now: i64,
) -> Result<(), WebhookError> {
    let mut timestamp = None;
    let mut signatures = Vec::new();

    for part in header.split(',').map(str::trim) {
        if let Some(t) = part.strip_prefix("t=") {
            timestamp = Some(t);
        } else if let Some(v) = part.strip_prefix("v1=") {
            signatures.push(v);
        }
    }

    let timestamp = timestamp.ok_or(WebhookError::MissingTimestamp)?;
    if signatures.is_empty() {
        return Err(WebhookError::MissingSignature);
    }

    let ts: i64 = timestamp
        .parse()
        .map_err(|_| WebhookError::InvalidTimestamp)?;
    if ts.abs_diff(now) > SIGNATURE_TOLERANCE_SECS {
        return Err(WebhookError::InvalidSignature);
    }

    let mac = signed_payload_mac(secret, timestamp, payload)
        .ok_or(WebhookError::InvalidSignature)?;
    let matched = signatures.iter().any(|candidate| {
        hex::decode(candidate).is_ok_and(|bytes| mac.clone().verify_slice(&bytes).is_ok())
    });

    if matched {
        Ok(())
    } else {
        Err(WebhookError::InvalidSignature)
    }
}

/// HMAC-SHA256 keyed by `secret` over `"{timestamp}.{payload}"`.
fn signed_payload_mac(secret: &str, timestamp: &str, payload: &str) -> Option<HmacSha256> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).ok()?;
    mac.update(timestamp.as_bytes());
    mac.update(b".");
    mac.update(payload.as_bytes());
    Some(mac)
}
