//! Catalog and checkout endpoints.

use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
};
use tracing::instrument;

use astrolabe_core::{CheckoutSessionRequest, CheckoutSessionResponse, Price, Product};

use crate::auth::AuthenticatedUser;
use crate::error::ApiError;
use crate::state::AppState;

/// `GET /api/stripe/products`
#[instrument(skip(state))]
pub async fn list_products(State(state): State<AppState>) -> Result<Json<Vec<Product>>, ApiError> {
    let products = state.stripe().list_products().await?;
    Ok(Json(Vec::clone(&products)))
}

/// `GET /api/stripe/prices`
#[instrument(skip(state))]
pub async fn list_prices(State(state): State<AppState>) -> Result<Json<Vec<Price>>, ApiError> {
    let prices = state.stripe().list_prices().await?;
    Ok(Json(Vec::clone(&prices)))
}

/// `POST /api/stripe/checkout/sessions`
///
/// Starts a subscription checkout for the caller and returns the hosted
/// checkout URL.
#[instrument(skip(state, body), fields(user_id = %user.user_id))]
pub async fn create_checkout_session(
    user: AuthenticatedUser,
    State(state): State<AppState>,
    body: Result<Json<CheckoutSessionRequest>, JsonRejection>,
) -> Result<Json<CheckoutSessionResponse>, ApiError> {
    let Ok(Json(request)) = body else {
        return Err(ApiError::BadRequest("Invalid request body".to_string()));
    };

    let url = state
        .stripe()
        .create_checkout_session(&request.price_id, &user.user_id, &state.checkout_urls())
        .await?;

    Ok(Json(CheckoutSessionResponse { url }))
}
