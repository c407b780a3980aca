//! Client for the billing API.
//!
//! Reads the plan catalog and creates hosted checkout sessions. Catalog
//! reads degrade to empty lists so the pricing page always renders.

use std::sync::Arc;

use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::{instrument, warn};

use astrolabe_core::{CheckoutSessionRequest, CheckoutSessionResponse, Price, PriceId, Product};

/// Errors from billing API calls.
#[derive(Debug, Error)]
pub enum BillingError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The API answered with a non-success status.
    #[error("billing API returned {status}: {body}")]
    Status { status: StatusCode, body: String },

    /// A checkout session was created but no redirect URL came back.
    #[error("checkout session has no url")]
    MissingUrl,
}

/// Client for the billing API.
#[derive(Clone)]
pub struct BillingClient {
    inner: Arc<BillingClientInner>,
}

struct BillingClientInner {
    client: reqwest::Client,
    base_url: String,
}

impl BillingClient {
    /// Create a client for the API at `base_url`.
    #[must_use]
    pub fn new(base_url: &str) -> Self {
        Self {
            inner: Arc::new(BillingClientInner {
                client: reqwest::Client::new(),
                base_url: base_url.trim_end_matches('/').to_string(),
            }),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.inner.base_url)
    }

    async fn get_list<T: DeserializeOwned>(&self, path: &str) -> Result<Vec<T>, BillingError> {
        let response = self.inner.client.get(self.url(path)).send().await?;
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(BillingError::Status { status, body });
        }

        Ok(response.json().await?)
    }

    /// Fetch active products.
    ///
    /// # Errors
    ///
    /// Returns `BillingError` on transport failure, non-success status or an
    /// undecodable body.
    pub async fn fetch_products(&self) -> Result<Vec<Product>, BillingError> {
        self.get_list("/api/stripe/products").await
    }

    /// Fetch active recurring prices.
    ///
    /// # Errors
    ///
    /// Returns `BillingError` on transport failure, non-success status or an
    /// undecodable body.
    pub async fn fetch_prices(&self) -> Result<Vec<Price>, BillingError> {
        self.get_list("/api/stripe/prices").await
    }

    /// Fetch products and prices concurrently.
    ///
    /// Either list falls back to empty on failure.
    #[instrument(skip(self))]
    pub async fn catalog(&self) -> (Vec<Product>, Vec<Price>) {
        let (products, prices) = tokio::join!(self.fetch_products(), self.fetch_prices());

        let products = products.unwrap_or_else(|e| {
            warn!(error = %e, "Failed to load products");
            Vec::new()
        });
        let prices = prices.unwrap_or_else(|e| {
            warn!(error = %e, "Failed to load prices");
            Vec::new()
        });

        (products, prices)
    }

    /// Create a hosted checkout session and return its URL.
    ///
    /// `access_token` is forwarded as a bearer token when present.
    ///
    /// # Errors
    ///
    /// Returns `BillingError` if the request fails, the API refuses it, or
    /// the response carries no URL.
    #[instrument(skip(self, access_token))]
    pub async fn create_checkout_session(
        &self,
        price_id: &PriceId,
        access_token: Option<&str>,
    ) -> Result<String, BillingError> {
        let mut request = self
            .inner
            .client
            .post(self.url("/api/stripe/checkout/sessions"))
            .json(&CheckoutSessionRequest {
                price_id: price_id.clone(),
            });

        if let Some(token) = access_token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(BillingError::Status { status, body });
        }

        let body: CheckoutSessionResponse = response.json().await?;
        body.url
            .filter(|u| !u.is_empty())
            .ok_or(BillingError::MissingUrl)
    }
}
