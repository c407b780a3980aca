//! Stripe REST client.
//!
//! Lists the active catalog and creates subscription checkout sessions.
//! Catalog lists are cached for 5 minutes using `moka`.

mod types;
pub mod webhook;

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::{debug, instrument, warn};

use astrolabe_core::{Price, PriceId, Product, UserId};

use crate::config::StripeConfig;
use types::{StripeCheckoutSession, StripeList, StripePrice, StripeProduct};

/// Free trial granted on every checkout session.
pub const CHECKOUT_TRIAL_DAYS: u32 = 14;

/// Errors from the Stripe API.
#[derive(Debug, Error)]
pub enum StripeError {
    /// Transport or decoding failure.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Stripe answered with a 4xx/5xx status.
    #[error("Stripe {path} failed: {status} {body}")]
    Status {
        path: String,
        status: u16,
        body: String,
    },
}

#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq)]
enum CacheKey {
    Products,
    Prices,
}

#[derive(Debug, Clone)]
enum CacheValue {
    Products(Arc<Vec<Product>>),
    Prices(Arc<Vec<Price>>),
}

/// Return URLs for a checkout session.
#[derive(Debug, Clone)]
pub struct CheckoutUrls {
    pub success: String,
    pub cancel: String,
}

/// Client for the Stripe REST API.
#[derive(Clone)]
pub struct StripeClient {
    inner: Arc<StripeClientInner>,
}

struct StripeClientInner {
    client: reqwest::Client,
    api_base: String,
    secret_key: SecretString,
    cache: Cache<CacheKey, CacheValue>,
}

impl StripeClient {
    /// Create a new Stripe client.
    #[must_use]
    pub fn new(config: &StripeConfig) -> Self {
        let cache = Cache::builder()
            .max_capacity(16)
            .time_to_live(Duration::from_secs(300)) // 5 minutes
            .build();

        Self {
            inner: Arc::new(StripeClientInner {
                client: reqwest::Client::new(),
                api_base: config.api_base.clone(),
                secret_key: config.secret_key.clone(),
                cache,
            }),
        }
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{path}", self.inner.api_base)
    }

    async fn read<T: DeserializeOwned>(
        path: &str,
        response: reqwest::Response,
    ) -> Result<T, StripeError> {
        let status = response.status();
        if status.is_client_error() || status.is_server_error() {
            let body = response.text().await.unwrap_or_default();
            warn!(path, status = status.as_u16(), "Stripe request failed");
            return Err(StripeError::Status {
                path: path.to_string(),
                status: status.as_u16(),
                body,
            });
        }
        Ok(response.json().await?)
    }

    async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &[(&str, &str)],
    ) -> Result<T, StripeError> {
        let response = self
            .inner
            .client
            .get(self.endpoint(path))
            .bearer_auth(self.inner.secret_key.expose_secret())
            .query(params)
            .send()
            .await?;
        Self::read(path, response).await
    }

    async fn post_form<T: DeserializeOwned>(
        &self,
        path: &str,
        form: &[(&str, &str)],
    ) -> Result<T, StripeError> {
        let response = self
            .inner
            .client
            .post(self.endpoint(path))
            .bearer_auth(self.inner.secret_key.expose_secret())
            .form(form)
            .send()
            .await?;
        Self::read(path, response).await
    }

    // =========================================================================
    // Catalog
    // =========================================================================

    /// List active products with their default price id.
    ///
    /// # Errors
    ///
    /// Returns `StripeError` if the request fails.
    #[instrument(skip(self))]
    pub async fn list_products(&self) -> Result<Arc<Vec<Product>>, StripeError> {
        if let Some(CacheValue::Products(products)) =
            self.inner.cache.get(&CacheKey::Products).await
        {
            debug!("Cache hit for products");
            return Ok(products);
        }

        let list: StripeList<StripeProduct> = self
            .get(
                "products",
                &[
                    ("active", "true"),
                    ("expand[]", "data.default_price"),
                    ("limit", "100"),
                ],
            )
            .await?;
        let products: Arc<Vec<Product>> =
            Arc::new(list.data.into_iter().map(Product::from).collect());

        self.inner
            .cache
            .insert(CacheKey::Products, CacheValue::Products(products.clone()))
            .await;
        Ok(products)
    }

    /// List active recurring prices.
    ///
    /// # Errors
    ///
    /// Returns `StripeError` if the request fails.
    #[instrument(skip(self))]
    pub async fn list_prices(&self) -> Result<Arc<Vec<Price>>, StripeError> {
        if let Some(CacheValue::Prices(prices)) = self.inner.cache.get(&CacheKey::Prices).await {
            debug!("Cache hit for prices");
            return Ok(prices);
        }

        let list: StripeList<StripePrice> = self
            .get(
                "prices",
                &[
                    ("active", "true"),
                    ("type", "recurring"),
                    ("expand[]", "data.product"),
                    ("limit", "100"),
                ],
            )
            .await?;
        let prices: Arc<Vec<Price>> = Arc::new(list.data.into_iter().map(Price::from).collect());

        self.inner
            .cache
            .insert(CacheKey::Prices, CacheValue::Prices(prices.clone()))
            .await;
        Ok(prices)
    }

    // =========================================================================
    // Checkout
    // =========================================================================

    /// Create a subscription checkout session for one price.
    ///
    /// Returns the hosted checkout URL, if Stripe provided one.
    ///
    /// # Errors
    ///
    /// Returns `StripeError` if the request fails.
    #[instrument(skip(self, urls))]
    pub async fn create_checkout_session(
        &self,
        price_id: &PriceId,
        user_id: &UserId,
        urls: &CheckoutUrls,
    ) -> Result<Option<String>, StripeError> {
        let trial_days = CHECKOUT_TRIAL_DAYS.to_string();
        let session: StripeCheckoutSession = self
            .post_form(
                "checkout/sessions",
                &[
                    ("payment_method_types[]", "card"),
                    ("line_items[0][price]", price_id.as_str()),
                    ("line_items[0][quantity]", "1"),
                    ("mode", "subscription"),
                    ("success_url", &urls.success),
                    ("cancel_url", &urls.cancel),
                    ("client_reference_id", user_id.as_str()),
                    ("allow_promotion_codes", "true"),
                    ("subscription_data[trial_period_days]", &trial_days),
                ],
            )
            .await?;

        debug!(session_id = %session.id, "Checkout session created");
        Ok(session.url)
    }
}
