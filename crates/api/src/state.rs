//! Application state shared across handlers.

use std::sync::Arc;

use crate::auth::TokenVerifier;
use crate::config::ApiConfig;
use crate::stripe::{CheckoutUrls, StripeClient};

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: ApiConfig,
    stripe: StripeClient,
    verifier: TokenVerifier,
}

impl AppState {
    #[must_use]
    pub fn new(config: ApiConfig) -> Self {
        let stripe = StripeClient::new(&config.stripe);
        let verifier = TokenVerifier::new(&config.supabase_url);
        Self {
            inner: Arc::new(AppStateInner {
                config,
                stripe,
                verifier,
            }),
        }
    }

    #[must_use]
    pub fn config(&self) -> &ApiConfig {
        &self.inner.config
    }

    #[must_use]
    pub fn stripe(&self) -> &StripeClient {
        &self.inner.stripe
    }

    #[must_use]
    pub fn verifier(&self) -> &TokenVerifier {
        &self.inner.verifier
    }

    /// Checkout return URLs pointing back at the web app.
    #[must_use]
    pub fn checkout_urls(&self) -> CheckoutUrls {
        CheckoutUrls {
            success: self.inner.config.checkout_success_url(),
            cancel: self.inner.config.checkout_cancel_url(),
        }
    }
}
