//! Application state shared across handlers.

use std::sync::Arc;

use crate::billing::BillingClient;
use crate::config::AppConfig;
use crate::identity::Identity;

/// Application state shared across all handlers.
///
/// Cheaply cloneable via `Arc`. Holds the single identity handle built at
/// startup and the billing API client.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: AppConfig,
    identity: Identity,
    billing: BillingClient,
}

impl AppState {
    /// Build state from configuration.
    ///
    /// Never fails: missing identity settings are carried as a configuration
    /// error and shown on protected pages.
    #[must_use]
    pub fn new(config: AppConfig) -> Self {
        let identity = Identity::from_config(&config.identity);
        let billing = BillingClient::new(&config.api_url);
        Self::from_parts(config, identity, billing)
    }

    /// Assemble state from prebuilt parts.
    #[must_use]
    pub fn from_parts(config: AppConfig, identity: Identity, billing: BillingClient) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                config,
                identity,
                billing,
            }),
        }
    }

    /// Get a reference to the app configuration.
    #[must_use]
    pub fn config(&self) -> &AppConfig {
        &self.inner.config
    }

    /// Get the identity service handle.
    #[must_use]
    pub fn identity(&self) -> &Identity {
        &self.inner.identity
    }

    /// Get the billing API client.
    #[must_use]
    pub fn billing(&self) -> &BillingClient {
        &self.inner.billing
    }
}
