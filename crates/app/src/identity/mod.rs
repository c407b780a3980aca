//! Identity service client and its application-wide handle.
//!
//! # Architecture
//!
//! - [`IdentityService`] is the seam to the hosted identity provider
//!   (sign-in, sign-up, sign-out, current user). [`SupabaseClient`] speaks
//!   the provider's REST API; tests substitute in-memory fakes.
//! - [`Identity`] is built exactly once in `main` from [`IdentityConfig`] and
//!   shared through `AppState`. When configuration is missing it holds a
//!   [`ConfigurationError`] instead, and every call to [`Identity::client`]
//!   returns that same error without trying to construct a client again.

mod supabase;
#[cfg(test)]
#[allow(clippy::unwrap_used)]
pub(crate) mod testing;
pub mod types;

pub use supabase::SupabaseClient;
pub use types::{AuthSession, SignUpOutcome, User};

use std::sync::Arc;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;

use crate::config::IdentityConfig;

/// Message shown when identity settings are absent.
pub const MISSING_CONFIGURATION_MESSAGE: &str =
    "Supabase is not configured. Set SUPABASE_URL and SUPABASE_ANON_KEY in .env";

/// The identity service cannot be used because it is not configured.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ConfigurationError {
    message: String,
}

impl ConfigurationError {
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// Human-readable description of what is misconfigured.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Errors returned by identity service operations.
#[derive(Debug, Error)]
pub enum IdentityError {
    /// The service rejected the request; the message is the service's own.
    #[error("{message}")]
    Rejected { status: u16, message: String },

    /// No valid session: missing, expired, or revoked token.
    #[error("not authenticated")]
    NotAuthenticated,

    /// HTTP request failed before a response was received.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The service answered with a body we could not understand.
    #[error("unexpected identity response: {0}")]
    Parse(String),
}

/// Operations the app consumes from the hosted identity service.
#[async_trait]
pub trait IdentityService: Send + Sync {
    /// Exchange an email and password for a session.
    async fn sign_in_with_password(
        &self,
        email: &str,
        password: &SecretString,
    ) -> Result<AuthSession, IdentityError>;

    /// Register a new account.
    async fn sign_up(
        &self,
        email: &str,
        password: &SecretString,
    ) -> Result<SignUpOutcome, IdentityError>;

    /// Revoke the session behind `access_token`.
    async fn sign_out(&self, access_token: &str) -> Result<(), IdentityError>;

    /// Fetch the user that owns `access_token`.
    ///
    /// Returns [`IdentityError::NotAuthenticated`] when the token is not
    /// accepted.
    async fn get_user(&self, access_token: &str) -> Result<User, IdentityError>;
}

/// Application-wide handle to the identity service.
///
/// Cheap to clone. Holds either a constructed client or the configuration
/// error that prevented construction.
#[derive(Clone)]
pub struct Identity {
    handle: Result<Arc<dyn IdentityService>, ConfigurationError>,
}

impl Identity {
    /// Validate configuration and construct the underlying client once.
    ///
    /// Never fails: a configuration problem is captured and reported by
    /// [`Identity::client`] and [`Identity::configuration_error`].
    #[must_use]
    pub fn from_config(config: &IdentityConfig) -> Self {
        let handle =
            build_client(config).map(|client| Arc::new(client) as Arc<dyn IdentityService>);

        match &handle {
            Ok(_) => tracing::info!("Identity client initialized"),
            Err(e) => tracing::warn!(error = %e, "Identity client unavailable"),
        }

        Self { handle }
    }

    /// Wrap an already constructed service.
    #[must_use]
    pub fn with_service(service: Arc<dyn IdentityService>) -> Self {
        Self {
            handle: Ok(service),
        }
    }

    /// A handle whose every call fails with `error`.
    #[must_use]
    pub const fn unavailable(error: ConfigurationError) -> Self {
        Self { handle: Err(error) }
    }

    /// Return the memoized client.
    ///
    /// # Errors
    ///
    /// Returns the cached [`ConfigurationError`] if the client could not be
    /// constructed. Repeated calls return identical errors.
    pub fn client(&self) -> Result<Arc<dyn IdentityService>, ConfigurationError> {
        self.handle.clone()
    }

    /// The cached configuration error, if construction failed.
    #[must_use]
    pub fn configuration_error(&self) -> Option<&ConfigurationError> {
        self.handle.as_ref().err()
    }
}

fn build_client(config: &IdentityConfig) -> Result<SupabaseClient, ConfigurationError> {
    let url = config.url.as_deref().map(str::trim).filter(|u| !u.is_empty());
    let key = config
        .anon_key
        .as_ref()
        .filter(|k| !k.expose_secret().trim().is_empty());

    let (Some(url), Some(key)) = (url, key) else {
        return Err(ConfigurationError::new(MISSING_CONFIGURATION_MESSAGE));
    };

    SupabaseClient::new(url, key.clone())
}
