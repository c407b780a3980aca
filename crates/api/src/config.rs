//! API configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `STRIPE_SECRET_KEY` - Stripe secret API key
//! - `STRIPE_WEBHOOK_SECRET` - Signing secret for Stripe webhook payloads
//! - `SUPABASE_URL` - Identity service base URL, used to verify bearer tokens
//!
//! ## Optional
//! - `APP_BASE_URL` - Public URL of the web app (default: `http://localhost:5285`)
//! - `API_HOST` - Bind address (default: 127.0.0.1)
//! - `API_PORT` - Listen port (default: 5286)
//! - `STRIPE_API_BASE` - Stripe REST base URL (default: `https://api.stripe.com/v1`)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name
//! - `SENTRY_SAMPLE_RATE` - Error sample rate (default: 1.0)
//! - `SENTRY_TRACES_SAMPLE_RATE` - Transaction sample rate (default: 0.0)

use std::net::{IpAddr, SocketAddr};

use secrecy::SecretString;
use thiserror::Error;

/// Default Stripe REST endpoint.
pub const DEFAULT_STRIPE_API_BASE: &str = "https://api.stripe.com/v1";

/// Default web app location, used for checkout return URLs.
pub const DEFAULT_APP_BASE_URL: &str = "http://localhost:5285";

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Billing API configuration.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public base URL of the web app (checkout success/cancel target)
    pub app_base_url: String,
    /// Identity service base URL
    pub supabase_url: String,
    /// Stripe settings
    pub stripe: StripeConfig,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment name
    pub sentry_environment: Option<String>,
    /// Fraction of errors sent to Sentry
    pub sentry_sample_rate: f32,
    /// Fraction of transactions traced
    pub sentry_traces_sample_rate: f32,
}

/// Stripe configuration.
///
/// Implements `Debug` manually to redact both secrets.
#[derive(Clone)]
pub struct StripeConfig {
    /// REST base URL, without a trailing slash
    pub api_base: String,
    /// Secret API key
    pub secret_key: SecretString,
    /// Webhook signing secret (`whsec_...`)
    pub webhook_secret: SecretString,
}

impl std::fmt::Debug for StripeConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StripeConfig")
            .field("api_base", &self.api_base)
            .field("secret_key", &"[REDACTED]")
            .field("webhook_secret", &"[REDACTED]")
            .finish()
    }
}

impl ApiConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a required variable is missing or a value
    /// cannot be parsed.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let stripe = StripeConfig {
            api_base: get_env_or_default("STRIPE_API_BASE", DEFAULT_STRIPE_API_BASE)
                .trim_end_matches('/')
                .to_string(),
            secret_key: SecretString::from(get_required_env("STRIPE_SECRET_KEY")?),
            webhook_secret: SecretString::from(get_required_env("STRIPE_WEBHOOK_SECRET")?),
        };

        let supabase_url = get_required_env("SUPABASE_URL")?
            .trim_end_matches('/')
            .to_string();

        Ok(Self {
            host: parse_env("API_HOST", "127.0.0.1")?,
            port: parse_env("API_PORT", "5286")?,
            app_base_url: get_env_or_default("APP_BASE_URL", DEFAULT_APP_BASE_URL)
                .trim_end_matches('/')
                .to_string(),
            supabase_url,
            stripe,
            sentry_dsn: get_optional_env("SENTRY_DSN"),
            sentry_environment: get_optional_env("SENTRY_ENVIRONMENT"),
            sentry_sample_rate: parse_env("SENTRY_SAMPLE_RATE", "1.0")?,
            sentry_traces_sample_rate: parse_env("SENTRY_TRACES_SAMPLE_RATE", "0.0")?,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Where Stripe sends the browser after a completed checkout.
    ///
    /// `{CHECKOUT_SESSION_ID}` is a Stripe template placeholder, left as is.
    #[must_use]
    pub fn checkout_success_url(&self) -> String {
        format!(
            "{}/pricing?checkout=success&session_id={{CHECKOUT_SESSION_ID}}",
            self.app_base_url
        )
    }

    /// Where Stripe sends the browser when checkout is abandoned.
    #[must_use]
    pub fn checkout_cancel_url(&self) -> String {
        format!("{}/pricing", self.app_base_url)
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required, non-blank environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    get_optional_env(key).ok_or_else(|| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get an optional environment variable, treating blank values as unset.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    get_optional_env(key).unwrap_or_else(|| default.to_string())
}

/// Parse an environment variable, falling back to a default literal.
fn parse_env<T>(key: &str, default: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    get_env_or_default(key, default)
        .parse::<T>()
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
}
