//! App configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Identity service
//! - `SUPABASE_URL` - Identity service base URL
//! - `SUPABASE_ANON_KEY` - Identity service public (anon) key
//!
//! Both are needed for authentication, but their absence does not stop the
//! server: protected pages render a configuration error panel instead.
//!
//! ## Optional
//! - `API_URL` - Billing API base URL (default: `http://localhost:5286`)
//! - `APP_HOST` - Bind address (default: 127.0.0.1)
//! - `APP_PORT` - Listen port (default: 5285)
//! - `APP_BASE_URL` - Public URL of the app (default: `http://localhost:5285`)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name
//! - `SENTRY_SAMPLE_RATE` - Error sample rate (default: 1.0)
//! - `SENTRY_TRACES_SAMPLE_RATE` - Transaction sample rate (default: 0.0)

use std::net::{IpAddr, SocketAddr};

use secrecy::SecretString;
use thiserror::Error;

/// Default billing API location for local development.
pub const DEFAULT_API_URL: &str = "http://localhost:5286";

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Web app configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public base URL for the app
    pub base_url: String,
    /// Identity service settings (values may be missing)
    pub identity: IdentityConfig,
    /// Billing API base URL
    pub api_url: String,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment name
    pub sentry_environment: Option<String>,
    /// Fraction of errors sent to Sentry
    pub sentry_sample_rate: f32,
    /// Fraction of transactions traced
    pub sentry_traces_sample_rate: f32,
}

/// Identity service configuration.
///
/// Values are kept optional here; the identity wrapper decides whether they
/// are usable. Implements `Debug` manually to redact the key.
#[derive(Clone, Default)]
pub struct IdentityConfig {
    /// Base URL of the identity service (e.g. `https://xyz.supabase.co`)
    pub url: Option<String>,
    /// Public anon key sent with every identity request
    pub anon_key: Option<SecretString>,
}

impl std::fmt::Debug for IdentityConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IdentityConfig")
            .field("url", &self.url)
            .field("anon_key", &self.anon_key.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

impl AppConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is present but cannot be parsed.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let host = parse_env("APP_HOST", "127.0.0.1")?;
        let port = parse_env("APP_PORT", "5285")?;
        let base_url = get_env_or_default("APP_BASE_URL", "http://localhost:5285");
        let api_url = get_non_empty_env("API_URL").unwrap_or_else(|| DEFAULT_API_URL.to_string());
        let identity = IdentityConfig::from_env();

        Ok(Self {
            host,
            port,
            base_url,
            identity,
            api_url,
            sentry_dsn: get_non_empty_env("SENTRY_DSN"),
            sentry_environment: get_non_empty_env("SENTRY_ENVIRONMENT"),
            sentry_sample_rate: parse_env("SENTRY_SAMPLE_RATE", "1.0")?,
            sentry_traces_sample_rate: parse_env("SENTRY_TRACES_SAMPLE_RATE", "0.0")?,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Whether the app is served over HTTPS (controls secure cookies).
    #[must_use]
    pub fn is_secure(&self) -> bool {
        self.base_url.starts_with("https://")
    }
}

impl IdentityConfig {
    fn from_env() -> Self {
        Self {
            url: get_optional_env("SUPABASE_URL"),
            anon_key: get_optional_env("SUPABASE_ANON_KEY").map(SecretString::from),
        }
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get an optional environment variable.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

/// Get an optional environment variable, treating blank values as unset.
fn get_non_empty_env(key: &str) -> Option<String> {
    get_optional_env(key).filter(|v| !v.trim().is_empty())
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
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
