//! REST client for the hosted identity service (Supabase GoTrue).

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::StatusCode;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::json;
use tracing::{debug, instrument};
use url::Url;

use super::{
    AuthSession, ConfigurationError, IdentityError, IdentityService, SignUpOutcome, User,
};

/// Client for the identity service's `/auth/v1` endpoints.
///
/// Every request carries the project's anon key in the `apikey` header.
#[derive(Clone)]
pub struct SupabaseClient {
    inner: Arc<SupabaseClientInner>,
}

struct SupabaseClientInner {
    client: reqwest::Client,
    auth_url: Url,
    anon_key: SecretString,
}

/// Error body shapes returned by the service.
///
/// Newer endpoints use `msg`, the token endpoint uses `error_description`,
/// and a few proxies answer with `message` or bare `error`.
#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    msg: Option<String>,
    error_description: Option<String>,
    message: Option<String>,
    error: Option<String>,
}

impl ErrorBody {
    fn into_message(self) -> Option<String> {
        [self.msg, self.error_description, self.message, self.error]
            .into_iter()
            .flatten()
            .find(|m| !m.trim().is_empty())
    }
}

impl SupabaseClient {
    /// Create a client for the project at `base_url`.
    ///
    /// # Errors
    ///
    /// Returns `ConfigurationError` if `base_url` is not an absolute URL or
    /// the HTTP client cannot be built.
    pub fn new(base_url: &str, anon_key: SecretString) -> Result<Self, ConfigurationError> {
        let base = Url::parse(base_url.trim_end_matches('/')).map_err(|e| {
            ConfigurationError::new(format!("SUPABASE_URL is not a valid URL: {e}"))
        })?;
        let auth_url = base.join("/auth/v1/").map_err(|e| {
            ConfigurationError::new(format!("SUPABASE_URL is not a valid URL: {e}"))
        })?;

        let client = reqwest::Client::builder()
            .user_agent(concat!("astrolabe-app/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| {
                ConfigurationError::new(format!("Failed to initialize identity client: {e}"))
            })?;

        Ok(Self {
            inner: Arc::new(SupabaseClientInner {
                client,
                auth_url,
                anon_key,
            }),
        })
    }

    fn endpoint(&self, path: &str) -> Result<Url, IdentityError> {
        self.inner
            .auth_url
            .join(path)
            .map_err(|e| IdentityError::Parse(format!("bad endpoint {path}: {e}")))
    }

    fn request(&self, method: reqwest::Method, url: Url) -> reqwest::RequestBuilder {
        self.inner
            .client
            .request(method, url)
            .header("apikey", self.inner.anon_key.expose_secret())
    }

    /// Send a request and decode a successful JSON body.
    async fn send<T: DeserializeOwned>(
        &self,
        builder: reqwest::RequestBuilder,
    ) -> Result<T, IdentityError> {
        let response = builder.send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(rejection(status, &body));
        }

        serde_json::from_str(&body).map_err(|e| IdentityError::Parse(e.to_string()))
    }
}

/// Build the error for a non-success response.
fn rejection(status: StatusCode, body: &str) -> IdentityError {
    let message = serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(ErrorBody::into_message)
        .unwrap_or_else(|| format!("Request failed with status {}", status.as_u16()));

    debug!(status = %status, message = %message, "Identity service rejected request");

    IdentityError::Rejected {
        status: status.as_u16(),
        message,
    }
}

#[async_trait]
impl IdentityService for SupabaseClient {
    #[instrument(skip(self, password))]
    async fn sign_in_with_password(
        &self,
        email: &str,
        password: &SecretString,
    ) -> Result<AuthSession, IdentityError> {
        let mut url = self.endpoint("token")?;
        url.query_pairs_mut().append_pair("grant_type", "password");

        let body = json!({ "email": email, "password": password.expose_secret() });
        self.send(self.request(reqwest::Method::POST, url).json(&body))
            .await
    }

    #[instrument(skip(self, password))]
    async fn sign_up(
        &self,
        email: &str,
        password: &SecretString,
    ) -> Result<SignUpOutcome, IdentityError> {
        let url = self.endpoint("signup")?;
        let body = json!({ "email": email, "password": password.expose_secret() });
        self.send(self.request(reqwest::Method::POST, url).json(&body))
            .await
    }

    #[instrument(skip_all)]
    async fn sign_out(&self, access_token: &str) -> Result<(), IdentityError> {
        let url = self.endpoint("logout")?;
        let response = self
            .request(reqwest::Method::POST, url)
            .bearer_auth(access_token)
            .send()
            .await?;
        let status = response.status();

        // A token the service no longer knows is already signed out.
        if status.is_success()
            || matches!(
                status,
                StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN | StatusCode::NOT_FOUND
            )
        {
            return Ok(());
        }

        let body = response.text().await?;
        Err(rejection(status, &body))
    }

    #[instrument(skip_all)]
    async fn get_user(&self, access_token: &str) -> Result<User, IdentityError> {
        let url = self.endpoint("user")?;
        let result = self
            .send(
                self.request(reqwest::Method::GET, url)
                    .bearer_auth(access_token),
            )
            .await;

        match result {
            Err(IdentityError::Rejected { status: 401 | 403, .. }) => {
                Err(IdentityError::NotAuthenticated)
            }
            other => other,
        }
    }
}
