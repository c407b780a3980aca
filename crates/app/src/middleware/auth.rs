//! Route gating for pages that require a signed-in user.
//!
//! [`gate`] maps an [`AuthState`] to what a protected page should show.
//! [`RequireAuth`] mounts an [`AuthProvider`] for the request and applies
//! the gate, rejecting with an error panel, a spinner, or a redirect.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::FromRequestParts,
    http::{StatusCode, request::Parts},
    response::{IntoResponse, Redirect, Response},
};
use tower_sessions::Session;

use crate::identity::User;
use crate::services::auth::{AuthProvider, AuthState};
use crate::state::AppState;

/// Where unauthenticated visitors are sent.
pub const SIGN_IN_PATH: &str = "/sign-in";

/// What a protected page shows for a given auth state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Gate {
    /// Identity failed; show the message in an error panel.
    ConfigError(String),
    /// Still resolving; show a spinner.
    Loading,
    /// Signed in; render the page.
    Authenticated(User),
    /// Nobody signed in; send to the sign-in page.
    RedirectToSignIn,
}

/// Decide what to render. Rules apply in order: error, loading, user.
#[must_use]
pub fn gate(state: &AuthState) -> Gate {
    if let Some(message) = &state.error {
        return Gate::ConfigError(message.clone());
    }
    if state.loading {
        return Gate::Loading;
    }
    match &state.user {
        Some(user) => Gate::Authenticated(user.clone()),
        None => Gate::RedirectToSignIn,
    }
}

/// Full-page error panel.
#[derive(Template, WebTemplate)]
#[template(path = "error.html")]
pub struct ErrorPanelTemplate {
    pub title: String,
    pub message: String,
}

impl ErrorPanelTemplate {
    /// Panel shown when identity is unusable.
    #[must_use]
    pub fn configuration(message: String) -> Self {
        Self {
            title: "Configuration Error".to_string(),
            message,
        }
    }
}

/// Spinner shown while auth state is unresolved.
#[derive(Template, WebTemplate)]
#[template(path = "gate/loading.html")]
pub struct LoadingTemplate;

/// Rejection produced by [`RequireAuth`].
#[derive(Debug)]
pub enum GateRejection {
    ConfigError(String),
    Loading,
    RedirectToSignIn,
    /// The session layer is not installed on this route.
    SessionUnavailable,
}

impl IntoResponse for GateRejection {
    fn into_response(self) -> Response {
        match self {
            Self::ConfigError(message) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorPanelTemplate::configuration(message),
            )
                .into_response(),
            Self::Loading => LoadingTemplate.into_response(),
            Self::RedirectToSignIn => Redirect::to(SIGN_IN_PATH).into_response(),
            Self::SessionUnavailable => {
                tracing::error!("Session layer missing on protected route");
                StatusCode::INTERNAL_SERVER_ERROR.into_response()
            }
        }
    }
}

/// Render the gate outcome for a state that did not resolve to a user.
///
/// Used after actions like sign-out that change the state mid-request.
#[must_use]
pub fn render_gate(state: &AuthState) -> Response {
    match gate(state) {
        Gate::ConfigError(message) => GateRejection::ConfigError(message).into_response(),
        Gate::Loading => GateRejection::Loading.into_response(),
        Gate::Authenticated(_) | Gate::RedirectToSignIn => {
            GateRejection::RedirectToSignIn.into_response()
        }
    }
}

/// Extractor that requires a signed-in user.
///
/// # Example
///
/// ```rust,ignore
/// async fn protected_handler(auth: RequireAuth) -> impl IntoResponse {
///     format!("Hello, {}!", auth.user.email_or_empty())
/// }
/// ```
pub struct RequireAuth {
    pub user: User,
    pub provider: AuthProvider,
}

impl FromRequestParts<AppState> for RequireAuth {
    type Rejection = GateRejection;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        // Get the session from extensions (set by SessionManagerLayer)
        let session = parts
            .extensions
            .get::<Session>()
            .cloned()
            .ok_or(GateRejection::SessionUnavailable)?;

        let provider = AuthProvider::mount(state.identity(), session).await;

        match gate(&provider.state()) {
            Gate::Authenticated(user) => {
                crate::error::set_sentry_user(&user.id, user.email.as_deref());
                Ok(Self { user, provider })
            }
            Gate::ConfigError(message) => Err(GateRejection::ConfigError(message)),
            Gate::Loading => Err(GateRejection::Loading),
            Gate::RedirectToSignIn => Err(GateRejection::RedirectToSignIn),
        }
    }
}
