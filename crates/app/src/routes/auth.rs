//! Sign-in, sign-up and sign-out handlers.
//!
//! A failed submission re-renders the form with the identity service's
//! message and the email the visitor typed; the password is never echoed.
//! A successful one redirects home.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::State,
    response::{IntoResponse, Redirect, Response},
};
use tower_sessions::Session;
use tracing::{instrument, warn};

use crate::error::{AppError, add_breadcrumb, clear_sentry_user, set_sentry_user};
use crate::forms::{Credentials, PASSWORD_MIN_LENGTH, SignInForm, SignUpForm, Submission};
use crate::identity::SignUpOutcome;
use crate::middleware::{RequireAuth, render_gate};
use crate::services::auth::{AuthClient, AuthError};
use crate::state::AppState;

/// Where a successful sign-in or sign-up lands.
const HOME_PATH: &str = "/";

// =============================================================================
// Templates
// =============================================================================

/// Sign-in page template.
#[derive(Template, WebTemplate, Default)]
#[template(path = "auth/sign_in.html")]
pub struct SignInTemplate {
    pub email: String,
    pub submission: Submission,
}

/// Sign-up page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/sign_up.html")]
pub struct SignUpTemplate {
    pub email: String,
    pub submission: Submission,
    pub min_password_length: usize,
}

impl Default for SignUpTemplate {
    fn default() -> Self {
        Self {
            email: String::new(),
            submission: Submission::default(),
            min_password_length: PASSWORD_MIN_LENGTH,
        }
    }
}

// =============================================================================
// Shared submit flow
// =============================================================================

enum Action {
    SignIn,
    SignUp,
}

/// Run a credential submission against the identity service.
///
/// `Ok(Err(message))` is a failure to show on the form; `Err` is a server
/// fault that should not be blamed on the visitor.
async fn submit(
    state: &AppState,
    session: Session,
    credentials: Credentials,
    action: Action,
) -> Result<Result<(), String>, AppError> {
    let service = match state.identity().client() {
        Ok(service) => service,
        Err(e) => return Ok(Err(e.message().to_string())),
    };
    let client = AuthClient::new(service, session);
    let email = credentials.email.as_str();

    let result = match action {
        Action::SignIn => client
            .sign_in_with_password(email, &credentials.password)
            .await
            .map(|s| s.user),
        Action::SignUp => client
            .sign_up(email, &credentials.password)
            .await
            .map(|outcome| match outcome {
                SignUpOutcome::SignedIn(s) => s.user,
                SignUpOutcome::ConfirmationRequired(u) => u,
            }),
    };

    match result {
        Ok(user) => {
            set_sentry_user(&user.id, user.email.as_deref());
            Ok(Ok(()))
        }
        Err(e @ AuthError::Session(_)) => Err(e.into()),
        Err(e) => {
            warn!(error = %e, "Credential submission rejected");
            Ok(Err(e.user_message()))
        }
    }
}

// =============================================================================
// Sign In
// =============================================================================

/// Display the sign-in page.
pub async fn sign_in_page() -> impl IntoResponse {
    SignInTemplate::default()
}

/// Handle sign-in form submission.
#[instrument(skip(state, session, form))]
pub async fn sign_in(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<SignInForm>,
) -> Result<Response, AppError> {
    let mut page = SignInTemplate {
        email: form.email.clone(),
        submission: Submission::default(),
    };

    let credentials = match form.check_constraints() {
        Ok(credentials) => credentials,
        Err(violation) => {
            page.submission.fail(violation.to_string());
            return Ok(page.into_response());
        }
    };

    match submit(&state, session, credentials, Action::SignIn).await? {
        Ok(()) => {
            add_breadcrumb("auth", "Signed in", &[]);
            Ok(Redirect::to(HOME_PATH).into_response())
        }
        Err(message) => {
            page.submission.fail(message);
            Ok(page.into_response())
        }
    }
}

// =============================================================================
// Sign Up
// =============================================================================

/// Display the sign-up page.
pub async fn sign_up_page() -> impl IntoResponse {
    SignUpTemplate::default()
}

/// Handle sign-up form submission.
///
/// Redirects home even when the account still needs email confirmation;
/// the route gate then sends the visitor to sign in.
#[instrument(skip(state, session, form))]
pub async fn sign_up(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<SignUpForm>,
) -> Result<Response, AppError> {
    let mut page = SignUpTemplate {
        email: form.email.clone(),
        ..SignUpTemplate::default()
    };

    let credentials = match form.check_constraints() {
        Ok(credentials) => credentials,
        Err(violation) => {
            page.submission.fail(violation.to_string());
            return Ok(page.into_response());
        }
    };

    match submit(&state, session, credentials, Action::SignUp).await? {
        Ok(()) => {
            add_breadcrumb("auth", "Signed up", &[]);
            Ok(Redirect::to(HOME_PATH).into_response())
        }
        Err(message) => {
            page.submission.fail(message);
            Ok(page.into_response())
        }
    }
}

// =============================================================================
// Sign Out
// =============================================================================

/// Handle sign-out.
///
/// On success the gate sends the visitor to sign in; a failure is shown in
/// the error panel.
pub async fn sign_out(auth: RequireAuth) -> Response {
    auth.provider.sign_out().await;

    let state = auth.provider.state();
    if state.error.is_none() {
        clear_sentry_user();
    }
    render_gate(&state)
}
