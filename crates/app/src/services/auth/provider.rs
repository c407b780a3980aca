//! Observable authentication state for one request.
//!
//! Mounting an [`AuthProvider`] resolves who is signed in and keeps the
//! answer current: the state lives in a `watch` channel that the provider's
//! auth-event listener overwrites whenever the client signs in or out. Writes
//! are applied in arrival order, so the last one wins.

use std::sync::Arc;

use tokio::sync::watch;
use tower_sessions::Session;

use super::{AuthClient, AuthError, Subscription};
use crate::identity::{Identity, User};

/// Snapshot of authentication state.
///
/// Starts as `{ user: None, loading: true, error: None }`; `loading` drops
/// to `false` once the first resolution completes and never returns to
/// `true`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthState {
    pub user: Option<User>,
    pub loading: bool,
    pub error: Option<String>,
}

impl Default for AuthState {
    fn default() -> Self {
        Self {
            user: None,
            loading: true,
            error: None,
        }
    }
}

/// Source of auth state for the pages rendered in a request.
pub struct AuthProvider {
    state: Arc<watch::Sender<AuthState>>,
    client: Option<AuthClient>,
    _subscription: Option<Subscription>,
}

impl AuthProvider {
    /// Resolve the current user for `session`.
    ///
    /// Outcomes:
    /// - identity not configured: `error` holds the configuration message
    /// - nobody signed in: empty state, no error
    /// - lookup failed for another reason: `error` holds the failure
    pub async fn mount(identity: &Identity, session: Session) -> Self {
        let state = Arc::new(watch::Sender::new(AuthState::default()));

        let service = match identity.client() {
            Ok(service) => service,
            Err(e) => {
                state.send_modify(|s| {
                    s.error = Some(e.message().to_string());
                    s.loading = false;
                });
                return Self {
                    state,
                    client: None,
                    _subscription: None,
                };
            }
        };

        let client = AuthClient::new(service, session);

        let listener_state = Arc::clone(&state);
        let subscription = client.on_auth_state_change(move |event| {
            let user = event.session().map(|s| s.user.clone());
            listener_state.send_modify(|s| {
                s.user = user;
                s.loading = false;
            });
        });

        let resolved = client.get_user().await;
        state.send_modify(|s| {
            match resolved {
                Ok(user) => s.user = Some(user),
                Err(AuthError::NotAuthenticated) => s.user = None,
                Err(e) => {
                    tracing::warn!(error = %e, "Failed to resolve current user");
                    s.user = None;
                    s.error = Some(e.user_message());
                }
            }
            s.loading = false;
        });

        Self {
            state,
            client: Some(client),
            _subscription: Some(subscription),
        }
    }

    /// Current state snapshot.
    #[must_use]
    pub fn state(&self) -> AuthState {
        self.state.borrow().clone()
    }

    /// Receiver that observes every subsequent state change.
    #[must_use]
    pub fn watch(&self) -> watch::Receiver<AuthState> {
        self.state.subscribe()
    }

    /// The session-bound client, absent when identity is unconfigured.
    #[must_use]
    pub const fn client(&self) -> Option<&AuthClient> {
        self.client.as_ref()
    }

    /// Sign the current user out.
    ///
    /// Never fails: a failure is recorded in the state's `error` slot.
    pub async fn sign_out(&self) {
        let Some(client) = &self.client else {
            return;
        };

        match client.sign_out().await {
            Ok(()) => self.state.send_modify(|s| s.user = None),
            Err(e) => {
                tracing::warn!(error = %e, "Sign-out failed");
                self.state.send_modify(|s| s.error = Some(e.user_message()));
            }
        }
    }
}
