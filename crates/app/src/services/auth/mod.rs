//! Authentication service.
//!
//! [`AuthClient`] binds the identity service to one browser session: it
//! persists the identity session in the tower session store and announces
//! sign-in/sign-out through [`AuthEvents`]. [`AuthProvider`] builds the
//! observable auth state that route gating reads.

mod error;
mod events;
mod provider;

pub use error::AuthError;
pub use events::{AuthEvent, AuthEvents, Subscription};
pub use provider::{AuthProvider, AuthState};

use std::sync::Arc;

use secrecy::SecretString;
use tower_sessions::Session;
use tracing::instrument;

use crate::identity::{AuthSession, IdentityService, SignUpOutcome, User};
use crate::models::session::keys;

/// Identity operations scoped to a browser session.
#[derive(Clone)]
pub struct AuthClient {
    service: Arc<dyn IdentityService>,
    session: Session,
    events: AuthEvents,
}

impl AuthClient {
    #[must_use]
    pub fn new(service: Arc<dyn IdentityService>, session: Session) -> Self {
        Self {
            service,
            session,
            events: AuthEvents::new(),
        }
    }

    /// State-change notifications for this client.
    #[must_use]
    pub const fn events(&self) -> &AuthEvents {
        &self.events
    }

    /// Register `listener` for sign-in and sign-out on this client.
    ///
    /// Shorthand for `events().subscribe(listener)`.
    pub fn on_auth_state_change<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&AuthEvent) + Send + Sync + 'static,
    {
        self.events.subscribe(listener)
    }

    /// The stored identity session, if any.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Session` if the session store cannot be read.
    pub async fn get_session(&self) -> Result<Option<AuthSession>, AuthError> {
        Ok(self.session.get::<AuthSession>(keys::AUTH_SESSION).await?)
    }

    /// Fetch the signed-in user from the identity service.
    ///
    /// A stored session whose token the service no longer accepts is
    /// discarded.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::NotAuthenticated` when nobody is signed in, or
    /// another `AuthError` if the lookup itself fails.
    #[instrument(skip(self))]
    pub async fn get_user(&self) -> Result<User, AuthError> {
        let Some(stored) = self.get_session().await? else {
            return Err(AuthError::NotAuthenticated);
        };

        match self.service.get_user(&stored.access_token).await.map_err(AuthError::from) {
            Err(AuthError::NotAuthenticated) => {
                tracing::debug!("Stored session rejected, discarding");
                self.session.remove::<AuthSession>(keys::AUTH_SESSION).await?;
                self.events.publish(&AuthEvent::SignedOut);
                Err(AuthError::NotAuthenticated)
            }
            other => other,
        }
    }

    /// Sign in with email and password.
    ///
    /// On success the session is stored and `SignedIn` is published.
    ///
    /// # Errors
    ///
    /// Returns the identity service's rejection, or `AuthError::Session` if
    /// the session could not be stored.
    #[instrument(skip(self, password))]
    pub async fn sign_in_with_password(
        &self,
        email: &str,
        password: &SecretString,
    ) -> Result<AuthSession, AuthError> {
        let session = self.service.sign_in_with_password(email, password).await?;
        self.establish(&session).await?;
        tracing::info!(user_id = %session.user.id, "User signed in");
        Ok(session)
    }

    /// Register a new account.
    ///
    /// When the service returns a live session it is stored and `SignedIn`
    /// is published; otherwise the user must confirm their email first.
    ///
    /// # Errors
    ///
    /// Returns the identity service's rejection, or `AuthError::Session` if
    /// the session could not be stored.
    #[instrument(skip(self, password))]
    pub async fn sign_up(
        &self,
        email: &str,
        password: &SecretString,
    ) -> Result<SignUpOutcome, AuthError> {
        let outcome = self.service.sign_up(email, password).await?;

        match &outcome {
            SignUpOutcome::SignedIn(session) => {
                self.establish(session).await?;
                tracing::info!(user_id = %session.user.id, "User signed up");
            }
            SignUpOutcome::ConfirmationRequired(user) => {
                tracing::info!(user_id = %user.id, "User signed up, awaiting email confirmation");
            }
        }

        Ok(outcome)
    }

    /// Revoke the stored session and clear it.
    ///
    /// If the service refuses the revocation the stored session is kept.
    ///
    /// # Errors
    ///
    /// Returns the identity service's error or a session store error.
    #[instrument(skip(self))]
    pub async fn sign_out(&self) -> Result<(), AuthError> {
        if let Some(stored) = self.get_session().await? {
            self.service.sign_out(&stored.access_token).await?;
            tracing::info!(user_id = %stored.user.id, "User signed out");
        }

        self.session.remove::<AuthSession>(keys::AUTH_SESSION).await?;
        // Fresh session ID for the next sign-in.
        self.session.cycle_id().await?;
        self.events.publish(&AuthEvent::SignedOut);
        Ok(())
    }

    async fn establish(&self, session: &AuthSession) -> Result<(), AuthError> {
        // Prevent session fixation across the privilege change.
        self.session.cycle_id().await?;
        self.session.insert(keys::AUTH_SESSION, session).await?;
        self.events.publish(&AuthEvent::SignedIn(session.clone()));
        Ok(())
    }
}
