//! In-memory identity service for tests.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use tower_sessions::{MemoryStore, Session};

use astrolabe_core::UserId;

use super::{AuthSession, IdentityError, IdentityService, SignUpOutcome, User};

/// A fresh, empty browser session backed by a memory store.
pub fn memory_session() -> Session {
    Session::new(None, Arc::new(MemoryStore::default()), None)
}

/// Identity service double with configurable failure modes.
#[derive(Default)]
pub struct FakeIdentity {
    accounts: Mutex<HashMap<String, String>>,
    tokens: Mutex<HashMap<String, User>>,
    confirm_sign_ups: bool,
    refuse_sign_out: bool,
    user_lookup_down: bool,
}

impl FakeIdentity {
    pub fn with_account(email: &str, password: &str) -> Self {
        let fake = Self::default();
        fake.accounts
            .lock()
            .unwrap()
            .insert(email.to_string(), password.to_string());
        fake
    }

    /// Sign-ups return a bare user instead of a session.
    pub fn requiring_confirmation(mut self) -> Self {
        self.confirm_sign_ups = true;
        self
    }

    /// Sign-out fails with a server error.
    pub fn failing_sign_out(mut self) -> Self {
        self.refuse_sign_out = true;
        self
    }

    /// Current-user lookups fail with a server error.
    pub fn failing_user_lookup(mut self) -> Self {
        self.user_lookup_down = true;
        self
    }

    /// Number of registered accounts.
    pub fn account_count(&self) -> usize {
        self.accounts.lock().unwrap().len()
    }

    fn issue(&self, email: &str) -> AuthSession {
        let user = User {
            id: UserId::new(format!("user-{email}")),
            email: Some(email.to_string()),
        };
        let token = format!("token-{}", self.tokens.lock().unwrap().len());
        self.tokens
            .lock()
            .unwrap()
            .insert(token.clone(), user.clone());

        AuthSession {
            access_token: token,
            refresh_token: None,
            expires_in: Some(3600),
            expires_at: None,
            user,
        }
    }
}

fn rejected(status: u16, message: &str) -> IdentityError {
    IdentityError::Rejected {
        status,
        message: message.to_string(),
    }
}

#[async_trait]
impl IdentityService for FakeIdentity {
    async fn sign_in_with_password(
        &self,
        email: &str,
        password: &SecretString,
    ) -> Result<AuthSession, IdentityError> {
        let known = self.accounts.lock().unwrap().get(email).cloned();
        match known {
            Some(expected) if expected == password.expose_secret() => Ok(self.issue(email)),
            _ => Err(rejected(400, "Invalid login credentials")),
        }
    }

    async fn sign_up(
        &self,
        email: &str,
        password: &SecretString,
    ) -> Result<SignUpOutcome, IdentityError> {
        {
            let mut accounts = self.accounts.lock().unwrap();
            if accounts.contains_key(email) {
                return Err(rejected(422, "User already registered"));
            }
            accounts.insert(email.to_string(), password.expose_secret().to_string());
        }

        if self.confirm_sign_ups {
            return Ok(SignUpOutcome::ConfirmationRequired(User {
                id: UserId::new(format!("user-{email}")),
                email: Some(email.to_string()),
            }));
        }
        Ok(SignUpOutcome::SignedIn(self.issue(email)))
    }

    async fn sign_out(&self, access_token: &str) -> Result<(), IdentityError> {
        if self.refuse_sign_out {
            return Err(rejected(503, "Service unavailable"));
        }
        self.tokens.lock().unwrap().remove(access_token);
        Ok(())
    }

    async fn get_user(&self, access_token: &str) -> Result<User, IdentityError> {
        if self.user_lookup_down {
            return Err(rejected(500, "Database error querying schema"));
        }
        self.tokens
            .lock()
            .unwrap()
            .get(access_token)
            .cloned()
            .ok_or(IdentityError::NotAuthenticated)
    }
}
