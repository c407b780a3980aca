//! Authentication error types.

use thiserror::Error;

use crate::identity::{ConfigurationError, IdentityError};

/// Errors that can occur during authentication operations.
#[derive(Debug, Error)]
pub enum AuthError {
    /// The identity service is not configured.
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    /// No signed-in user for this browser session.
    #[error("Auth session missing!")]
    NotAuthenticated,

    /// The identity service call failed.
    #[error(transparent)]
    Identity(IdentityError),

    /// Reading or writing the browser session failed.
    #[error("session error: {0}")]
    Session(#[from] tower_sessions::session::Error),
}

impl From<IdentityError> for AuthError {
    fn from(err: IdentityError) -> Self {
        match err {
            IdentityError::NotAuthenticated => Self::NotAuthenticated,
            other => Self::Identity(other),
        }
    }
}

impl AuthError {
    /// Message safe to show next to a form or in an error panel.
    ///
    /// Identity rejections carry the service's own wording; transport and
    /// storage failures get a generic sentence.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Configuration(e) => e.message().to_string(),
            Self::NotAuthenticated => self.to_string(),
            Self::Identity(IdentityError::Rejected { message, .. }) => message.clone(),
            Self::Identity(IdentityError::Http(_)) => {
                "Could not reach the authentication service. Please try again.".to_string()
            }
            Self::Identity(IdentityError::Parse(_)) => {
                "The authentication service returned an unexpected response.".to_string()
            }
            Self::Identity(IdentityError::NotAuthenticated) => {
                Self::NotAuthenticated.to_string()
            }
            Self::Session(_) => "Your session could not be saved. Please try again.".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_authenticated_maps_to_its_own_variant() {
        let err = AuthError::from(IdentityError::NotAuthenticated);
        assert!(matches!(err, AuthError::NotAuthenticated));
    }

    #[test]
    fn test_rejection_message_is_passed_through() {
        let err = AuthError::from(IdentityError::Rejected {
            status: 400,
            message: "Invalid login credentials".to_string(),
        });
        assert_eq!(err.user_message(), "Invalid login credentials");
    }

    #[test]
    fn test_configuration_message_is_passed_through() {
        let err = AuthError::from(ConfigurationError::new("not configured"));
        assert_eq!(err.user_message(), "not configured");
    }
}
