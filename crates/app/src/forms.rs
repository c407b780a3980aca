//! Sign-in and sign-up form handling.
//!
//! Field constraints mirror the form markup (`required`, `type="email"`,
//! `minlength`) and are checked on submit before any identity call, so a
//! browser that skips its own validation gets the same answer.

use secrecy::SecretString;
use serde::Deserialize;
use thiserror::Error;

use astrolabe_core::{Email, EmailError};

/// Minimum password length accepted at sign-up.
pub const PASSWORD_MIN_LENGTH: usize = 6;

/// A form field constraint that failed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConstraintViolation {
    #[error("{0}")]
    Email(#[from] EmailError),

    #[error("Please fill out this field.")]
    PasswordMissing,

    #[error(
        "Please lengthen this text to {min} characters or more (you are currently using {actual} characters)."
    )]
    PasswordTooShort { min: usize, actual: usize },
}

/// Validated credentials ready for the identity service.
pub struct Credentials {
    pub email: Email,
    pub password: SecretString,
}

/// Sign-in form body.
#[derive(Deserialize)]
pub struct SignInForm {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

impl SignInForm {
    /// Check `required` and `type="email"`.
    ///
    /// # Errors
    ///
    /// Returns the first violated constraint.
    pub fn check_constraints(self) -> Result<Credentials, ConstraintViolation> {
        let email = Email::parse(&self.email)?;
        if self.password.is_empty() {
            return Err(ConstraintViolation::PasswordMissing);
        }
        Ok(Credentials {
            email,
            password: SecretString::from(self.password),
        })
    }
}

/// Sign-up form body.
#[derive(Deserialize)]
pub struct SignUpForm {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

impl SignUpForm {
    /// Check `required`, `type="email"` and the password `minlength`.
    ///
    /// # Errors
    ///
    /// Returns the first violated constraint.
    pub fn check_constraints(self) -> Result<Credentials, ConstraintViolation> {
        let email = Email::parse(&self.email)?;
        let actual = self.password.chars().count();
        if actual == 0 {
            return Err(ConstraintViolation::PasswordMissing);
        }
        if actual < PASSWORD_MIN_LENGTH {
            return Err(ConstraintViolation::PasswordTooShort {
                min: PASSWORD_MIN_LENGTH,
                actual,
            });
        }
        Ok(Credentials {
            email,
            password: SecretString::from(self.password),
        })
    }
}

/// Outcome of the last submission of an auth form.
///
/// Holds the message of a failed attempt; a fresh form has none.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Submission {
    error: Option<String>,
}

impl Submission {
    /// Record a failed submission.
    pub fn fail(&mut self, message: impl Into<String>) {
        self.error = Some(message.into());
    }

    #[must_use]
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }
}
