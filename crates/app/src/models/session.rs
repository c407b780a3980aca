//! Session-related types.
//!
//! The identity session lives in the browser's server-side session for as
//! long as the browser keeps the session cookie.

/// Session keys for authentication data.
pub mod keys {
    /// Key for the identity service session (tokens and user).
    pub const AUTH_SESSION: &str = "auth_session";
}
