//! Business logic services for the web app.
//!
//! - `auth` - Session-bound identity operations and observable auth state

pub mod auth;
