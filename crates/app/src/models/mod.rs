//! Domain models for the web app.

pub mod session;
