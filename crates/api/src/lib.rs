//! Astrolabe billing API library.
//!
//! Fronts Stripe for the web app: lists the active catalog, creates
//! subscription checkout sessions for verified users, and receives signed
//! webhook events.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod auth;
pub mod config;
pub mod error;
pub mod routes;
pub mod state;
pub mod stripe;
