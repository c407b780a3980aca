//! Astrolabe web app library.
//!
//! Server-rendered sign-in, sign-up and subscription pricing pages. The
//! binary in `main.rs` wires these modules into an HTTP server; keeping
//! them in a library lets the router be exercised in tests.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod billing;
pub mod config;
pub mod error;
pub mod forms;
pub mod identity;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;
