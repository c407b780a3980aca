//! Astrolabe Core - Shared types library.
//!
//! This crate provides common types used across the Astrolabe components:
//! - `app` - Server-rendered web app (sign-in, sign-up, pricing)
//! - `api` - Billing API fronting Stripe products, prices and checkout
//!
//! # Architecture
//!
//! The core crate contains only types and pure helpers - no I/O, no HTTP
//! clients. Both binaries agree on the billing wire format through it.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for ids, emails, amounts, and catalog records

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
