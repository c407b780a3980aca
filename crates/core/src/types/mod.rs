//! Core types for Astrolabe.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod catalog;
pub mod email;
pub mod id;
pub mod money;

pub use catalog::{CheckoutSessionRequest, CheckoutSessionResponse, Price, Product};
pub use email::{Email, EmailError};
pub use id::*;
pub use money::Amount;
