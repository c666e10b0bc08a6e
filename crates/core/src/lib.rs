//! Bazaar Core - Shared types library.
//!
//! This crate provides common types used across all Bazaar components:
//! - `api` - Marketplace HTTP API
//! - `cli` - Command-line tools for migrations and management
//!
//! # Architecture
//!
//! The core crate contains only types and traits - no I/O, no database access,
//! no HTTP clients. This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for type-safe IDs, emails, and usernames
//! - [`ownership`] - The owner-chain access rule shared by every scoped lookup
//! - [`pricing`] - The discount derivation state machine

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod ownership;
pub mod pricing;
pub mod types;

pub use ownership::{Owned, can_access};
pub use pricing::ProductPricing;
pub use types::*;
