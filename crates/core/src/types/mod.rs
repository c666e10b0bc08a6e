//! Core types for Bazaar.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod email;
pub mod id;
pub mod password;
pub mod username;

pub use email::{Email, EmailError};
pub use id::*;
pub use password::{PasswordError, validate_password};
pub use username::{Username, UsernameError};
