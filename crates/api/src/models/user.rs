//! User domain type.

use chrono::{DateTime, Utc};
use serde::Serialize;

use bazaar_core::{Email, UserId, Username};

/// A marketplace user (domain type).
///
/// The password hash is intentionally not part of this type; it only exists
/// inside the user repository and the auth service. Identity fields are
/// immutable after creation except for `is_verified`.
#[derive(Debug, Clone, Serialize)]
pub struct User {
    /// Unique user ID.
    pub id: UserId,
    /// Unique username.
    pub username: Username,
    /// Unique email address.
    pub email: Email,
    /// Whether the email has been verified.
    pub is_verified: bool,
    /// Whether the account is active.
    pub is_active: bool,
    /// When the user was created.
    pub created: DateTime<Utc>,
}
