//! Registration and credential verification.
//!
//! All validation happens before any row is written: username and email
//! parsing, the password rule set, then pre-commit duplicate checks. The
//! repository's unique constraints remain the last line against races.

mod error;

pub use error::AuthError;

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use sqlx::PgPool;

use bazaar_core::{Email, Username, validate_password};

use crate::db::UserRepository;
use crate::models::User;

/// Registration and login against the users table.
pub struct AuthService<'a> {
    pool: &'a PgPool,
}

impl<'a> AuthService<'a> {
    /// Create a new auth service.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Register a new user.
    ///
    /// # Errors
    ///
    /// Returns a validation error if the username, email, or password fail
    /// their rule sets, a duplicate error if either identity field is
    /// taken, or a repository error if the insert fails.
    pub async fn register(
        &self,
        username: &str,
        email: &str,
        password: &str,
    ) -> Result<User, AuthError> {
        let username = Username::parse(username)?;
        let email = Email::parse(email)?;

        if let Err(problems) = validate_password(password) {
            let joined = problems
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join("; ");
            return Err(AuthError::WeakPassword(joined));
        }

        let repo = UserRepository::new(self.pool);

        if repo.username_taken(&username).await? {
            return Err(AuthError::UsernameTaken);
        }
        if repo.email_taken(&email).await? {
            return Err(AuthError::EmailTaken);
        }

        let password_hash = hash_password(password)?;
        let user = repo.create(&username, &email, &password_hash).await?;

        tracing::info!(user_id = %user.id, "user registered");
        Ok(user)
    }

    /// Verify a username/password pair.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` for an unknown username or a
    /// wrong password, indistinguishably.
    pub async fn authenticate(&self, username: &str, password: &str) -> Result<User, AuthError> {
        let username = Username::parse(username).map_err(|_| AuthError::InvalidCredentials)?;

        let repo = UserRepository::new(self.pool);
        let Some((user, password_hash)) = repo.get_with_password_hash(&username).await? else {
            return Err(AuthError::InvalidCredentials);
        };

        verify_password(password, &password_hash)?;
        Ok(user)
    }
}

/// Hash a password using Argon2id.
fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| AuthError::PasswordHash)
}

/// Verify a password against a stored hash.
fn verify_password(password: &str, hash: &str) -> Result<(), AuthError> {
    let parsed_hash = PasswordHash::new(hash).map_err(|_| AuthError::InvalidCredentials)?;
    let argon2 = Argon2::default();

    argon2
        .verify_password(password.as_bytes(), &parsed_hash)
        .map_err(|_| AuthError::InvalidCredentials)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_then_verify_roundtrip() {
        let hash = hash_password("Sup3r$ecret").unwrap();
        assert!(verify_password("Sup3r$ecret", &hash).is_ok());
    }

    #[test]
    fn test_wrong_password_rejected() {
        let hash = hash_password("Sup3r$ecret").unwrap();
        let err = verify_password("Wr0ng$ecret", &hash).unwrap_err();
        assert!(matches!(err, AuthError::InvalidCredentials));
    }

    #[test]
    fn test_garbage_hash_rejected_as_invalid_credentials() {
        let err = verify_password("Sup3r$ecret", "not-a-phc-string").unwrap_err();
        assert!(matches!(err, AuthError::InvalidCredentials));
    }
}
