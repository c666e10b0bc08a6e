//! Bearer-token issuance and verification.
//!
//! Tokens are compact JWTs signed with HMAC-SHA256. The payload carries the
//! subject username (`sub`), the subject user id (`id`), and an expiry
//! (`exp`). There is no refresh mechanism and no revocation list: a token is
//! valid until its natural expiry.
//!
//! The signing secret comes from [`ApiConfig`](crate::config::ApiConfig) and
//! is injected here once at startup; nothing else in the process reads it.

use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use bazaar_core::{UserId, Username};

/// Errors from token operations.
#[derive(Debug, Error)]
pub enum TokenError {
    /// Verification failed. Signature, expiry, claim-shape, and decoding
    /// failures are deliberately indistinguishable.
    #[error("could not validate user")]
    Invalid,

    /// Signing failed at issuance.
    #[error("failed to sign token: {0}")]
    Signing(#[from] jsonwebtoken::errors::Error),
}

/// The resolved caller identity carried by a verified token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    /// Subject user id.
    pub id: UserId,
    /// Subject username.
    pub username: Username,
}

/// JWT claim set: `{sub: username, id: user_id, exp: unix-timestamp}`.
#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    sub: String,
    id: i32,
    exp: i64,
}

/// Issues and verifies signed bearer tokens.
#[derive(Clone)]
pub struct TokenService {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl TokenService {
    /// Session token validity window (login).
    #[must_use]
    pub fn session_ttl() -> Duration {
        Duration::minutes(20)
    }

    /// Email-verification token validity window.
    #[must_use]
    pub fn email_verification_ttl() -> Duration {
        Duration::hours(2)
    }

    /// Create a token service from the process-wide signing secret.
    #[must_use]
    pub fn new(secret: &SecretString) -> Self {
        let secret = secret.expose_secret().as_bytes();
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
        }
    }

    /// Issue a signed token for `(id, username)` valid for `ttl`.
    ///
    /// # Errors
    ///
    /// Returns [`TokenError::Signing`] if encoding fails.
    pub fn issue(
        &self,
        id: UserId,
        username: &Username,
        ttl: Duration,
    ) -> Result<String, TokenError> {
        let claims = Claims {
            sub: username.as_str().to_owned(),
            id: id.as_i32(),
            exp: (Utc::now() + ttl).timestamp(),
        };

        let token = jsonwebtoken::encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)?;
        Ok(token)
    }

    /// Verify a token and resolve the caller identity.
    ///
    /// # Errors
    ///
    /// Returns [`TokenError::Invalid`] if the signature is invalid, the token
    /// is expired, the payload lacks a subject id or username, or decoding
    /// fails for any reason. No distinction is surfaced to the caller.
    pub fn verify(&self, token: &str) -> Result<Identity, TokenError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp"]);

        let data = jsonwebtoken::decode::<Claims>(token, &self.decoding, &validation)
            .map_err(|_| TokenError::Invalid)?;

        let username = Username::parse(&data.claims.sub).map_err(|_| TokenError::Invalid)?;

        Ok(Identity {
            id: UserId::new(data.claims.id),
            username,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn service() -> TokenService {
        TokenService::new(&SecretString::from("0Qf7mJ2xLp9ZkR4wTn8VbYc3HsDgAe6U"))
    }

    fn username(s: &str) -> Username {
        Username::parse(s).unwrap()
    }

    #[test]
    fn test_issue_verify_roundtrip() {
        let tokens = service();
        let token = tokens
            .issue(UserId::new(7), &username("alice"), Duration::minutes(20))
            .unwrap();

        let identity = tokens.verify(&token).unwrap();
        assert_eq!(identity.id, UserId::new(7));
        assert_eq!(identity.username, username("alice"));
    }

    #[test]
    fn test_expired_token_rejected() {
        let tokens = service();
        let token = tokens
            .issue(UserId::new(7), &username("alice"), Duration::seconds(-5))
            .unwrap();

        assert!(matches!(tokens.verify(&token), Err(TokenError::Invalid)));
    }

    #[test]
    fn test_malformed_token_rejected() {
        let tokens = service();
        assert!(matches!(
            tokens.verify("not-a-token"),
            Err(TokenError::Invalid)
        ));
        assert!(matches!(tokens.verify(""), Err(TokenError::Invalid)));
    }

    #[test]
    fn test_wrong_key_rejected() {
        let tokens = service();
        let other = TokenService::new(&SecretString::from("Zz1Xx2Cc3Vv4Bb5Nn6Mm7Aa8Ss9Dd0Ff"));

        let token = tokens
            .issue(UserId::new(7), &username("alice"), Duration::minutes(20))
            .unwrap();

        assert!(matches!(other.verify(&token), Err(TokenError::Invalid)));
    }

    #[test]
    fn test_missing_subject_rejected() {
        // A token whose payload lacks the username claim fails verification
        let secret = SecretString::from("0Qf7mJ2xLp9ZkR4wTn8VbYc3HsDgAe6U");
        let tokens = TokenService::new(&secret);

        #[derive(Serialize)]
        struct NoSubject {
            id: i32,
            exp: i64,
        }

        let payload = NoSubject {
            id: 7,
            exp: (Utc::now() + Duration::minutes(5)).timestamp(),
        };
        let token = jsonwebtoken::encode(
            &Header::new(Algorithm::HS256),
            &payload,
            &EncodingKey::from_secret(secret.expose_secret().as_bytes()),
        )
        .unwrap();

        assert!(matches!(tokens.verify(&token), Err(TokenError::Invalid)));
    }

    #[test]
    fn test_empty_subject_rejected() {
        let tokens = service();
        let secret = SecretString::from("0Qf7mJ2xLp9ZkR4wTn8VbYc3HsDgAe6U");

        let payload = Claims {
            sub: String::new(),
            id: 7,
            exp: (Utc::now() + Duration::minutes(5)).timestamp(),
        };
        let token = jsonwebtoken::encode(
            &Header::new(Algorithm::HS256),
            &payload,
            &EncodingKey::from_secret(secret.expose_secret().as_bytes()),
        )
        .unwrap();

        assert!(matches!(tokens.verify(&token), Err(TokenError::Invalid)));
    }

    #[test]
    fn test_validity_windows() {
        assert_eq!(TokenService::session_ttl(), Duration::minutes(20));
        assert_eq!(TokenService::email_verification_ttl(), Duration::hours(2));
    }
}
