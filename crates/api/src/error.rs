//! Unified error handling with Sentry integration.
//!
//! Provides a unified `ApiError` type that captures server errors to Sentry
//! before responding to the client. All route handlers return
//! `Result<T, ApiError>`.
//!
//! The response contract is deliberately coarse:
//!
//! - Auth failures collapse to a uniform 401 regardless of cause (expired,
//!   malformed, unsigned), so validation internals never leak.
//! - Ownership mismatches respond 404, identical to a genuinely absent
//!   resource, so callers cannot probe for resources they do not own.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use crate::db::RepositoryError;
use crate::services::auth::AuthError;
use crate::services::media::MediaError;
use crate::services::token::TokenError;

/// Application-level error type for the API.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Missing, invalid, or expired bearer token.
    #[error("could not validate user")]
    Unauthorized,

    /// Resource absent, or present but not owned by the caller.
    #[error("{0}")]
    NotFound(String),

    /// Request rejected before any mutation.
    #[error("{0}")]
    Validation(String),

    /// Duplicate username/email/business-name at creation time.
    #[error("{0}")]
    Conflict(String),

    /// Authentication operation failed.
    #[error("auth error: {0}")]
    Auth(#[from] AuthError),

    /// Database operation failed.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),

    /// Image validation or storage failed.
    #[error("media error: {0}")]
    Media(#[from] MediaError),

    /// Internal server error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<TokenError> for ApiError {
    fn from(err: TokenError) -> Self {
        match err {
            // All verification failures are indistinguishable to the caller
            TokenError::Invalid => Self::Unauthorized,
            TokenError::Signing(e) => Self::Internal(e.to_string()),
        }
    }
}

impl ApiError {
    /// Whether this error should be captured to Sentry.
    const fn is_server_error(&self) -> bool {
        match self {
            Self::Internal(_) => true,
            Self::Repository(err) => !matches!(
                err,
                RepositoryError::NotFound | RepositoryError::Conflict(_)
            ),
            Self::Media(err) => matches!(err, MediaError::Io(_)),
            Self::Auth(err) => matches!(
                err,
                AuthError::PasswordHash | AuthError::Repository(_)
            ),
            _ => false,
        }
    }

    fn status(&self) -> StatusCode {
        match self {
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::Auth(err) => match err {
                AuthError::InvalidCredentials => StatusCode::UNAUTHORIZED,
                AuthError::UsernameTaken | AuthError::EmailTaken => StatusCode::CONFLICT,
                AuthError::InvalidUsername(_)
                | AuthError::InvalidEmail(_)
                | AuthError::WeakPassword(_) => StatusCode::BAD_REQUEST,
                AuthError::PasswordHash | AuthError::Repository(_) => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
            Self::Repository(err) => match err {
                RepositoryError::NotFound => StatusCode::NOT_FOUND,
                RepositoryError::Conflict(_) => StatusCode::CONFLICT,
                RepositoryError::Database(_) | RepositoryError::DataCorruption(_) => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
            Self::Media(err) => match err {
                MediaError::InvalidExtension | MediaError::TooLarge | MediaError::NotAnImage(_) => {
                    StatusCode::BAD_REQUEST
                }
                MediaError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Client-facing message. Internal details are never exposed.
    fn message(&self) -> String {
        match self {
            Self::Unauthorized => "could not validate user".to_string(),
            Self::Auth(err) => match err {
                AuthError::InvalidCredentials => "could not authenticate the user".to_string(),
                AuthError::PasswordHash | AuthError::Repository(_) => {
                    "internal server error".to_string()
                }
                other => other.to_string(),
            },
            Self::Repository(err) => match err {
                RepositoryError::NotFound => "not found".to_string(),
                RepositoryError::Conflict(msg) => msg.clone(),
                RepositoryError::Database(_) | RepositoryError::DataCorruption(_) => {
                    "internal server error".to_string()
                }
            },
            Self::Media(err) => match err {
                MediaError::Io(_) => "internal server error".to_string(),
                other => other.to_string(),
            },
            Self::Internal(_) => "internal server error".to_string(),
            Self::NotFound(msg) | Self::Validation(msg) | Self::Conflict(msg) => msg.clone(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        // Capture server errors to Sentry
        if self.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        let status = self.status();
        let body = Json(json!({ "detail": self.message() }));

        (status, body).into_response()
    }
}

/// Result type alias for `ApiError`.
pub type Result<T> = std::result::Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    fn get_status(err: ApiError) -> StatusCode {
        err.into_response().status()
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(get_status(ApiError::Unauthorized), StatusCode::UNAUTHORIZED);
        assert_eq!(
            get_status(ApiError::NotFound("Business not found".to_string())),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            get_status(ApiError::Validation("bad input".to_string())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            get_status(ApiError::Conflict("name taken".to_string())),
            StatusCode::CONFLICT
        );
        assert_eq!(
            get_status(ApiError::Internal("boom".to_string())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_token_failures_collapse_to_unauthorized() {
        let err: ApiError = TokenError::Invalid.into();
        assert_eq!(get_status(err), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn test_internal_details_not_leaked() {
        let err = ApiError::Internal("connection pool exhausted at 10.0.0.3".to_string());
        assert_eq!(err.message(), "internal server error");
    }

    #[test]
    fn test_credential_mismatch_is_unauthorized() {
        let err = ApiError::Auth(AuthError::InvalidCredentials);
        assert_eq!(get_status(err), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn test_duplicate_signup_is_conflict() {
        assert_eq!(
            get_status(ApiError::Auth(AuthError::UsernameTaken)),
            StatusCode::CONFLICT
        );
        assert_eq!(
            get_status(ApiError::Auth(AuthError::EmailTaken)),
            StatusCode::CONFLICT
        );
    }
}
