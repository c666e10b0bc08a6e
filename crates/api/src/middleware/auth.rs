//! Authentication extractor (the access guard).
//!
//! Every protected handler takes a [`CurrentUser`] argument. The extractor
//! pulls the bearer token from the `Authorization` header, verifies it via
//! the token service, and resolves the caller identity. Any failure - missing
//! header, malformed token, bad signature, expiry - short-circuits the
//! request with the same 401 response, so nothing about the validation
//! internals leaks.

use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts},
};

use crate::error::ApiError;
use crate::services::token::Identity;
use crate::state::AppState;

/// Extractor that requires a valid bearer token.
///
/// # Example
///
/// ```rust,ignore
/// async fn protected_handler(
///     CurrentUser(caller): CurrentUser,
/// ) -> impl IntoResponse {
///     format!("Hello, {}!", caller.username)
/// }
/// ```
pub struct CurrentUser(pub Identity);

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = extract_bearer(parts).ok_or(ApiError::Unauthorized)?;
        let identity = state.tokens().verify(token)?;
        Ok(Self(identity))
    }
}

/// Pull the bearer token out of the `Authorization` header.
fn extract_bearer(parts: &Parts) -> Option<&str> {
    let header = parts.headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let token = header.strip_prefix("Bearer ")?.trim();
    if token.is_empty() { None } else { Some(token) }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use axum::http::Request;

    fn parts_with_auth(value: Option<&str>) -> Parts {
        let mut builder = Request::builder().uri("/business/1");
        if let Some(v) = value {
            builder = builder.header(header::AUTHORIZATION, v);
        }
        let (parts, ()) = builder.body(()).unwrap().into_parts();
        parts
    }

    #[test]
    fn test_extract_bearer() {
        let parts = parts_with_auth(Some("Bearer abc.def.ghi"));
        assert_eq!(extract_bearer(&parts), Some("abc.def.ghi"));
    }

    #[test]
    fn test_missing_header() {
        let parts = parts_with_auth(None);
        assert_eq!(extract_bearer(&parts), None);
    }

    #[test]
    fn test_wrong_scheme() {
        let parts = parts_with_auth(Some("Basic dXNlcjpwYXNz"));
        assert_eq!(extract_bearer(&parts), None);
    }

    #[test]
    fn test_empty_token() {
        let parts = parts_with_auth(Some("Bearer   "));
        assert_eq!(extract_bearer(&parts), None);
    }
}
