//! HTTP route handlers for the marketplace API.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                  - Liveness check
//! GET  /health/ready            - Readiness check (pings the database)
//!
//! # Users
//! POST /user-api/signup         - Register an account
//! POST /user-api/token          - Exchange credentials for a bearer token
//! POST /user-api/verify-email   - Request a verification email (auth)
//! GET  /user-api/verify-email   - Confirm a verification link (?token=)
//! GET  /user-api/all            - Public user profiles
//!
//! # Businesses
//! GET    /business              - Public listing (?owner&city&region)
//! POST   /business              - Register a business (auth)
//! GET    /business/{id}         - Fetch (auth, owner only)
//! PUT    /business/{id}         - Partial update (auth, owner only)
//! PUT    /business/{id}/logo    - Replace logo, multipart (auth, owner only)
//! DELETE /business/{id}         - Delete (auth, owner only)
//!
//! # Products
//! GET    /product               - Public listing (?name&category&price_le&price_ge)
//! POST   /product               - List a product (auth, business owner only)
//! GET    /product/{id}          - Fetch (auth, owner only)
//! PUT    /product/{id}          - Partial update (auth, owner only)
//! PUT    /product/{id}/images   - Batch image upload (auth, owner only)
//! DELETE /product/{id}/images   - Remove images by path (auth, owner only)
//! DELETE /product/{id}          - Delete (auth, owner only)
//! ```

pub mod businesses;
pub mod products;
pub mod users;

use axum::{
    Json, Router,
    extract::{DefaultBodyLimit, State},
    http::StatusCode,
    routing::{get, post, put},
};
use serde::{Deserialize, Deserializer};
use serde_json::json;

use crate::services::media::MAX_UPLOAD_BYTES;
use crate::state::AppState;

/// Multipart framing headroom on top of the file payload.
const UPLOAD_ENVELOPE_SLACK: usize = 2 * 1024 * 1024;

/// Body limit for single-file upload routes: one max-size file plus framing.
const SINGLE_UPLOAD_BODY_LIMIT: usize = MAX_UPLOAD_BYTES + UPLOAD_ENVELOPE_SLACK;

/// Body limit for batch upload routes. The per-file cap lives in the media
/// store; this only bounds the whole envelope so a batch of individually
/// valid files is not rejected at the transport layer.
const BATCH_UPLOAD_BODY_LIMIT: usize = 8 * MAX_UPLOAD_BYTES + UPLOAD_ENVELOPE_SLACK;

/// Deserializer for tri-state update fields.
///
/// Distinguishes a field that is absent (`None`, leave unchanged) from one
/// that is explicitly `null` (`Some(None)`, clear it). Pair with
/// `#[serde(default)]`.
pub fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Deserialize::deserialize(deserializer).map(Some)
}

/// `GET /health` - Liveness.
async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

/// `GET /health/ready` - Readiness, including a database round-trip.
async fn ready(State(state): State<AppState>) -> StatusCode {
    match sqlx::query_scalar::<_, i32>("SELECT 1")
        .fetch_one(state.pool())
        .await
    {
        Ok(_) => StatusCode::OK,
        Err(e) => {
            tracing::error!(error = %e, "readiness check failed");
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}

/// Create the user routes router.
pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/signup", post(users::signup))
        .route("/token", post(users::login))
        .route(
            "/verify-email",
            post(users::request_verification).get(users::confirm_verification),
        )
        .route("/all", get(users::list))
}

/// Create the business routes router.
pub fn business_routes() -> Router<AppState> {
    let uploads = Router::new()
        .route("/{id}/logo", put(businesses::update_logo))
        .route_layer(DefaultBodyLimit::max(SINGLE_UPLOAD_BODY_LIMIT));

    Router::new()
        .route("/", get(businesses::list).post(businesses::create))
        .route(
            "/{id}",
            get(businesses::get)
                .put(businesses::update)
                .delete(businesses::delete),
        )
        .merge(uploads)
}

/// Create the product routes router.
pub fn product_routes() -> Router<AppState> {
    let uploads = Router::new()
        .route(
            "/{id}/images",
            put(products::add_images).delete(products::delete_images),
        )
        .route_layer(DefaultBodyLimit::max(BATCH_UPLOAD_BODY_LIMIT));

    Router::new()
        .route("/", get(products::list).post(products::create))
        .route(
            "/{id}",
            get(products::get)
                .put(products::update)
                .delete(products::delete),
        )
        .merge(uploads)
}

/// Create all routes for the API.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/health/ready", get(ready))
        .nest("/user-api", user_routes())
        .nest("/business", business_routes())
        .nest("/product", product_routes())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use axum::body::{Body, Bytes};
    use axum::http::Request;
    use serde::Deserialize;
    use tower::ServiceExt;

    async fn sink(_body: Bytes) -> StatusCode {
        StatusCode::OK
    }

    /// A router consuming its body under the batch upload limit.
    fn batch_limited_router() -> Router {
        Router::new()
            .route("/", post(sink))
            .route_layer(DefaultBodyLimit::max(BATCH_UPLOAD_BODY_LIMIT))
    }

    async fn status_for_body(body: Vec<u8>) -> StatusCode {
        let request = Request::post("/").body(Body::from(body)).unwrap();
        batch_limited_router()
            .oneshot(request)
            .await
            .unwrap()
            .status()
    }

    #[tokio::test]
    async fn test_batch_limit_accepts_several_full_size_files() {
        // Three max-size files in one envelope must reach the handler; the
        // per-file cap is the media store's job, not the transport's.
        let body = vec![0_u8; 3 * MAX_UPLOAD_BYTES];
        assert_eq!(status_for_body(body).await, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_batch_limit_still_bounds_the_envelope() {
        let body = vec![0_u8; BATCH_UPLOAD_BODY_LIMIT + 1];
        assert_eq!(
            status_for_body(body).await,
            StatusCode::PAYLOAD_TOO_LARGE
        );
    }

    #[derive(Deserialize)]
    struct Patch {
        #[serde(default, deserialize_with = "double_option")]
        field: Option<Option<i32>>,
    }

    #[test]
    fn test_double_option_distinguishes_absent_null_and_value() {
        let absent: Patch = serde_json::from_str("{}").unwrap();
        assert_eq!(absent.field, None);

        let null: Patch = serde_json::from_str(r#"{"field": null}"#).unwrap();
        assert_eq!(null.field, Some(None));

        let value: Patch = serde_json::from_str(r#"{"field": 7}"#).unwrap();
        assert_eq!(value.field, Some(Some(7)));
    }
}
