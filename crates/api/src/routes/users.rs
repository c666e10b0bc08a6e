//! User signup, login, listing, and the email-verification workflow.

use axum::{
    Form, Json,
    extract::{Query, State},
    http::StatusCode,
};
use serde::{Deserialize, Serialize};

use crate::db::UserRepository;
use crate::error::{ApiError, Result};
use crate::middleware::CurrentUser;
use crate::models::User;
use crate::services::{AuthService, TokenService};
use crate::state::AppState;

/// Signup request body.
#[derive(Debug, Deserialize)]
pub struct SignupRequest {
    pub username: String,
    pub email: String,
    pub password: String,
}

/// Login form body (`application/x-www-form-urlencoded`).
#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

/// Issued bearer token response.
#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: &'static str,
}

/// `POST /user-api/signup` - Register a new account.
pub async fn signup(
    State(state): State<AppState>,
    Json(body): Json<SignupRequest>,
) -> Result<(StatusCode, Json<User>)> {
    let user = AuthService::new(state.pool())
        .register(&body.username, &body.email, &body.password)
        .await?;

    Ok((StatusCode::CREATED, Json(user)))
}

/// `POST /user-api/token` - Exchange credentials for a session token.
pub async fn login(
    State(state): State<AppState>,
    Form(form): Form<LoginForm>,
) -> Result<Json<TokenResponse>> {
    let user = AuthService::new(state.pool())
        .authenticate(&form.username, &form.password)
        .await?;

    let access_token =
        state
            .tokens()
            .issue(user.id, &user.username, TokenService::session_ttl())?;

    Ok(Json(TokenResponse {
        access_token,
        token_type: "bearer",
    }))
}

/// `GET /user-api/all` - Public user profiles.
pub async fn list(State(state): State<AppState>) -> Result<Json<Vec<User>>> {
    let users = UserRepository::new(state.pool()).list().await?;
    Ok(Json(users))
}

/// Acknowledgement body for the verification-request endpoint.
#[derive(Debug, Serialize)]
pub struct VerificationRequested {
    pub detail: &'static str,
}

/// `POST /user-api/verify-email` - Ask for a verification email.
///
/// Acks immediately; the send runs in a spawned task so SMTP latency or
/// failure never reaches the caller. Send failures are logged.
pub async fn request_verification(
    State(state): State<AppState>,
    CurrentUser(identity): CurrentUser,
) -> Result<Json<VerificationRequested>> {
    let user = UserRepository::new(state.pool())
        .get_by_id(identity.id)
        .await?
        .ok_or(ApiError::Unauthorized)?;

    let token = state.tokens().issue(
        user.id,
        &user.username,
        TokenService::email_verification_ttl(),
    )?;

    if let Some(email_service) = state.email() {
        let email_service = email_service.clone();
        tokio::spawn(async move {
            if let Err(e) = email_service
                .send_verification(&user.email, &user.username, &token)
                .await
            {
                tracing::warn!(user_id = %user.id, error = %e, "verification email failed");
            }
        });
    } else {
        tracing::warn!(user_id = %user.id, "email delivery not configured, skipping send");
    }

    Ok(Json(VerificationRequested {
        detail: "verification email requested",
    }))
}

/// Query parameters for the verification link.
#[derive(Debug, Deserialize)]
pub struct VerifyEmailQuery {
    pub token: String,
}

/// Confirmation body for a verified email.
#[derive(Debug, Serialize)]
pub struct EmailVerified {
    pub detail: &'static str,
}

/// `GET /user-api/verify-email?token=` - Confirm a verification link.
///
/// Idempotent: re-visiting an already-used link within its lifetime succeeds
/// again. Any token failure is the uniform 401.
pub async fn confirm_verification(
    State(state): State<AppState>,
    Query(query): Query<VerifyEmailQuery>,
) -> Result<Json<EmailVerified>> {
    let identity = state.tokens().verify(&query.token)?;

    UserRepository::new(state.pool())
        .mark_verified(identity.id)
        .await
        .map_err(|e| match e {
            crate::db::RepositoryError::NotFound => ApiError::Unauthorized,
            other => other.into(),
        })?;

    Ok(Json(EmailVerified {
        detail: "email verified",
    }))
}
