//! Business CRUD and logo upload.
//!
//! The listing is public; every other operation resolves the business and
//! applies the ownership check, answering 404 on a mismatch so callers
//! cannot tell "absent" from "not yours".

use axum::{
    Json,
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
};
use serde::Deserialize;

use bazaar_core::{BusinessId, can_access};

use crate::db::{
    BusinessRepository,
    businesses::{BusinessFilters, NewBusiness},
};
use crate::error::{ApiError, Result};
use crate::middleware::CurrentUser;
use crate::models::{Business, business::DEFAULT_LOGO_PATH};
use crate::routes::double_option;
use crate::state::AppState;

const NOT_FOUND: &str = "Business not found";

fn default_location() -> String {
    "Unspecified".to_string()
}

/// Create request body.
#[derive(Debug, Deserialize)]
pub struct CreateBusiness {
    pub business_name: String,
    #[serde(default = "default_location")]
    pub city: String,
    #[serde(default = "default_location")]
    pub region: String,
    #[serde(default)]
    pub business_description: Option<String>,
}

/// Partial update body.
///
/// `business_description` is tri-state: absent leaves it alone, explicit
/// null clears it, a value replaces it.
#[derive(Debug, Deserialize)]
pub struct UpdateBusiness {
    #[serde(default)]
    pub business_name: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub region: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub business_description: Option<Option<String>>,
}

/// Load a business and enforce the ownership rule.
async fn get_owned(
    state: &AppState,
    caller: bazaar_core::UserId,
    id: BusinessId,
) -> Result<Business> {
    let business = BusinessRepository::new(state.pool())
        .get(id)
        .await?
        .ok_or_else(|| ApiError::NotFound(NOT_FOUND.to_string()))?;

    if !can_access(caller, &business) {
        return Err(ApiError::NotFound(NOT_FOUND.to_string()));
    }
    Ok(business)
}

/// `GET /business` - Public listing with optional filters.
pub async fn list(
    State(state): State<AppState>,
    Query(filters): Query<BusinessFilters>,
) -> Result<Json<Vec<Business>>> {
    let businesses = BusinessRepository::new(state.pool()).list(&filters).await?;
    Ok(Json(businesses))
}

/// `GET /business/{id}` - Scoped fetch.
pub async fn get(
    State(state): State<AppState>,
    CurrentUser(identity): CurrentUser,
    Path(id): Path<i32>,
) -> Result<Json<Business>> {
    let business = get_owned(&state, identity.id, BusinessId::new(id)).await?;
    Ok(Json(business))
}

/// `POST /business` - Register a business owned by the caller.
pub async fn create(
    State(state): State<AppState>,
    CurrentUser(identity): CurrentUser,
    Json(body): Json<CreateBusiness>,
) -> Result<(StatusCode, Json<Business>)> {
    let repo = BusinessRepository::new(state.pool());

    if repo.name_taken(&body.business_name).await? {
        return Err(ApiError::Validation(format!(
            "a business named {} already exists",
            body.business_name
        )));
    }

    let business = repo
        .create(
            &NewBusiness {
                business_name: body.business_name,
                city: body.city,
                region: body.region,
                business_description: body.business_description,
            },
            identity.id,
        )
        .await?;

    Ok((StatusCode::CREATED, Json(business)))
}

/// `PUT /business/{id}` - Partial update of editable fields.
pub async fn update(
    State(state): State<AppState>,
    CurrentUser(identity): CurrentUser,
    Path(id): Path<i32>,
    Json(body): Json<UpdateBusiness>,
) -> Result<Json<Business>> {
    let mut business = get_owned(&state, identity.id, BusinessId::new(id)).await?;

    if let Some(name) = body.business_name {
        business.business_name = name;
    }
    if let Some(city) = body.city {
        business.city = city;
    }
    if let Some(region) = body.region {
        business.region = region;
    }
    if let Some(description) = body.business_description {
        business.business_description = description;
    }

    BusinessRepository::new(state.pool())
        .update(&business)
        .await?;
    Ok(Json(business))
}

/// `PUT /business/{id}/logo` - Upload a replacement logo.
///
/// The previous logo file is removed from disk unless it is the shared
/// default asset.
pub async fn update_logo(
    State(state): State<AppState>,
    CurrentUser(identity): CurrentUser,
    Path(id): Path<i32>,
    mut multipart: Multipart,
) -> Result<Json<Business>> {
    let mut business = get_owned(&state, identity.id, BusinessId::new(id)).await?;

    let field = multipart
        .next_field()
        .await
        .map_err(|_| ApiError::Validation("malformed multipart body".to_string()))?
        .ok_or_else(|| ApiError::Validation("no file in request".to_string()))?;

    let original_name = field
        .file_name()
        .ok_or_else(|| ApiError::Validation("file name missing".to_string()))?
        .to_string();
    let bytes = field
        .bytes()
        .await
        .map_err(|_| ApiError::Validation("could not read upload".to_string()))?;

    let stored_path = state.media().save(&original_name, &bytes).await?;

    BusinessRepository::new(state.pool())
        .set_logo(business.id, &stored_path)
        .await?;

    let old_logo = std::mem::replace(&mut business.logo, stored_path);
    if old_logo != DEFAULT_LOGO_PATH
        && let Err(e) = state.media().remove(&old_logo).await
    {
        tracing::warn!(path = %old_logo, error = %e, "failed to remove replaced logo");
    }

    Ok(Json(business))
}

/// `DELETE /business/{id}` - Scoped delete (products cascade).
pub async fn delete(
    State(state): State<AppState>,
    CurrentUser(identity): CurrentUser,
    Path(id): Path<i32>,
) -> Result<StatusCode> {
    let business = get_owned(&state, identity.id, BusinessId::new(id)).await?;

    BusinessRepository::new(state.pool())
        .delete(business.id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
