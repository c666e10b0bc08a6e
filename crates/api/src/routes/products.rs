//! Product CRUD, pricing updates, and the image gallery.
//!
//! Ownership resolves through the chain product -> business -> user; the
//! repository joins the owner in, so handlers check it directly. Mismatches
//! answer 404 like the business routes.

use axum::{
    Json,
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;

use bazaar_core::{BusinessId, ProductId, can_access};

use crate::db::{
    BusinessRepository, ProductRepository,
    products::{NewProduct, ProductFilters},
};
use crate::error::{ApiError, Result};
use crate::middleware::CurrentUser;
use crate::models::Product;
use crate::routes::double_option;
use crate::services::media::MediaError;
use crate::state::AppState;

const NOT_FOUND: &str = "Product not found";

fn default_category() -> String {
    "General".to_string()
}

/// Create request body.
#[derive(Debug, Deserialize)]
pub struct CreateProduct {
    pub name: String,
    #[serde(default = "default_category")]
    pub category: String,
    pub price: Decimal,
    #[serde(default)]
    pub offer_expiration_date: Option<DateTime<Utc>>,
    pub business_id: i32,
}

/// Partial update body.
///
/// `discounted_price` and `offer_expiration_date` are tri-state: absent
/// leaves them alone, explicit null clears them, a value replaces them.
/// There is no `discount` field; the discount only changes through the
/// pricing derivation.
#[derive(Debug, Deserialize)]
pub struct UpdateProduct {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub price: Option<Decimal>,
    #[serde(default, deserialize_with = "double_option")]
    pub discounted_price: Option<Option<Decimal>>,
    #[serde(default, deserialize_with = "double_option")]
    pub offer_expiration_date: Option<Option<DateTime<Utc>>>,
}

/// Body for removing stored images.
#[derive(Debug, Deserialize)]
pub struct RemoveImages {
    pub images: Vec<String>,
}

/// Load a product and enforce the ownership rule.
async fn get_owned(
    state: &AppState,
    caller: bazaar_core::UserId,
    id: ProductId,
) -> Result<Product> {
    let product = ProductRepository::new(state.pool())
        .get(id)
        .await?
        .ok_or_else(|| ApiError::NotFound(NOT_FOUND.to_string()))?;

    if !can_access(caller, &product) {
        return Err(ApiError::NotFound(NOT_FOUND.to_string()));
    }
    Ok(product)
}

/// `GET /product` - Public listing with optional filters.
pub async fn list(
    State(state): State<AppState>,
    Query(filters): Query<ProductFilters>,
) -> Result<Json<Vec<Product>>> {
    let products = ProductRepository::new(state.pool()).list(&filters).await?;
    Ok(Json(products))
}

/// `GET /product/{id}` - Scoped fetch.
pub async fn get(
    State(state): State<AppState>,
    CurrentUser(identity): CurrentUser,
    Path(id): Path<i32>,
) -> Result<Json<Product>> {
    let product = get_owned(&state, identity.id, ProductId::new(id)).await?;
    Ok(Json(product))
}

/// `POST /product` - List a product under a business the caller owns.
pub async fn create(
    State(state): State<AppState>,
    CurrentUser(identity): CurrentUser,
    Json(body): Json<CreateProduct>,
) -> Result<(StatusCode, Json<Product>)> {
    if body.price < Decimal::ZERO {
        return Err(ApiError::Validation("price must not be negative".to_string()));
    }

    let business = BusinessRepository::new(state.pool())
        .get(BusinessId::new(body.business_id))
        .await?;

    // Absent and not-owned answer identically.
    let owned = business.is_some_and(|b| can_access(identity.id, &b));
    if !owned {
        return Err(ApiError::NotFound("Couldn't find the business".to_string()));
    }

    let product = ProductRepository::new(state.pool())
        .create(&NewProduct {
            name: body.name,
            category: body.category,
            price: body.price,
            offer_expiration_date: body.offer_expiration_date,
            business_id: BusinessId::new(body.business_id),
        })
        .await?;

    Ok((StatusCode::CREATED, Json(product)))
}

/// `PUT /product/{id}` - Partial update.
///
/// Setting `discounted_price` drives the discount derivation; changing the
/// price alone leaves an existing discount stale on purpose.
pub async fn update(
    State(state): State<AppState>,
    CurrentUser(identity): CurrentUser,
    Path(id): Path<i32>,
    Json(body): Json<UpdateProduct>,
) -> Result<Json<Product>> {
    let mut product = get_owned(&state, identity.id, ProductId::new(id)).await?;

    if let Some(name) = body.name {
        product.name = name;
    }
    if let Some(category) = body.category {
        product.category = category;
    }
    if let Some(price) = body.price {
        product
            .pricing
            .set_price(price)
            .map_err(|e| ApiError::Validation(e.to_string()))?;
    }
    if let Some(discounted_price) = body.discounted_price {
        product
            .pricing
            .set_discounted_price(discounted_price)
            .map_err(|e| ApiError::Validation(e.to_string()))?;
    }
    if let Some(offer_expiration_date) = body.offer_expiration_date {
        product.offer_expiration_date = offer_expiration_date;
    }

    ProductRepository::new(state.pool()).update(&product).await?;
    Ok(Json(product))
}

/// Map a batch-save failure to the response error.
///
/// Per-file validation failures surface the "no images added" contract;
/// storage failures stay a generic 500 (the store has already rolled the
/// batch back either way).
fn batch_rejection(err: MediaError) -> ApiError {
    if matches!(err, MediaError::Io(_)) {
        tracing::error!(error = %err, "image batch failed unexpectedly, no images added");
        return ApiError::Media(err);
    }
    ApiError::Validation(format!("no images added: {err}"))
}

/// `PUT /product/{id}/images` - Batch image upload.
///
/// All-or-nothing: if any file in the batch fails validation or storage,
/// files already written for this batch are removed again and the product's
/// image list stays untouched.
pub async fn add_images(
    State(state): State<AppState>,
    CurrentUser(identity): CurrentUser,
    Path(id): Path<i32>,
    mut multipart: Multipart,
) -> Result<Json<Product>> {
    let mut product = get_owned(&state, identity.id, ProductId::new(id)).await?;

    let mut files = Vec::new();
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|_| ApiError::Validation("malformed multipart body".to_string()))?
    {
        let original_name = field
            .file_name()
            .ok_or_else(|| ApiError::Validation("file name missing".to_string()))?
            .to_string();
        let bytes = field
            .bytes()
            .await
            .map_err(|_| ApiError::Validation("could not read upload".to_string()))?;
        files.push((original_name, bytes));
    }

    if files.is_empty() {
        return Err(ApiError::Validation("no files in request".to_string()));
    }

    let saved = state
        .media()
        .save_batch(&files)
        .await
        .map_err(batch_rejection)?;

    let mut images = product.images.clone();
    images.extend(saved.iter().cloned());
    if let Err(err) = ProductRepository::new(state.pool())
        .set_images(product.id, &images)
        .await
    {
        // The files are on disk but the list write failed; undo the batch.
        for path in &saved {
            if let Err(e) = state.media().remove(path).await {
                tracing::warn!(path = %path, error = %e, "failed to roll back stored image");
            }
        }
        tracing::error!(error = %err, "image batch failed unexpectedly, no images added");
        return Err(err.into());
    }
    product.images = images;

    Ok(Json(product))
}

/// `DELETE /product/{id}/images` - Remove stored images by path.
///
/// Every path must be present in the product's list; an unknown path fails
/// the whole request naming it, before anything is removed.
pub async fn delete_images(
    State(state): State<AppState>,
    CurrentUser(identity): CurrentUser,
    Path(id): Path<i32>,
    Json(body): Json<RemoveImages>,
) -> Result<Json<Product>> {
    let mut product = get_owned(&state, identity.id, ProductId::new(id)).await?;

    for path in &body.images {
        if !product.images.contains(path) {
            return Err(ApiError::NotFound(format!("image {path} not found")));
        }
    }

    let remaining: Vec<String> = product
        .images
        .iter()
        .filter(|p| !body.images.contains(p))
        .cloned()
        .collect();

    ProductRepository::new(state.pool())
        .set_images(product.id, &remaining)
        .await?;
    product.images = remaining;

    for path in &body.images {
        if let Err(e) = state.media().remove(path).await {
            tracing::warn!(path = %path, error = %e, "failed to delete image file");
        }
    }

    Ok(Json(product))
}

/// `DELETE /product/{id}` - Scoped delete.
pub async fn delete(
    State(state): State<AppState>,
    CurrentUser(identity): CurrentUser,
    Path(id): Path<i32>,
) -> Result<StatusCode> {
    let product = get_owned(&state, identity.id, ProductId::new(id)).await?;

    ProductRepository::new(state.pool())
        .delete(product.id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_batch_rejection_names_the_contract() {
        let err = batch_rejection(MediaError::InvalidExtension);
        let ApiError::Validation(message) = err else {
            panic!("expected a validation error");
        };
        assert!(message.contains("no images added"));

        let err = batch_rejection(MediaError::TooLarge);
        let ApiError::Validation(message) = err else {
            panic!("expected a validation error");
        };
        assert!(message.contains("no images added"));
    }

    #[test]
    fn test_batch_storage_failure_stays_internal() {
        let io = std::io::Error::other("disk full");
        let err = batch_rejection(MediaError::Io(io));
        assert!(matches!(err, ApiError::Media(MediaError::Io(_))));
    }
}
