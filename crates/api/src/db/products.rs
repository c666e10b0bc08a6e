//! Product repository for database operations.
//!
//! Every product read joins through `businesses` to resolve the terminal
//! owner of the ownership chain (product -> business -> user), so handlers
//! can apply the access check without a second query.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{PgPool, Postgres, QueryBuilder};

use bazaar_core::{BusinessId, ProductId, ProductPricing, UserId};

use super::RepositoryError;
use crate::models::Product;

/// Fields for creating a product.
#[derive(Debug)]
pub struct NewProduct {
    pub name: String,
    pub category: String,
    pub price: Decimal,
    pub offer_expiration_date: Option<DateTime<Utc>>,
    pub business_id: BusinessId,
}

/// Optional filters for the public product listing. Deserialized straight
/// from the listing query string.
#[derive(Debug, Default, serde::Deserialize)]
pub struct ProductFilters {
    /// Case-insensitive name substring.
    pub name: Option<String>,
    pub category: Option<String>,
    /// Price upper bound (inclusive).
    pub price_le: Option<Decimal>,
    /// Price lower bound (inclusive).
    pub price_ge: Option<Decimal>,
}

#[derive(sqlx::FromRow)]
struct ProductRow {
    product_id: i32,
    name: String,
    category: String,
    price: Decimal,
    discount: Option<Decimal>,
    discounted_price: Option<Decimal>,
    offer_expiration_date: Option<DateTime<Utc>>,
    images: Vec<String>,
    date_published: DateTime<Utc>,
    business_id: i32,
    owner_id: i32,
}

impl ProductRow {
    fn into_domain(self) -> Product {
        Product {
            id: ProductId::new(self.product_id),
            name: self.name,
            category: self.category,
            pricing: ProductPricing::from_stored(
                self.price,
                self.discount,
                self.discounted_price,
            ),
            offer_expiration_date: self.offer_expiration_date,
            images: self.images,
            date_published: self.date_published,
            business_id: BusinessId::new(self.business_id),
            owner_id: UserId::new(self.owner_id),
        }
    }
}

const PRODUCT_SELECT: &str = "SELECT p.product_id, p.name, p.category, p.price, p.discount, \
     p.discounted_price, p.offer_expiration_date, p.images, p.date_published, \
     p.business_id, b.owner_id \
     FROM products p JOIN businesses b ON b.business_id = p.business_id";

/// Repository for product database operations.
pub struct ProductRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ProductRepository<'a> {
    /// Create a new product repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Create a product under an existing business.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn create(&self, new: &NewProduct) -> Result<Product, RepositoryError> {
        let id: i32 = sqlx::query_scalar(
            "INSERT INTO products (name, category, price, offer_expiration_date, business_id) \
             VALUES ($1, $2, $3, $4, $5) \
             RETURNING product_id",
        )
        .bind(&new.name)
        .bind(&new.category)
        .bind(new.price)
        .bind(new.offer_expiration_date)
        .bind(new.business_id.as_i32())
        .fetch_one(self.pool)
        .await?;

        self.get(ProductId::new(id))
            .await?
            .ok_or(RepositoryError::NotFound)
    }

    /// Get a product by ID with its resolved owner.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        let row = sqlx::query_as::<_, ProductRow>(&format!(
            "{PRODUCT_SELECT} WHERE p.product_id = $1"
        ))
        .bind(id.as_i32())
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(ProductRow::into_domain))
    }

    /// Public listing with optional filters. Not ownership-scoped.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self, filters: &ProductFilters) -> Result<Vec<Product>, RepositoryError> {
        let mut query = QueryBuilder::<Postgres>::new(format!("{PRODUCT_SELECT} WHERE 1=1"));

        if let Some(name) = &filters.name {
            query.push(" AND p.name ILIKE ");
            query.push_bind(format!("%{name}%"));
        }
        if let Some(category) = &filters.category {
            query.push(" AND p.category = ");
            query.push_bind(category);
        }
        if let Some(price_le) = filters.price_le {
            query.push(" AND p.price <= ");
            query.push_bind(price_le);
        }
        if let Some(price_ge) = filters.price_ge {
            query.push(" AND p.price >= ");
            query.push_bind(price_ge);
        }
        query.push(" ORDER BY p.product_id");

        let rows: Vec<ProductRow> = query.build_query_as().fetch_all(self.pool).await?;
        Ok(rows.into_iter().map(ProductRow::into_domain).collect())
    }

    /// Persist editable fields of a product.
    ///
    /// Runs as a single UPDATE inside a transaction with the row locked, so
    /// the price/discount/discounted_price triple is written as one unit and
    /// concurrent writers cannot interleave a partial pricing state.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product doesn't exist.
    pub async fn update(&self, product: &Product) -> Result<(), RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let locked: Option<i32> =
            sqlx::query_scalar("SELECT product_id FROM products WHERE product_id = $1 FOR UPDATE")
                .bind(product.id.as_i32())
                .fetch_optional(&mut *tx)
                .await?;

        if locked.is_none() {
            return Err(RepositoryError::NotFound);
        }

        sqlx::query(
            "UPDATE products \
             SET name = $1, category = $2, price = $3, discount = $4, \
                 discounted_price = $5, offer_expiration_date = $6 \
             WHERE product_id = $7",
        )
        .bind(&product.name)
        .bind(&product.category)
        .bind(product.pricing.price())
        .bind(product.pricing.discount())
        .bind(product.pricing.discounted_price())
        .bind(product.offer_expiration_date)
        .bind(product.id.as_i32())
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(())
    }

    /// Replace a product's stored image path list.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product doesn't exist.
    pub async fn set_images(
        &self,
        id: ProductId,
        images: &[String],
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query("UPDATE products SET images = $1 WHERE product_id = $2")
            .bind(images)
            .bind(id.as_i32())
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    /// Delete a product.
    ///
    /// Returns `false` if no row matched.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn delete(&self, id: ProductId) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM products WHERE product_id = $1")
            .bind(id.as_i32())
            .execute(self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
