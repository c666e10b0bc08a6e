//! Business repository for database operations.

use sqlx::{PgPool, Postgres, QueryBuilder};

use bazaar_core::{BusinessId, UserId};

use super::RepositoryError;
use crate::models::Business;

/// Fields for creating a business. Owner is supplied separately by the
/// handler from the authenticated caller, never from the request body.
#[derive(Debug)]
pub struct NewBusiness {
    pub business_name: String,
    pub city: String,
    pub region: String,
    pub business_description: Option<String>,
}

/// Optional filters for the public business listing. Deserialized straight
/// from the listing query string.
#[derive(Debug, Default, serde::Deserialize)]
pub struct BusinessFilters {
    /// Owner's username.
    pub owner: Option<String>,
    pub city: Option<String>,
    pub region: Option<String>,
}

#[derive(sqlx::FromRow)]
struct BusinessRow {
    business_id: i32,
    business_name: String,
    city: String,
    region: String,
    business_description: Option<String>,
    logo: String,
    owner_id: i32,
}

impl BusinessRow {
    fn into_domain(self) -> Business {
        Business {
            id: BusinessId::new(self.business_id),
            business_name: self.business_name,
            city: self.city,
            region: self.region,
            business_description: self.business_description,
            logo: self.logo,
            owner_id: UserId::new(self.owner_id),
        }
    }
}

const BUSINESS_COLUMNS: &str =
    "business_id, business_name, city, region, business_description, logo, owner_id";

/// Repository for business database operations.
pub struct BusinessRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> BusinessRepository<'a> {
    /// Create a new business repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Whether a business name is already registered.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn name_taken(&self, business_name: &str) -> Result<bool, RepositoryError> {
        let exists: Option<i32> =
            sqlx::query_scalar("SELECT 1 FROM businesses WHERE business_name = $1 LIMIT 1")
                .bind(business_name)
                .fetch_optional(self.pool)
                .await?;
        Ok(exists.is_some())
    }

    /// Create a business owned by `owner_id`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the name raced past the
    /// pre-commit existence check. Returns `RepositoryError::Database` for
    /// other database errors.
    pub async fn create(
        &self,
        new: &NewBusiness,
        owner_id: UserId,
    ) -> Result<Business, RepositoryError> {
        let row = sqlx::query_as::<_, BusinessRow>(
            "INSERT INTO businesses (business_name, city, region, business_description, owner_id) \
             VALUES ($1, $2, $3, $4, $5) \
             RETURNING business_id, business_name, city, region, business_description, logo, owner_id",
        )
        .bind(&new.business_name)
        .bind(&new.city)
        .bind(&new.region)
        .bind(&new.business_description)
        .bind(owner_id.as_i32())
        .fetch_one(self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e
                && db_err.is_unique_violation()
            {
                return RepositoryError::Conflict(format!(
                    "a business named {} already exists",
                    new.business_name
                ));
            }
            RepositoryError::Database(e)
        })?;

        Ok(row.into_domain())
    }

    /// Get a business by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: BusinessId) -> Result<Option<Business>, RepositoryError> {
        let row = sqlx::query_as::<_, BusinessRow>(&format!(
            "SELECT {BUSINESS_COLUMNS} FROM businesses WHERE business_id = $1"
        ))
        .bind(id.as_i32())
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(BusinessRow::into_domain))
    }

    /// Public listing with optional filters. Not ownership-scoped.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self, filters: &BusinessFilters) -> Result<Vec<Business>, RepositoryError> {
        let mut query = QueryBuilder::<Postgres>::new(format!(
            "SELECT {BUSINESS_COLUMNS} FROM businesses WHERE 1=1"
        ));

        if let Some(owner) = &filters.owner {
            query.push(" AND owner_id = (SELECT user_id FROM users WHERE username = ");
            query.push_bind(owner);
            query.push(")");
        }
        if let Some(city) = &filters.city {
            query.push(" AND city = ");
            query.push_bind(city);
        }
        if let Some(region) = &filters.region {
            query.push(" AND region = ");
            query.push_bind(region);
        }
        query.push(" ORDER BY business_id");

        let rows: Vec<BusinessRow> = query.build_query_as().fetch_all(self.pool).await?;
        Ok(rows.into_iter().map(BusinessRow::into_domain).collect())
    }

    /// Persist editable fields of a business. The owner column is never
    /// touched.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the business doesn't exist.
    /// Returns `RepositoryError::Conflict` on a name collision.
    pub async fn update(&self, business: &Business) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            "UPDATE businesses \
             SET business_name = $1, city = $2, region = $3, business_description = $4 \
             WHERE business_id = $5",
        )
        .bind(&business.business_name)
        .bind(&business.city)
        .bind(&business.region)
        .bind(&business.business_description)
        .bind(business.id.as_i32())
        .execute(self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e
                && db_err.is_unique_violation()
            {
                return RepositoryError::Conflict(format!(
                    "a business named {} already exists",
                    business.business_name
                ));
            }
            RepositoryError::Database(e)
        })?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    /// Record a new stored logo path.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the business doesn't exist.
    pub async fn set_logo(&self, id: BusinessId, logo: &str) -> Result<(), RepositoryError> {
        let result = sqlx::query("UPDATE businesses SET logo = $1 WHERE business_id = $2")
            .bind(logo)
            .bind(id.as_i32())
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    /// Delete a business (and, via cascade, its products).
    ///
    /// Returns `false` if no row matched.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn delete(&self, id: BusinessId) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM businesses WHERE business_id = $1")
            .bind(id.as_i32())
            .execute(self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
