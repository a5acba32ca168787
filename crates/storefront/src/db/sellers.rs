//! Seller repository for database operations.
//!
//! Queries are built at runtime with `sqlx::query_as` so the crate compiles
//! without a live database.

use bazaar_core::{Coordinate, SellerId};
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use super::RepositoryError;
use crate::models::seller::Seller;

// =============================================================================
// Internal Row Types
// =============================================================================

/// Internal row type for `PostgreSQL` seller queries.
#[derive(Debug, sqlx::FromRow)]
struct SellerRow {
    id: Uuid,
    name: String,
    address: serde_json::Value,
    latitude: Option<f64>,
    longitude: Option<f64>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<SellerRow> for Seller {
    type Error = RepositoryError;

    fn try_from(row: SellerRow) -> Result<Self, Self::Error> {
        let coordinates = match (row.latitude, row.longitude) {
            (Some(lat), Some(lng)) => Some(Coordinate::new(lat, lng).map_err(|e| {
                RepositoryError::DataCorruption(format!(
                    "invalid coordinates for seller {}: {e}",
                    row.id
                ))
            })?),
            (None, None) => None,
            _ => {
                return Err(RepositoryError::DataCorruption(format!(
                    "seller {} has only one of latitude/longitude",
                    row.id
                )));
            }
        };

        Ok(Self {
            id: SellerId::new(row.id),
            name: row.name,
            address: row.address,
            coordinates,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// Position in the `(created_at, id)` ordering used when paging sellers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SellerCursor {
    pub created_at: DateTime<Utc>,
    pub id: SellerId,
}

impl From<&Seller> for SellerCursor {
    fn from(seller: &Seller) -> Self {
        Self {
            created_at: seller.created_at,
            id: seller.id,
        }
    }
}

const SELLER_COLUMNS: &str =
    "id, name, address, latitude, longitude, created_at, updated_at";

// =============================================================================
// Repository
// =============================================================================

/// Repository for seller database operations.
pub struct SellerRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> SellerRepository<'a> {
    /// Create a new seller repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get a seller by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the stored coordinates are invalid.
    pub async fn get_by_id(&self, id: SellerId) -> Result<Option<Seller>, RepositoryError> {
        let row = sqlx::query_as::<_, SellerRow>(&format!(
            "SELECT {SELLER_COLUMNS} FROM marketplace.seller WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        row.map(TryInto::try_into).transpose()
    }

    /// Create a seller.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn create(
        &self,
        name: &str,
        address: &serde_json::Value,
        coordinates: Option<Coordinate>,
    ) -> Result<Seller, RepositoryError> {
        let row = sqlx::query_as::<_, SellerRow>(&format!(
            r"
            INSERT INTO marketplace.seller (name, address, latitude, longitude)
            VALUES ($1, $2, $3, $4)
            RETURNING {SELLER_COLUMNS}
            "
        ))
        .bind(name)
        .bind(address)
        .bind(coordinates.map(|c| c.latitude()))
        .bind(coordinates.map(|c| c.longitude()))
        .fetch_one(self.pool)
        .await?;

        row.try_into()
    }

    /// List sellers that have no canonical coordinates, oldest first.
    ///
    /// Pass the cursor of the last seller of the previous page as `after`
    /// to continue where it left off.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_missing_coordinates(
        &self,
        after: Option<&SellerCursor>,
        limit: i64,
    ) -> Result<Vec<Seller>, RepositoryError> {
        let rows = sqlx::query_as::<_, SellerRow>(&format!(
            r"
            SELECT {SELLER_COLUMNS}
            FROM marketplace.seller
            WHERE latitude IS NULL
              AND ($1::timestamptz IS NULL OR (created_at, id) > ($1, $2::uuid))
            ORDER BY created_at ASC, id ASC
            LIMIT $3
            "
        ))
        .bind(after.map(|c| c.created_at))
        .bind(after.map(|c| c.id))
        .bind(limit)
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    /// Store the canonical coordinates for a seller.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the seller does not exist.
    /// Returns `RepositoryError::Database` if the update fails.
    pub async fn set_coordinates(
        &self,
        id: SellerId,
        coordinates: Coordinate,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            r"
            UPDATE marketplace.seller
            SET latitude = $2, longitude = $3
            WHERE id = $1
            ",
        )
        .bind(id)
        .bind(coordinates.latitude())
        .bind(coordinates.longitude())
        .execute(self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }

    /// Delete a seller. Returns whether a row was removed.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the delete fails.
    pub async fn delete(&self, id: SellerId) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM marketplace.seller WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
