//! Delivery estimates for a seller and a buyer location.
//!
//! Seller origins are read from the canonical coordinate columns and kept in a
//! short-lived `moka` cache. Sellers that do not exist are never cached.

use std::time::Duration;

use bazaar_core::{Coordinate, DeliveryEstimate, DeliveryModel, SellerId};
use moka::future::Cache;
use sqlx::PgPool;
use thiserror::Error;
use tracing::{debug, instrument};

use crate::db::{RepositoryError, SellerRepository};
use crate::models::SellerOrigin;

/// Maximum number of cached seller origins.
const ORIGIN_CACHE_CAPACITY: u64 = 10_000;

/// Why no estimate is available.
#[derive(Debug, Error)]
pub enum EstimateError {
    /// No seller with this ID.
    #[error("seller {0} not found")]
    SellerNotFound(SellerId),

    /// The seller exists but has no geocoordinates configured.
    #[error("seller {0} has no geocoordinates configured")]
    SellerMissingCoordinates(SellerId),

    /// Loading the seller failed.
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// An estimate together with the seller it was computed for.
#[derive(Debug, Clone, PartialEq)]
pub struct SellerEstimate {
    pub estimate: DeliveryEstimate,
    pub seller_name: String,
}

/// Cached lookup of seller delivery origins.
#[derive(Clone)]
pub struct SellerOrigins {
    pool: PgPool,
    cache: Cache<SellerId, SellerOrigin>,
}

impl SellerOrigins {
    /// Create a lookup backed by `pool`, caching origins for `ttl`.
    #[must_use]
    pub fn new(pool: PgPool, ttl: Duration) -> Self {
        let cache = Cache::builder()
            .max_capacity(ORIGIN_CACHE_CAPACITY)
            .time_to_live(ttl)
            .build();

        Self { pool, cache }
    }

    /// Get a seller's origin, from cache when possible.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the database lookup fails.
    #[instrument(skip(self), fields(seller_id = %id))]
    pub async fn get(&self, id: SellerId) -> Result<Option<SellerOrigin>, RepositoryError> {
        if let Some(origin) = self.cache.get(&id).await {
            debug!("Cache hit for seller origin");
            return Ok(Some(origin));
        }

        let Some(seller) = SellerRepository::new(&self.pool).get_by_id(id).await? else {
            return Ok(None);
        };

        let origin = seller.origin();
        self.cache.insert(id, origin.clone()).await;
        Ok(Some(origin))
    }

    /// Put an origin into the cache without touching the database.
    pub async fn prime(&self, id: SellerId, origin: SellerOrigin) {
        self.cache.insert(id, origin).await;
    }
}

/// Estimate delivery from a seller to a buyer.
///
/// # Errors
///
/// Returns `EstimateError::SellerNotFound` or
/// `EstimateError::SellerMissingCoordinates` when there is no origin to
/// measure from, and `EstimateError::Repository` if the lookup fails.
pub async fn estimate_for_seller(
    origins: &SellerOrigins,
    seller_id: SellerId,
    buyer: Coordinate,
    model: &DeliveryModel,
) -> Result<SellerEstimate, EstimateError> {
    let origin = origins
        .get(seller_id)
        .await?
        .ok_or(EstimateError::SellerNotFound(seller_id))?;

    estimate_from_origin(seller_id, &origin, buyer, model)
}

/// Estimate delivery from an already loaded seller origin.
///
/// # Errors
///
/// Returns `EstimateError::SellerMissingCoordinates` if the origin has no
/// coordinates.
pub fn estimate_from_origin(
    seller_id: SellerId,
    origin: &SellerOrigin,
    buyer: Coordinate,
    model: &DeliveryModel,
) -> Result<SellerEstimate, EstimateError> {
    let seller_location = origin
        .coordinates
        .ok_or(EstimateError::SellerMissingCoordinates(seller_id))?;

    Ok(SellerEstimate {
        estimate: model.estimate(seller_location, buyer),
        seller_name: origin.name.clone(),
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use sqlx::postgres::PgPoolOptions;

    use super::*;

    fn lazy_pool() -> PgPool {
        PgPoolOptions::new()
            .max_connections(1)
            .acquire_timeout(Duration::from_millis(200))
            .connect_lazy("postgres://bazaar@127.0.0.1:1/unreachable")
            .unwrap()
    }

    fn bakery(coordinates: Option<Coordinate>) -> SellerOrigin {
        SellerOrigin {
            name: "Miami Bakery".to_string(),
            coordinates,
        }
    }

    fn miami() -> Coordinate {
        Coordinate::new(25.7617, -80.1918).unwrap()
    }

    fn fort_lauderdale() -> Coordinate {
        Coordinate::new(26.1224, -80.1373).unwrap()
    }

    #[test]
    fn test_estimate_from_origin() {
        let id = SellerId::generate();
        let result =
            estimate_from_origin(id, &bakery(Some(miami())), fort_lauderdale(), &DeliveryModel::default())
                .unwrap();

        assert_eq!(result.seller_name, "Miami Bakery");
        assert!((result.estimate.distance_km - 40.48).abs() < 0.05);
        // 40.48 km at 40 km/h = 60.7 min, plus 15
        assert_eq!(result.estimate.estimated_minutes, 76);
    }

    #[test]
    fn test_estimate_from_origin_without_coordinates() {
        let id = SellerId::generate();
        let err = estimate_from_origin(id, &bakery(None), miami(), &DeliveryModel::default())
            .unwrap_err();
        assert!(matches!(err, EstimateError::SellerMissingCoordinates(seller) if seller == id));
    }

    #[tokio::test]
    async fn test_estimate_for_seller_uses_cache() {
        let origins = SellerOrigins::new(lazy_pool(), Duration::from_secs(60));
        let id = SellerId::generate();
        origins.prime(id, bakery(Some(miami()))).await;

        let result = estimate_for_seller(&origins, id, miami(), &DeliveryModel::default())
            .await
            .unwrap();

        assert!(result.estimate.distance_km.abs() < f64::EPSILON);
        assert_eq!(result.estimate.estimated_minutes, 15);
    }

    #[tokio::test]
    async fn test_cache_miss_reads_database() {
        let origins = SellerOrigins::new(lazy_pool(), Duration::from_secs(60));
        let id = SellerId::generate();
        origins.prime(SellerId::generate(), bakery(Some(miami()))).await;

        // The pool points nowhere, so a cache miss surfaces as a database error.
        let err = estimate_for_seller(&origins, id, miami(), &DeliveryModel::default())
            .await
            .unwrap_err();
        assert!(matches!(err, EstimateError::Repository(RepositoryError::Database(_))));
    }
}
