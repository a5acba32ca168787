//! Seller coordinate maintenance.
//!
//! Estimates only read the canonical `latitude`/`longitude` columns. These
//! commands fill them in for sellers that predate those columns or were
//! created without a location.
//!
//! # Usage
//!
//! ```bash
//! # Copy lat/lng found in the address JSON (`lat`, `geo_lat`, `lon`, ...)
//! bazaar sellers normalize
//!
//! # Look up the rest by city, state, postal code and country
//! bazaar sellers geocode --limit 50 --dry-run
//! ```
//!
//! # Environment Variables
//!
//! - `STOREFRONT_DATABASE_URL` - `PostgreSQL` connection string (falls back to `DATABASE_URL`)
//! - `GEOCODING_BASE_URL` - Nominatim-compatible API base URL
//! - `GEOCODING_USER_AGENT` - User-Agent sent with every lookup

use std::time::Duration;

use bazaar_core::{Coordinate, SellerId, parse_seller_coordinates};
use bazaar_storefront::config::{ConfigError, GeocodingConfig, database_url_from_env};
use bazaar_storefront::db::{self, RepositoryError, SellerCursor, SellerRepository};
use bazaar_storefront::models::Seller;
use bazaar_storefront::services::{GeocodeQuery, GeocodingClient, GeocodingError};
use thiserror::Error;

/// Public Nominatim allows one request per second.
const GEOCODE_INTERVAL: Duration = Duration::from_secs(1);

/// Sellers fetched per query while walking the backlog.
const PAGE_SIZE: i64 = 100;

/// Errors that abort a seller maintenance run.
#[derive(Debug, Error)]
pub enum SellerCommandError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Database connection error: {0}")]
    Connect(#[from] sqlx::Error),

    #[error(transparent)]
    Repository(#[from] RepositoryError),

    #[error(transparent)]
    Geocoding(#[from] GeocodingError),
}

/// Outcome counts for a maintenance run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    pub updated: usize,
    pub skipped: usize,
    pub failed: usize,
}

/// Where sellers without coordinates are read from and written back to.
pub trait SellerStore {
    /// Sellers without coordinates after `after`, oldest first.
    async fn missing_coordinates(
        &self,
        after: Option<&SellerCursor>,
        limit: i64,
    ) -> Result<Vec<Seller>, RepositoryError>;

    /// Store a seller's canonical coordinates.
    async fn set_coordinates(
        &self,
        id: SellerId,
        coordinates: Coordinate,
    ) -> Result<(), RepositoryError>;
}

impl SellerStore for SellerRepository<'_> {
    async fn missing_coordinates(
        &self,
        after: Option<&SellerCursor>,
        limit: i64,
    ) -> Result<Vec<Seller>, RepositoryError> {
        self.list_missing_coordinates(after, limit).await
    }

    async fn set_coordinates(
        &self,
        id: SellerId,
        coordinates: Coordinate,
    ) -> Result<(), RepositoryError> {
        Self::set_coordinates(self, id, coordinates).await
    }
}

async fn connect() -> Result<sqlx::PgPool, SellerCommandError> {
    dotenvy::dotenv().ok();
    let database_url = database_url_from_env()?;
    Ok(db::create_pool(&database_url).await?)
}

/// Backfill canonical coordinates from each seller's address JSON.
///
/// # Errors
///
/// Returns error if the database is unreachable or a write fails.
pub async fn normalize(dry_run: bool) -> Result<RunSummary, SellerCommandError> {
    let pool = connect().await?;
    let summary = normalize_sellers(&SellerRepository::new(&pool), dry_run).await?;
    log_summary("normalize", summary);
    Ok(summary)
}

/// Geocode up to `limit` sellers that still have no coordinates.
///
/// # Errors
///
/// Returns error if configuration is invalid, the database is unreachable,
/// or a write fails.
pub async fn geocode(limit: usize, dry_run: bool) -> Result<RunSummary, SellerCommandError> {
    let pool = connect().await?;
    let client = GeocodingClient::new(&GeocodingConfig::from_env()?)?;
    let options = GeocodeOptions {
        limit,
        dry_run,
        interval: GEOCODE_INTERVAL,
    };

    let summary = geocode_sellers(&SellerRepository::new(&pool), &client, options).await?;
    log_summary("geocode", summary);
    Ok(summary)
}

/// Walk every seller without coordinates and copy any usable pair found in
/// its address JSON.
///
/// # Errors
///
/// Returns error if reading or writing the store fails.
pub async fn normalize_sellers<S: SellerStore>(
    store: &S,
    dry_run: bool,
) -> Result<RunSummary, RepositoryError> {
    tracing::info!(dry_run, "Normalizing seller coordinates");

    let mut summary = RunSummary::default();
    let mut cursor = None;
    loop {
        let page = store.missing_coordinates(cursor.as_ref(), PAGE_SIZE).await?;
        let Some(last) = page.last() else {
            break;
        };
        cursor = Some(SellerCursor::from(last));

        for seller in page {
            let Some(coordinates) = parse_seller_coordinates(&seller.address) else {
                tracing::warn!(seller_id = %seller.id, name = %seller.name, "No usable coordinates in address");
                summary.skipped += 1;
                continue;
            };

            store_coordinates(store, &seller, coordinates, dry_run).await?;
            summary.updated += 1;
        }
    }

    Ok(summary)
}

/// Settings for a geocoding run.
#[derive(Debug, Clone, Copy)]
pub struct GeocodeOptions {
    /// Maximum number of geocoding lookups.
    pub limit: usize,
    /// Report what would change without writing.
    pub dry_run: bool,
    /// Pause between lookups.
    pub interval: Duration,
}

/// Geocode sellers without coordinates until `options.limit` lookups have
/// been made or the backlog is exhausted.
///
/// Sellers whose address has neither a city nor a postal code are skipped
/// without a lookup and do not count toward the limit. Lookup failures are
/// logged, counted and skipped.
///
/// # Errors
///
/// Returns error if reading or writing the store fails.
pub async fn geocode_sellers<S: SellerStore>(
    store: &S,
    client: &GeocodingClient,
    options: GeocodeOptions,
) -> Result<RunSummary, RepositoryError> {
    tracing::info!(limit = options.limit, dry_run = options.dry_run, "Geocoding sellers");

    let mut summary = RunSummary::default();
    let mut looked_up = 0;
    let mut cursor = None;
    'pages: while looked_up < options.limit {
        let page = store.missing_coordinates(cursor.as_ref(), PAGE_SIZE).await?;
        let Some(last) = page.last() else {
            break;
        };
        cursor = Some(SellerCursor::from(last));

        for seller in page {
            if looked_up >= options.limit {
                break 'pages;
            }

            let address = seller.postal_address();
            if !address.is_geocodable() {
                tracing::warn!(seller_id = %seller.id, name = %seller.name, "Address has no city or postal code");
                summary.skipped += 1;
                continue;
            }

            if looked_up > 0 {
                tokio::time::sleep(options.interval).await;
            }
            looked_up += 1;

            let coordinates = match client.search(&GeocodeQuery::from(&address)).await {
                Ok(Some(coordinates)) => coordinates,
                Ok(None) => {
                    tracing::warn!(seller_id = %seller.id, name = %seller.name, "No geocoding match");
                    summary.skipped += 1;
                    continue;
                }
                Err(e) => {
                    tracing::warn!(seller_id = %seller.id, error = %e, "Geocoding failed");
                    summary.failed += 1;
                    continue;
                }
            };

            store_coordinates(store, &seller, coordinates, options.dry_run).await?;
            summary.updated += 1;
        }
    }

    Ok(summary)
}

async fn store_coordinates<S: SellerStore>(
    store: &S,
    seller: &Seller,
    coordinates: Coordinate,
    dry_run: bool,
) -> Result<(), RepositoryError> {
    if dry_run {
        tracing::info!(seller_id = %seller.id, %coordinates, "Would set coordinates");
    } else {
        store.set_coordinates(seller.id, coordinates).await?;
        tracing::info!(seller_id = %seller.id, %coordinates, "Set coordinates");
    }
    Ok(())
}

fn log_summary(command: &str, summary: RunSummary) {
    tracing::info!(
        command,
        updated = summary.updated,
        skipped = summary.skipped,
        failed = summary.failed,
        "Seller maintenance complete"
    );
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Mutex;

    use chrono::{DateTime, Duration as Age, Utc};
    use httpmock::prelude::*;
    use serde_json::{Value, json};

    use super::*;

    /// In-memory store ordered like the database query.
    struct MemoryStore {
        sellers: Mutex<Vec<Seller>>,
    }

    impl MemoryStore {
        /// Sellers created one minute apart, in the given order.
        fn new(addresses: Vec<(&str, Value)>) -> Self {
            let start: DateTime<Utc> = "2026-01-01T00:00:00Z".parse().unwrap();
            let sellers = addresses
                .into_iter()
                .enumerate()
                .map(|(i, (name, address))| {
                    let created_at = start + Age::minutes(i64::try_from(i).unwrap());
                    Seller {
                        id: SellerId::generate(),
                        name: name.to_string(),
                        address,
                        coordinates: None,
                        created_at,
                        updated_at: created_at,
                    }
                })
                .collect();
            Self {
                sellers: Mutex::new(sellers),
            }
        }

        fn coordinates_of(&self, name: &str) -> Option<Coordinate> {
            let sellers = self.sellers.lock().unwrap();
            sellers.iter().find(|s| s.name == name).unwrap().coordinates
        }

        fn located(&self) -> usize {
            let sellers = self.sellers.lock().unwrap();
            sellers.iter().filter(|s| s.coordinates.is_some()).count()
        }
    }

    impl SellerStore for MemoryStore {
        async fn missing_coordinates(
            &self,
            after: Option<&SellerCursor>,
            limit: i64,
        ) -> Result<Vec<Seller>, RepositoryError> {
            let key = |created_at: DateTime<Utc>, id: SellerId| (created_at, id.as_uuid());
            let sellers = self.sellers.lock().unwrap();
            let mut page: Vec<Seller> = sellers
                .iter()
                .filter(|s| s.coordinates.is_none())
                .filter(|s| after.is_none_or(|c| key(s.created_at, s.id) > key(c.created_at, c.id)))
                .cloned()
                .collect();
            page.sort_by_key(|s| key(s.created_at, s.id));
            page.truncate(usize::try_from(limit).unwrap());
            Ok(page)
        }

        async fn set_coordinates(
            &self,
            id: SellerId,
            coordinates: Coordinate,
        ) -> Result<(), RepositoryError> {
            let mut sellers = self.sellers.lock().unwrap();
            let seller = sellers
                .iter_mut()
                .find(|s| s.id == id)
                .ok_or(RepositoryError::NotFound)?;
            seller.coordinates = Some(coordinates);
            Ok(())
        }
    }

    fn client_for(server: &MockServer) -> GeocodingClient {
        GeocodingClient::new(&GeocodingConfig {
            base_url: server.base_url().parse().unwrap(),
            user_agent: "bazaar-tests/1.0".to_string(),
        })
        .unwrap()
    }

    fn options(limit: usize) -> GeocodeOptions {
        GeocodeOptions {
            limit,
            dry_run: false,
            interval: Duration::ZERO,
        }
    }

    #[tokio::test]
    async fn test_normalize_copies_legacy_keys() {
        let store = MemoryStore::new(vec![
            ("Legacy Books", json!({ "geo_lat": "42.3601", "geo_lng": "-71.0589" })),
            ("No Location", json!({ "city": "Boston" })),
            ("Modern Shop", json!({ "latitude": 25.7617, "longitude": -80.1918 })),
        ]);

        let summary = normalize_sellers(&store, false).await.unwrap();

        assert_eq!(
            summary,
            RunSummary {
                updated: 2,
                skipped: 1,
                failed: 0
            }
        );
        let books = store.coordinates_of("Legacy Books").unwrap();
        assert!((books.latitude() - 42.3601).abs() < 1e-9);
        assert!(store.coordinates_of("No Location").is_none());
    }

    #[tokio::test]
    async fn test_normalize_dry_run_pages_through_everything() {
        let addresses = (0..250)
            .map(|_| ("Legacy", json!({ "lat": 1.5, "lng": 2.5 })))
            .collect();
        let store = MemoryStore::new(addresses);

        let summary = normalize_sellers(&store, true).await.unwrap();

        assert_eq!(summary.updated, 250);
        assert_eq!(store.located(), 0);
    }

    #[tokio::test]
    async fn test_geocode_limit_counts_lookups_not_skips() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(GET).path("/search").query_param("city", "Miami");
                then.status(200)
                    .json_body(json!([{ "lat": "25.7741728", "lon": "-80.19362" }]));
            })
            .await;

        // Older sellers that can never be geocoded must not starve newer ones.
        let store = MemoryStore::new(vec![
            ("State Only 1", json!({ "state": "FL" })),
            ("State Only 2", json!({ "state": "FL" })),
            ("State Only 3", json!({ "state": "FL" })),
            ("Miami Bakery", json!({ "city": "Miami", "state": "FL" })),
        ]);

        let summary = geocode_sellers(&store, &client_for(&server), options(3))
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(summary.updated, 1);
        assert_eq!(summary.skipped, 3);
        let bakery = store.coordinates_of("Miami Bakery").unwrap();
        assert!((bakery.latitude() - 25.774_172_8).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_geocode_failures_are_skipped_and_counted() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/search").query_param("city", "Nowhere");
                then.status(503).body("overloaded");
            })
            .await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/search").query_param("city", "Atlantis");
                then.status(200).json_body(json!([]));
            })
            .await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/search").query_param("city", "Boston");
                then.status(200)
                    .json_body(json!([{ "lat": "42.3601", "lon": "-71.0589" }]));
            })
            .await;

        let store = MemoryStore::new(vec![
            ("Broken", json!({ "city": "Nowhere" })),
            ("Mythical", json!({ "city": "Atlantis" })),
            ("Boston Books", json!({ "city": "Boston" })),
        ]);

        let summary = geocode_sellers(&store, &client_for(&server), options(10))
            .await
            .unwrap();

        assert_eq!(
            summary,
            RunSummary {
                updated: 1,
                skipped: 1,
                failed: 1
            }
        );
        assert!(store.coordinates_of("Boston Books").is_some());
        assert!(store.coordinates_of("Broken").is_none());
    }

    #[tokio::test]
    async fn test_geocode_stops_at_limit() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(GET).path("/search");
                then.status(200)
                    .json_body(json!([{ "lat": "25.7741728", "lon": "-80.19362" }]));
            })
            .await;

        let store = MemoryStore::new(vec![
            ("First", json!({ "city": "Miami" })),
            ("Second", json!({ "city": "Miami" })),
            ("Third", json!({ "city": "Miami" })),
        ]);

        let summary = geocode_sellers(&store, &client_for(&server), options(2))
            .await
            .unwrap();

        mock.assert_hits_async(2).await;
        assert_eq!(summary.updated, 2);
        assert!(store.coordinates_of("Third").is_none());
    }

    #[tokio::test]
    async fn test_geocode_dry_run_does_not_write() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/search");
                then.status(200)
                    .json_body(json!([{ "lat": "25.7741728", "lon": "-80.19362" }]));
            })
            .await;

        let store = MemoryStore::new(vec![("Miami Bakery", json!({ "city": "Miami" }))]);
        let options = GeocodeOptions {
            dry_run: true,
            ..options(5)
        };

        let summary = geocode_sellers(&store, &client_for(&server), options)
            .await
            .unwrap();

        assert_eq!(summary.updated, 1);
        assert_eq!(store.located(), 0);
    }
}
