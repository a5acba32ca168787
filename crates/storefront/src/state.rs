//! Application state shared across handlers.

use std::sync::Arc;

use bazaar_core::DeliveryModel;
use sqlx::PgPool;

use crate::config::{StorefrontConfig, delivery_model_from_env};
use crate::services::SellerOrigins;

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// shared resources like database connections and the seller origin cache.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    pool: PgPool,
    seller_origins: SellerOrigins,
}

impl AppState {
    /// Create a new application state.
    ///
    /// # Arguments
    ///
    /// * `config` - Storefront configuration
    /// * `pool` - `PostgreSQL` connection pool
    #[must_use]
    pub fn new(config: &StorefrontConfig, pool: PgPool) -> Self {
        let seller_origins = SellerOrigins::new(pool.clone(), config.seller_cache_ttl);

        Self {
            inner: Arc::new(AppStateInner {
                pool,
                seller_origins,
            }),
        }
    }

    /// Get a reference to the database connection pool.
    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.inner.pool
    }

    /// Get the cached seller origin lookup.
    #[must_use]
    pub fn seller_origins(&self) -> &SellerOrigins {
        &self.inner.seller_origins
    }

    /// The delivery model in effect for this request.
    ///
    /// Read from the environment on every call.
    #[must_use]
    pub fn delivery_model(&self) -> DeliveryModel {
        delivery_model_from_env()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
impl AppState {
    /// State whose pool points at a closed port, so every query fails fast.
    pub(crate) fn unconnected() -> Self {
        use std::time::Duration;

        use secrecy::SecretString;
        use sqlx::postgres::PgPoolOptions;

        const URL: &str = "postgres://bazaar@127.0.0.1:1/unreachable";

        let config = StorefrontConfig {
            database_url: SecretString::from(URL),
            host: "127.0.0.1".parse().unwrap(),
            port: 3000,
            seller_cache_ttl: Duration::from_secs(60),
            sentry_dsn: None,
            sentry_environment: None,
            sentry_sample_rate: 1.0,
            sentry_traces_sample_rate: 0.0,
        };
        let pool = PgPoolOptions::new()
            .max_connections(1)
            .acquire_timeout(Duration::from_millis(200))
            .connect_lazy(URL)
            .unwrap();
        Self::new(&config, pool)
    }
}
