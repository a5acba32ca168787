//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `STOREFRONT_DATABASE_URL` - `PostgreSQL` connection string (falls back to `DATABASE_URL`)
//!
//! ## Optional
//! - `STOREFRONT_HOST` - Bind address (default: 127.0.0.1)
//! - `STOREFRONT_PORT` - Listen port (default: 3000)
//! - `SELLER_CACHE_TTL_SECS` - Seller origin cache TTL (default: 60)
//! - `GEOCODING_BASE_URL` - Nominatim-compatible API (default: <https://nominatim.openstreetmap.org>)
//! - `GEOCODING_USER_AGENT` - User-Agent sent to the geocoder (default: bazaar-marketplace/0.1)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name
//! - `SENTRY_SAMPLE_RATE` - Error sample rate (default: 1.0)
//! - `SENTRY_TRACES_SAMPLE_RATE` - Transaction sample rate (default: 0.1)
//!
//! ## Read per request
//! - `DELIVERY_AVG_SPEED_KMH` - Average delivery speed (default: 40)
//! - `DELIVERY_PREP_TIME_MINUTES` - Fixed preparation time (default: 15)

use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use bazaar_core::DeliveryModel;
use secrecy::SecretString;
use thiserror::Error;
use url::Url;

const DEFAULT_GEOCODING_BASE_URL: &str = "https://nominatim.openstreetmap.org";
const DEFAULT_GEOCODING_USER_AGENT: &str = "bazaar-marketplace/0.1";

/// Environment variable holding the average delivery speed (km/h).
pub const DELIVERY_SPEED_VAR: &str = "DELIVERY_AVG_SPEED_KMH";
/// Environment variable holding the fixed preparation time (minutes).
pub const DELIVERY_PREP_TIME_VAR: &str = "DELIVERY_PREP_TIME_MINUTES";

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Storefront application configuration.
#[derive(Debug, Clone)]
pub struct StorefrontConfig {
    /// `PostgreSQL` database connection URL (contains password)
    pub database_url: SecretString,
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// How long a seller's origin stays cached
    pub seller_cache_ttl: Duration,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment (e.g., production, staging)
    pub sentry_environment: Option<String>,
    /// Fraction of errors sent to Sentry
    pub sentry_sample_rate: f32,
    /// Fraction of transactions traced
    pub sentry_traces_sample_rate: f32,
}

/// Geocoding service configuration.
#[derive(Debug, Clone)]
pub struct GeocodingConfig {
    /// Base URL of a Nominatim-compatible API
    pub base_url: Url,
    /// User-Agent header (Nominatim's usage policy requires one)
    pub user_agent: String,
}

impl StorefrontConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let database_url = database_url_from_env()?;
        let host = parse_env("STOREFRONT_HOST", "127.0.0.1")?;
        let port = parse_env("STOREFRONT_PORT", "3000")?;
        let seller_cache_ttl = Duration::from_secs(parse_env("SELLER_CACHE_TTL_SECS", "60")?);

        Ok(Self {
            database_url,
            host,
            port,
            seller_cache_ttl,
            sentry_dsn: get_optional_env("SENTRY_DSN"),
            sentry_environment: get_optional_env("SENTRY_ENVIRONMENT"),
            sentry_sample_rate: parse_env("SENTRY_SAMPLE_RATE", "1.0")?,
            sentry_traces_sample_rate: parse_env("SENTRY_TRACES_SAMPLE_RATE", "0.1")?,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

impl GeocodingConfig {
    /// Load geocoding configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidEnvVar` if `GEOCODING_BASE_URL` is not a URL.
    pub fn from_env() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();

        Ok(Self {
            base_url: parse_env("GEOCODING_BASE_URL", DEFAULT_GEOCODING_BASE_URL)?,
            user_agent: get_env_or_default("GEOCODING_USER_AGENT", DEFAULT_GEOCODING_USER_AGENT),
        })
    }
}

/// Resolve the delivery model from the current process environment.
///
/// Called on every estimate request so operators can retune the model
/// without a restart.
#[must_use]
pub fn delivery_model_from_env() -> DeliveryModel {
    delivery_model_from(
        get_optional_env(DELIVERY_SPEED_VAR).as_deref(),
        get_optional_env(DELIVERY_PREP_TIME_VAR).as_deref(),
    )
}

/// Build a delivery model from raw setting values.
///
/// Unset values use the defaults silently. Values that are not non-negative
/// integers, or a zero speed, use the defaults with a warning.
#[must_use]
pub fn delivery_model_from(speed_kmh: Option<&str>, prep_time_minutes: Option<&str>) -> DeliveryModel {
    let speed = parse_setting(
        DELIVERY_SPEED_VAR,
        speed_kmh,
        DeliveryModel::DEFAULT_SPEED_KMH,
    );
    let prep = parse_setting(
        DELIVERY_PREP_TIME_VAR,
        prep_time_minutes,
        DeliveryModel::DEFAULT_PREP_TIME_MINUTES,
    );

    DeliveryModel::new(speed, prep).unwrap_or_else(|e| {
        tracing::warn!(var = DELIVERY_SPEED_VAR, error = %e, "Using default delivery speed");
        DeliveryModel::new(DeliveryModel::DEFAULT_SPEED_KMH, prep).unwrap_or_default()
    })
}

fn parse_setting(var: &str, raw: Option<&str>, default: u32) -> u32 {
    let Some(raw) = raw else {
        return default;
    };
    raw.trim().parse::<u32>().unwrap_or_else(|e| {
        tracing::warn!(var, value = raw, error = %e, default, "Invalid delivery setting, using default");
        default
    })
}

/// Get the database URL with fallback to generic `DATABASE_URL` (used by Fly.io postgres attach).
///
/// # Errors
///
/// Returns `ConfigError::MissingEnvVar` if neither variable is set.
pub fn database_url_from_env() -> Result<SecretString, ConfigError> {
    const PRIMARY_KEY: &str = "STOREFRONT_DATABASE_URL";

    if let Ok(value) = std::env::var(PRIMARY_KEY) {
        return Ok(SecretString::from(value));
    }
    if let Ok(value) = std::env::var("DATABASE_URL") {
        return Ok(SecretString::from(value));
    }
    Err(ConfigError::MissingEnvVar(PRIMARY_KEY.to_string()))
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get an optional environment variable.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Parse an environment variable, falling back to `default` when unset.
fn parse_env<T>(key: &str, default: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    get_env_or_default(key, default)
        .parse::<T>()
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
}
