//! Geocoding client for seller addresses.
//!
//! Talks to a Nominatim-compatible `/search` endpoint. Used by the CLI to
//! backfill seller coordinates; estimate requests never geocode.

use std::time::Duration;

use bazaar_core::Coordinate;
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use serde::Deserialize;
use thiserror::Error;
use tracing::instrument;

use crate::config::GeocodingConfig;
use crate::models::SellerAddress;

/// Per-request timeout for geocoding lookups.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Errors that can occur when interacting with the geocoding API.
#[derive(Debug, Error)]
pub enum GeocodingError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// API returned an error response.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// The query has neither a city nor a postal code.
    #[error("address needs a city or postal code to geocode")]
    InsufficientAddress,

    /// Failed to parse response.
    #[error("Parse error: {0}")]
    Parse(String),
}

/// A structured geocoding query.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GeocodeQuery {
    pub city: Option<String>,
    pub state: Option<String>,
    pub postal_code: Option<String>,
    pub country: Option<String>,
}

impl From<&SellerAddress> for GeocodeQuery {
    fn from(address: &SellerAddress) -> Self {
        Self {
            city: address.city.clone(),
            state: address.state.clone(),
            postal_code: address.postal_code.clone(),
            country: address.country.clone(),
        }
    }
}

impl GeocodeQuery {
    fn params(&self) -> Vec<(&'static str, &str)> {
        let mut params = vec![("format", "jsonv2"), ("limit", "1")];
        let fields = [
            ("city", &self.city),
            ("state", &self.state),
            ("postalcode", &self.postal_code),
            ("country", &self.country),
        ];
        for (key, value) in fields {
            if let Some(value) = value {
                params.push((key, value.as_str()));
            }
        }
        params
    }
}

/// One search hit. Nominatim returns coordinates as strings.
#[derive(Debug, Deserialize)]
struct SearchResult {
    lat: String,
    lon: String,
    #[serde(default)]
    display_name: Option<String>,
}

/// Geocoding API client.
#[derive(Clone)]
pub struct GeocodingClient {
    client: reqwest::Client,
    search_url: String,
}

impl GeocodingClient {
    /// Create a new geocoding client.
    ///
    /// # Errors
    ///
    /// Returns error if the User-Agent is not a valid header value or the
    /// HTTP client fails to build.
    pub fn new(config: &GeocodingConfig) -> Result<Self, GeocodingError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&config.user_agent)
                .map_err(|e| GeocodingError::Parse(format!("Invalid user agent: {e}")))?,
        );

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        let search_url = format!("{}/search", config.base_url.as_str().trim_end_matches('/'));

        Ok(Self { client, search_url })
    }

    /// Look up the coordinates of a place.
    ///
    /// Returns `Ok(None)` when the service has no match.
    ///
    /// # Errors
    ///
    /// Returns error if the query lacks both city and postal code, the request
    /// fails, the API returns a non-success status, or the returned
    /// coordinates are unparseable or out of range.
    #[instrument(skip(self))]
    pub async fn search(&self, query: &GeocodeQuery) -> Result<Option<Coordinate>, GeocodingError> {
        if query.city.is_none() && query.postal_code.is_none() {
            return Err(GeocodingError::InsufficientAddress);
        }

        let response = self
            .client
            .get(&self.search_url)
            .query(&query.params())
            .send()
            .await?;
        let status = response.status();

        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(GeocodingError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let results: Vec<SearchResult> = response
            .json()
            .await
            .map_err(|e| GeocodingError::Parse(e.to_string()))?;

        let Some(hit) = results.into_iter().next() else {
            tracing::debug!("No geocoding match");
            return Ok(None);
        };

        tracing::debug!(place = ?hit.display_name, "Geocoding match");
        parse_hit(&hit).map(Some)
    }
}

fn parse_hit(hit: &SearchResult) -> Result<Coordinate, GeocodingError> {
    let lat = hit
        .lat
        .trim()
        .parse::<f64>()
        .map_err(|e| GeocodingError::Parse(format!("invalid lat {:?}: {e}", hit.lat)))?;
    let lon = hit
        .lon
        .trim()
        .parse::<f64>()
        .map_err(|e| GeocodingError::Parse(format!("invalid lon {:?}: {e}", hit.lon)))?;

    Coordinate::new(lat, lon).map_err(|e| GeocodingError::Parse(e.to_string()))
}
