//! Geographic coordinates and great-circle distance.
//!
//! A [`Coordinate`] can only be constructed from a finite latitude in
//! `[-90, 90]` and a finite longitude in `[-180, 180]`. Anything that holds a
//! `Coordinate` can therefore be fed to [`haversine_km`] without further checks.
//!
//! ## Examples
//!
//! ```
//! use bazaar_core::{Coordinate, haversine_km};
//!
//! let new_york = Coordinate::new(40.7128, -74.0060).unwrap();
//! let boston = Coordinate::new(42.3601, -71.0589).unwrap();
//!
//! let km = haversine_km(new_york, boston);
//! assert!((km - 306.0).abs() < 10.0);
//!
//! assert!(Coordinate::new(91.0, 0.0).is_err());
//! ```

use core::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Mean Earth radius in kilometers.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Valid latitude range in degrees.
pub const LATITUDE_RANGE: core::ops::RangeInclusive<f64> = -90.0..=90.0;

/// Valid longitude range in degrees.
pub const LONGITUDE_RANGE: core::ops::RangeInclusive<f64> = -180.0..=180.0;

/// Errors that can occur when constructing a [`Coordinate`].
#[derive(Error, Debug, Clone, Copy, PartialEq)]
pub enum CoordinateError {
    /// Latitude is NaN or infinite.
    #[error("latitude must be a finite number")]
    NonFiniteLatitude,
    /// Longitude is NaN or infinite.
    #[error("longitude must be a finite number")]
    NonFiniteLongitude,
    /// Latitude is outside `[-90, 90]`.
    #[error("latitude {0} is outside [-90, 90]")]
    LatitudeOutOfRange(f64),
    /// Longitude is outside `[-180, 180]`.
    #[error("longitude {0} is outside [-180, 180]")]
    LongitudeOutOfRange(f64),
}

/// A validated latitude/longitude pair in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawCoordinate")]
pub struct Coordinate {
    latitude: f64,
    longitude: f64,
}

#[derive(Deserialize)]
struct RawCoordinate {
    latitude: f64,
    longitude: f64,
}

impl TryFrom<RawCoordinate> for Coordinate {
    type Error = CoordinateError;

    fn try_from(raw: RawCoordinate) -> Result<Self, Self::Error> {
        Self::new(raw.latitude, raw.longitude)
    }
}

impl Coordinate {
    /// Create a coordinate, validating both components.
    ///
    /// # Errors
    ///
    /// Returns an error if either component is NaN or infinite, or if the
    /// latitude is outside `[-90, 90]` or the longitude outside `[-180, 180]`.
    /// Latitude is checked first.
    pub fn new(latitude: f64, longitude: f64) -> Result<Self, CoordinateError> {
        if !latitude.is_finite() {
            return Err(CoordinateError::NonFiniteLatitude);
        }
        if !LATITUDE_RANGE.contains(&latitude) {
            return Err(CoordinateError::LatitudeOutOfRange(latitude));
        }
        if !longitude.is_finite() {
            return Err(CoordinateError::NonFiniteLongitude);
        }
        if !LONGITUDE_RANGE.contains(&longitude) {
            return Err(CoordinateError::LongitudeOutOfRange(longitude));
        }

        Ok(Self {
            latitude,
            longitude,
        })
    }

    /// Latitude in degrees.
    #[must_use]
    pub const fn latitude(&self) -> f64 {
        self.latitude
    }

    /// Longitude in degrees.
    #[must_use]
    pub const fn longitude(&self) -> f64 {
        self.longitude
    }

    /// Great-circle distance to `other` in kilometers.
    #[must_use]
    pub fn distance_km(&self, other: &Self) -> f64 {
        haversine_km(*self, *other)
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.latitude, self.longitude)
    }
}

impl core::str::FromStr for Coordinate {
    type Err = String;

    /// Parse `"lat,lng"`, e.g. `"25.7617,-80.1918"`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (lat, lng) = s
            .split_once(',')
            .ok_or_else(|| format!("expected LAT,LNG but got {s:?}"))?;
        let lat = lat
            .trim()
            .parse::<f64>()
            .map_err(|e| format!("invalid latitude {lat:?}: {e}"))?;
        let lng = lng
            .trim()
            .parse::<f64>()
            .map_err(|e| format!("invalid longitude {lng:?}: {e}"))?;
        Self::new(lat, lng).map_err(|e| e.to_string())
    }
}

/// Returns `true` iff both values are finite and within the valid ranges.
///
/// This is the precondition gate for every distance computation. Callers
/// that need to know *why* a pair was rejected should use
/// [`Coordinate::new`] instead.
#[must_use]
pub fn validate_coordinates(latitude: f64, longitude: f64) -> bool {
    Coordinate::new(latitude, longitude).is_ok()
}

/// Great-circle distance between two coordinates in kilometers (Haversine).
///
/// Full precision; rounding for display is the caller's concern.
#[must_use]
pub fn haversine_km(from: Coordinate, to: Coordinate) -> f64 {
    let lat1 = from.latitude.to_radians();
    let lat2 = to.latitude.to_radians();
    let d_lat = (to.latitude - from.latitude).to_radians();
    let d_lon = (to.longitude - from.longitude).to_radians();

    let half_lat = (d_lat / 2.0).sin();
    let half_lon = (d_lon / 2.0).sin();
    let a = lat1.cos().mul_add(lat2.cos() * half_lon * half_lon, half_lat * half_lat);

    2.0 * EARTH_RADIUS_KM * a.sqrt().atan2((1.0 - a).sqrt())
}
