//! Delivery-time estimation.
//!
//! One model is used everywhere: a fixed preparation time plus travel time at
//! a constant average speed,
//!
//! ```text
//! minutes = round(prep_time_minutes + distance_km / average_speed_kmh * 60)
//! ```
//!
//! There is no time-of-day, traffic or carrier adjustment. The result is a
//! heuristic shown to shoppers, not a promise.

use core::num::NonZeroU32;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::geo::{Coordinate, haversine_km};

const DEFAULT_SPEED: NonZeroU32 = match NonZeroU32::new(DeliveryModel::DEFAULT_SPEED_KMH) {
    Some(speed) => speed,
    None => panic!("default delivery speed must be non-zero"),
};

/// Errors that can occur when building a [`DeliveryModel`].
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryModelError {
    /// Average speed must be at least 1 km/h.
    #[error("average delivery speed must be greater than zero")]
    ZeroSpeed,
}

/// Parameters of the linear ETA model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeliveryModel {
    average_speed_kmh: NonZeroU32,
    prep_time_minutes: u32,
}

impl DeliveryModel {
    /// Default average delivery speed (km/h).
    pub const DEFAULT_SPEED_KMH: u32 = 40;
    /// Default fixed preparation time (minutes).
    pub const DEFAULT_PREP_TIME_MINUTES: u32 = 15;

    /// Create a model from an average speed and a preparation time.
    ///
    /// # Errors
    ///
    /// Returns [`DeliveryModelError::ZeroSpeed`] if `average_speed_kmh` is 0.
    pub fn new(average_speed_kmh: u32, prep_time_minutes: u32) -> Result<Self, DeliveryModelError> {
        let average_speed_kmh =
            NonZeroU32::new(average_speed_kmh).ok_or(DeliveryModelError::ZeroSpeed)?;
        Ok(Self {
            average_speed_kmh,
            prep_time_minutes,
        })
    }

    /// Average delivery speed in km/h.
    #[must_use]
    pub const fn average_speed_kmh(&self) -> u32 {
        self.average_speed_kmh.get()
    }

    /// Fixed preparation time in minutes.
    #[must_use]
    pub const fn prep_time_minutes(&self) -> u32 {
        self.prep_time_minutes
    }

    /// Estimated minutes to deliver over `distance_km`.
    #[must_use]
    pub fn minutes_for(&self, distance_km: f64) -> u32 {
        calculate_delivery_time(distance_km, self.average_speed_kmh, self.prep_time_minutes)
    }

    /// Distance and ETA from `origin` (the seller) to `destination` (the buyer).
    #[must_use]
    pub fn estimate(&self, origin: Coordinate, destination: Coordinate) -> DeliveryEstimate {
        let distance_km = haversine_km(origin, destination);
        DeliveryEstimate {
            distance_km,
            estimated_minutes: self.minutes_for(distance_km),
        }
    }
}

impl Default for DeliveryModel {
    fn default() -> Self {
        Self {
            average_speed_kmh: DEFAULT_SPEED,
            prep_time_minutes: Self::DEFAULT_PREP_TIME_MINUTES,
        }
    }
}

/// Result of a single estimate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DeliveryEstimate {
    /// Great-circle distance in kilometers, full precision.
    pub distance_km: f64,
    /// Estimated delivery time in whole minutes.
    pub estimated_minutes: u32,
}

impl DeliveryEstimate {
    /// Distance rounded to two decimal places, the precision shown to shoppers.
    #[must_use]
    pub fn distance_km_rounded(&self) -> f64 {
        (self.distance_km * 100.0).round() / 100.0
    }
}

/// `round(prep_time_minutes + distance_km / speed_kmh * 60)`.
///
/// Negative or NaN distances count as zero. The result saturates at
/// `u32::MAX`.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)] // clamped to [0, u32::MAX] first
pub fn calculate_delivery_time(
    distance_km: f64,
    speed_kmh: NonZeroU32,
    prep_time_minutes: u32,
) -> u32 {
    let distance_km = distance_km.max(0.0);
    let travel = distance_km / f64::from(speed_kmh.get()) * 60.0;
    let minutes = (f64::from(prep_time_minutes) + travel).round();
    minutes.min(f64::from(u32::MAX)) as u32
}
