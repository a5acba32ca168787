//! Bazaar Core - Shared types library.
//!
//! This crate provides the pure pieces used across all Bazaar components:
//! - `storefront` - Buyer-facing HTTP API (delivery estimates)
//! - `cli` - Command-line tools for migrations and seller maintenance
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no database
//! access, no HTTP clients. Everything here is synchronous and side-effect free.
//!
//! # Modules
//!
//! - [`geo`] - Validated coordinates and Haversine distance
//! - [`delivery`] - The linear speed/preparation-time ETA model
//! - [`seller`] - Extraction of coordinates from legacy seller address JSON
//! - [`types`] - Newtype IDs

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod delivery;
pub mod geo;
pub mod seller;
pub mod types;

pub use delivery::{DeliveryEstimate, DeliveryModel, DeliveryModelError, calculate_delivery_time};
pub use geo::{Coordinate, CoordinateError, EARTH_RADIUS_KM, haversine_km, validate_coordinates};
pub use seller::parse_seller_coordinates;
pub use types::*;
