//! Business logic services for storefront.
//!
//! # Services
//!
//! - `delivery` - Seller origin lookup and delivery estimates
//! - `geocoding` - Address to coordinate lookups (CLI backfill only)

pub mod delivery;
pub mod geocoding;

pub use delivery::{EstimateError, SellerEstimate, SellerOrigins, estimate_for_seller};
pub use geocoding::{GeocodeQuery, GeocodingClient, GeocodingError};
