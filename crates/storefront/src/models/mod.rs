//! Domain models for storefront.

pub mod seller;

pub use seller::{Seller, SellerAddress, SellerOrigin};
