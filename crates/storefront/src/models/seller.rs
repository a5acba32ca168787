//! Seller domain types.
//!
//! These types represent validated domain objects separate from database row types.

use bazaar_core::{Coordinate, SellerId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A marketplace seller (domain type).
#[derive(Debug, Clone)]
pub struct Seller {
    /// Unique seller ID.
    pub id: SellerId,
    /// Display name shown to buyers.
    pub name: String,
    /// Address as entered by the seller, including any legacy keys.
    pub address: serde_json::Value,
    /// Delivery origin. `None` until the seller has been geocoded.
    pub coordinates: Option<Coordinate>,
    /// When the seller was created.
    pub created_at: DateTime<Utc>,
    /// When the seller was last updated.
    pub updated_at: DateTime<Utc>,
}

impl Seller {
    /// The typed postal fields of [`Seller::address`].
    ///
    /// Missing or mistyped fields come back as `None`.
    #[must_use]
    pub fn postal_address(&self) -> SellerAddress {
        SellerAddress::from_json(&self.address)
    }

    /// The part of the seller needed to serve delivery estimates.
    #[must_use]
    pub fn origin(&self) -> SellerOrigin {
        SellerOrigin {
            name: self.name.clone(),
            coordinates: self.coordinates,
        }
    }
}

/// Postal fields of a seller address.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SellerAddress {
    pub street: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub postal_code: Option<String>,
    pub country: Option<String>,
}

impl SellerAddress {
    /// Read postal fields from address JSON, keeping whatever is well-formed.
    #[must_use]
    pub fn from_json(value: &serde_json::Value) -> Self {
        let field = |key: &str| {
            value
                .get(key)
                .and_then(serde_json::Value::as_str)
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(ToOwned::to_owned)
        };

        Self {
            street: field("street"),
            city: field("city"),
            state: field("state"),
            postal_code: field("postal_code").or_else(|| field("zip")),
            country: field("country"),
        }
    }

    /// Whether there is enough to geocode: a city or a postal code.
    #[must_use]
    pub const fn is_geocodable(&self) -> bool {
        self.city.is_some() || self.postal_code.is_some()
    }
}

/// Name and delivery origin of a seller, as cached for estimates.
#[derive(Debug, Clone, PartialEq)]
pub struct SellerOrigin {
    pub name: String,
    pub coordinates: Option<Coordinate>,
}
