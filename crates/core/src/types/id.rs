//! Newtype IDs for type-safe entity references.
//!
//! Marketplace entities are keyed by UUIDs that arrive from clients as
//! strings. Use the `define_id!` macro to create wrappers that keep IDs of
//! different entity types apart and parse them from request input.

use thiserror::Error;

/// Error returned when a string is not a valid entity ID.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid {entity}: {input}")]
pub struct IdParseError {
    /// Name of the entity type (e.g., `SellerId`).
    pub entity: &'static str,
    /// The rejected input, as received.
    pub input: String,
}

/// Macro to define a type-safe ID wrapper.
///
/// Creates a newtype wrapper around [`uuid::Uuid`] with:
/// - `Serialize`/`Deserialize` with `#[serde(transparent)]`
/// - `Debug`, `Clone`, `Copy`, `PartialEq`, `Eq`, `Hash`
/// - `new()`, `as_uuid()`, `FromStr` and `Display`
/// - `sqlx` `Type`, `Encode`, and `Decode` implementations (with `postgres` feature)
///
/// # Example
///
/// ```rust
/// # use bazaar_core::define_id;
/// define_id!(WarehouseId);
///
/// let id: WarehouseId = "9f1c2a4e-3b7d-4c55-8e21-0d6f4b1a7c90".parse().unwrap();
/// assert_eq!(id.to_string(), "9f1c2a4e-3b7d-4c55-8e21-0d6f4b1a7c90");
/// assert!("not-a-uuid".parse::<WarehouseId>().is_err());
/// ```
#[macro_export]
macro_rules! define_id {
    ($name:ident) => {
        #[derive(
            Debug,
            Clone,
            Copy,
            PartialEq,
            Eq,
            Hash,
            ::serde::Serialize,
            ::serde::Deserialize
        )]
        #[serde(transparent)]
        pub struct $name(::uuid::Uuid);

        impl $name {
            /// Wrap an existing UUID.
            #[must_use]
            pub const fn new(id: ::uuid::Uuid) -> Self {
                Self(id)
            }

            /// Generate a fresh random (v4) ID.
            #[must_use]
            pub fn generate() -> Self {
                Self(::uuid::Uuid::new_v4())
            }

            /// Get the underlying UUID.
            #[must_use]
            pub const fn as_uuid(&self) -> ::uuid::Uuid {
                self.0
            }
        }

        impl ::core::fmt::Display for $name {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl ::core::str::FromStr for $name {
            type Err = $crate::types::id::IdParseError;

            fn from_str(s: &str) -> ::core::result::Result<Self, Self::Err> {
                ::uuid::Uuid::parse_str(s.trim())
                    .map(Self)
                    .map_err(|_| $crate::types::id::IdParseError {
                        entity: stringify!($name),
                        input: s.to_owned(),
                    })
            }
        }

        impl From<::uuid::Uuid> for $name {
            fn from(id: ::uuid::Uuid) -> Self {
                Self(id)
            }
        }

        impl From<$name> for ::uuid::Uuid {
            fn from(id: $name) -> Self {
                id.0
            }
        }

        #[cfg(feature = "postgres")]
        impl ::sqlx::Type<::sqlx::Postgres> for $name {
            fn type_info() -> ::sqlx::postgres::PgTypeInfo {
                <::uuid::Uuid as ::sqlx::Type<::sqlx::Postgres>>::type_info()
            }

            fn compatible(ty: &::sqlx::postgres::PgTypeInfo) -> bool {
                <::uuid::Uuid as ::sqlx::Type<::sqlx::Postgres>>::compatible(ty)
            }
        }

        #[cfg(feature = "postgres")]
        impl<'r> ::sqlx::Decode<'r, ::sqlx::Postgres> for $name {
            fn decode(
                value: ::sqlx::postgres::PgValueRef<'r>,
            ) -> ::core::result::Result<Self, ::sqlx::error::BoxDynError> {
                let id = <::uuid::Uuid as ::sqlx::Decode<::sqlx::Postgres>>::decode(value)?;
                Ok(Self(id))
            }
        }

        #[cfg(feature = "postgres")]
        impl ::sqlx::Encode<'_, ::sqlx::Postgres> for $name {
            fn encode_by_ref(
                &self,
                buf: &mut ::sqlx::postgres::PgArgumentBuffer,
            ) -> ::std::result::Result<::sqlx::encode::IsNull, ::sqlx::error::BoxDynError> {
                <::uuid::Uuid as ::sqlx::Encode<::sqlx::Postgres>>::encode_by_ref(&self.0, buf)
            }
        }
    };
}

define_id!(SellerId);

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_seller_id_parses_and_displays() {
        let raw = "3f0e8a52-1d4b-4c6e-9a7f-2b5c8d1e0f34";
        let id: SellerId = raw.parse().unwrap();
        assert_eq!(id.to_string(), raw);
    }

    #[test]
    fn test_seller_id_trims_whitespace() {
        let id: SellerId = "  3f0e8a52-1d4b-4c6e-9a7f-2b5c8d1e0f34 ".parse().unwrap();
        assert_eq!(id.to_string(), "3f0e8a52-1d4b-4c6e-9a7f-2b5c8d1e0f34");
    }

    #[test]
    fn test_seller_id_rejects_garbage() {
        let err = "seller-42".parse::<SellerId>().unwrap_err();
        assert_eq!(err.entity, "SellerId");
        assert_eq!(err.input, "seller-42");
        assert_eq!(err.to_string(), "invalid SellerId: seller-42");
    }

    #[test]
    fn test_seller_id_serde_is_transparent() {
        let id = SellerId::generate();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, format!("\"{id}\""));
        let back: SellerId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }
}
