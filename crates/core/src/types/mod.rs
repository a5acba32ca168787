//! Identifier types for Bazaar.

pub mod id;

pub use id::*;
