//! CLI command implementations.

pub mod estimate;
pub mod migrate;
pub mod sellers;
