//! HTTP route handlers for storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                  - Liveness check
//! GET  /health/ready            - Readiness check (database)
//!
//! # Delivery (JSON, rate limited)
//! POST /api/delivery-estimate   - Distance and ETA from a seller to the buyer
//! ```

pub mod delivery;
pub mod health;

use axum::{
    Router,
    routing::{get, post},
};

use crate::middleware::api_rate_limiter;
use crate::state::AppState;

/// Create the JSON API router (mounted under `/api`).
///
/// Not rate limited; [`routes`] adds the limiter.
pub fn api_routes() -> Router<AppState> {
    Router::new().route("/delivery-estimate", post(delivery::estimate))
}

/// Create the health check router.
pub fn health_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(health::liveness))
        .route("/ready", get(health::readiness))
}

/// Create the full application router.
pub fn routes() -> Router<AppState> {
    Router::new()
        .nest("/health", health_routes())
        .nest("/api", api_routes().layer(api_rate_limiter()))
}
