//! Delivery estimate API.
//!
//! The buyer's browser posts its geolocation together with the seller being
//! viewed. A failed estimate is a soft failure for the page: the client just
//! omits the delivery-time display.

use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
};
use bazaar_core::{Coordinate, SellerId};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result, add_breadcrumb};
use crate::services::{SellerEstimate, estimate_for_seller};
use crate::state::AppState;

/// Request body for `POST /api/delivery-estimate`.
///
/// Every field is optional at the type level so that a missing field is
/// reported by name instead of as a generic deserialization error.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EstimateRequest {
    pub seller_id: Option<String>,
    pub lat: Option<f64>,
    pub lng: Option<f64>,
}

/// How the buyer location was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EstimateMethod {
    Geolocation,
}

/// Response body for a successful estimate.
#[derive(Debug, Serialize)]
pub struct EstimateResponse {
    /// Distance in kilometers, rounded to two decimal places.
    pub distance_km: f64,
    pub estimated_minutes: u32,
    pub method: EstimateMethod,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seller_name: Option<String>,
}

impl From<SellerEstimate> for EstimateResponse {
    fn from(result: SellerEstimate) -> Self {
        let seller_name = Some(result.seller_name).filter(|name| !name.trim().is_empty());
        Self {
            distance_km: result.estimate.distance_km_rounded(),
            estimated_minutes: result.estimate.estimated_minutes,
            method: EstimateMethod::Geolocation,
            seller_name,
        }
    }
}

/// Validated estimate input.
#[derive(Debug)]
struct EstimateInput {
    seller_id: SellerId,
    buyer: Coordinate,
}

impl TryFrom<EstimateRequest> for EstimateInput {
    type Error = AppError;

    fn try_from(request: EstimateRequest) -> Result<Self> {
        let seller_id = request.seller_id.filter(|id| !id.trim().is_empty());

        let (Some(seller_id), Some(lat), Some(lng)) = (seller_id.as_deref(), request.lat, request.lng)
        else {
            let mut missing = Vec::new();
            if seller_id.is_none() {
                missing.push("sellerId");
            }
            if request.lat.is_none() {
                missing.push("lat");
            }
            if request.lng.is_none() {
                missing.push("lng");
            }
            return Err(AppError::MissingFields(missing));
        };

        let buyer = Coordinate::new(lat, lng)?;
        let seller_id = seller_id
            .parse::<SellerId>()
            .map_err(|e| AppError::BadRequest(e.to_string()))?;

        Ok(Self { seller_id, buyer })
    }
}

/// Estimate delivery distance and time from a seller to the buyer.
///
/// # Errors
///
/// - 400 for a malformed body, missing fields, or a malformed seller ID
/// - 422 for out-of-range coordinates
/// - 404 if the seller does not exist
/// - 409 if the seller has no geocoordinates configured
/// - 500 if the seller lookup fails
pub async fn estimate(
    State(state): State<AppState>,
    payload: std::result::Result<Json<EstimateRequest>, JsonRejection>,
) -> Result<Json<EstimateResponse>> {
    let Json(request) = payload.map_err(|rejection| AppError::BadRequest(rejection.body_text()))?;
    let input = EstimateInput::try_from(request)?;

    let model = state.delivery_model();
    let result =
        estimate_for_seller(state.seller_origins(), input.seller_id, input.buyer, &model).await?;

    tracing::info!(
        seller_id = %input.seller_id,
        distance_km = result.estimate.distance_km,
        estimated_minutes = result.estimate.estimated_minutes,
        speed_kmh = model.average_speed_kmh(),
        prep_minutes = model.prep_time_minutes(),
        "Delivery estimate"
    );
    let seller_id = input.seller_id.to_string();
    add_breadcrumb(
        "delivery",
        "Estimated delivery time",
        Some(&[("seller_id", seller_id.as_str())]),
    );

    Ok(Json(result.into()))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::{
        Router,
        body::Body,
        http::{Request, StatusCode, header},
    };
    use serde_json::{Value, json};
    use tower::ServiceExt;

    use super::*;
    use crate::models::SellerOrigin;
    use crate::routes::api_routes;

    const SELLER: &str = "5b2f6c1e-8d4a-4f3b-9c7e-1a2b3c4d5e6f";

    fn state() -> AppState {
        AppState::unconnected()
    }

    fn app(state: AppState) -> Router {
        Router::new().nest("/api", api_routes()).with_state(state)
    }

    async fn post(state: AppState, body: &str) -> (StatusCode, Value) {
        let response = app(state)
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/delivery-estimate")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(body.to_owned()))
                    .unwrap(),
            )
            .await
            .unwrap();

        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    async fn seeded(origin: SellerOrigin) -> AppState {
        let state = state();
        state
            .seller_origins()
            .prime(SELLER.parse().unwrap(), origin)
            .await;
        state
    }

    #[tokio::test]
    async fn test_estimate_success() {
        let state = seeded(SellerOrigin {
            name: "Miami Bakery".to_string(),
            coordinates: Some(Coordinate::new(25.7617, -80.1918).unwrap()),
        })
        .await;

        let body = json!({ "sellerId": SELLER, "lat": 26.1224, "lng": -80.1373 }).to_string();
        let (status, body) = post(state, &body).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["distance_km"], json!(40.48));
        assert_eq!(body["estimated_minutes"], json!(76));
        assert_eq!(body["method"], "geolocation");
        assert_eq!(body["seller_name"], "Miami Bakery");
    }

    #[tokio::test]
    async fn test_estimate_omits_blank_seller_name() {
        let state = seeded(SellerOrigin {
            name: String::new(),
            coordinates: Some(Coordinate::new(25.7617, -80.1918).unwrap()),
        })
        .await;

        let body = json!({ "sellerId": SELLER, "lat": 25.7617, "lng": -80.1918 }).to_string();
        let (status, body) = post(state, &body).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["estimated_minutes"], json!(15));
        assert!(body.get("seller_name").is_none());
    }

    #[tokio::test]
    async fn test_missing_fields_are_listed() {
        let (status, body) = post(state(), r#"{ "lat": 25.0 }"#).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Missing required fields: sellerId, lng");
    }

    #[tokio::test]
    async fn test_blank_seller_id_counts_as_missing() {
        let (status, body) = post(state(), r#"{ "sellerId": "  ", "lat": 1, "lng": 2 }"#).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Missing required fields: sellerId");
    }

    #[tokio::test]
    async fn test_null_coordinate_counts_as_missing() {
        let body = json!({ "sellerId": SELLER, "lat": null, "lng": 2.0 }).to_string();
        let (status, body) = post(state(), &body).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Missing required fields: lat");
    }

    #[tokio::test]
    async fn test_out_of_range_coordinates() {
        let body = json!({ "sellerId": SELLER, "lat": 95.0, "lng": 0.0 }).to_string();
        let (status, body) = post(state(), &body).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["error"], "Invalid coordinates: latitude 95 is outside [-90, 90]");

        let body = json!({ "sellerId": SELLER, "lat": 0.0, "lng": -180.5 }).to_string();
        let (status, _) = post(state(), &body).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn test_malformed_seller_id() {
        let (status, body) = post(state(), r#"{ "sellerId": "seller-42", "lat": 1, "lng": 2 }"#).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Bad request: invalid SellerId: seller-42");
    }

    #[tokio::test]
    async fn test_malformed_json() {
        let (status, body) = post(state(), "{ not json").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().starts_with("Bad request:"));

        let (status, _) = post(state(), r#"{ "sellerId": 7, "lat": 1, "lng": 2 }"#).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_seller_without_coordinates() {
        let state = seeded(SellerOrigin {
            name: "Nowhere Goods".to_string(),
            coordinates: None,
        })
        .await;

        let body = json!({ "sellerId": SELLER, "lat": 1.0, "lng": 2.0 }).to_string();
        let (status, body) = post(state, &body).await;

        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["error"], "Seller has no geocoordinates configured");
    }

    #[tokio::test]
    async fn test_lookup_failure_is_internal_error() {
        let body = json!({ "sellerId": SELLER, "lat": 1.0, "lng": 2.0 }).to_string();
        let (status, body) = post(state(), &body).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "Internal server error");
    }

    #[test]
    fn test_response_rounds_distance() {
        let response = EstimateResponse::from(SellerEstimate {
            estimate: bazaar_core::DeliveryEstimate {
                distance_km: 12.345_678,
                estimated_minutes: 34,
            },
            seller_name: "Shop".to_string(),
        });
        assert!((response.distance_km - 12.35).abs() < 1e-9);
        assert_eq!(response.seller_name.as_deref(), Some("Shop"));
    }
}
