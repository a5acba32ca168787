//! Integration tests for seller persistence.
//!
//! These tests require a migrated `PostgreSQL` database (`bazaar migrate`).

use bazaar_core::{Coordinate, SellerId, parse_seller_coordinates};
use bazaar_integration_tests::connect;
use bazaar_storefront::db::{RepositoryError, SellerRepository};
use serde_json::json;

#[tokio::test]
#[ignore = "Requires a migrated PostgreSQL database"]
async fn test_seller_lifecycle() {
    let pool = connect().await.expect("Failed to connect to database");
    let repo = SellerRepository::new(&pool);

    let address = json!({ "city": "Miami", "state": "FL", "country": "US" });
    let seller = repo
        .create("Integration Bakery", &address, None)
        .await
        .expect("Failed to create seller");
    assert!(seller.coordinates.is_none());

    let missing = repo
        .list_missing_coordinates(None, 10_000)
        .await
        .expect("Failed to list sellers");
    assert!(missing.iter().any(|s| s.id == seller.id));

    let miami = Coordinate::new(25.7617, -80.1918).expect("valid coordinate");
    repo.set_coordinates(seller.id, miami)
        .await
        .expect("Failed to set coordinates");

    let fetched = repo
        .get_by_id(seller.id)
        .await
        .expect("Failed to fetch seller")
        .expect("Seller should exist");
    assert_eq!(fetched.coordinates, Some(miami));
    assert_eq!(fetched.postal_address().city.as_deref(), Some("Miami"));

    assert!(repo.delete(seller.id).await.expect("Failed to delete seller"));
    assert!(repo.get_by_id(seller.id).await.expect("query").is_none());
}

#[tokio::test]
#[ignore = "Requires a migrated PostgreSQL database"]
async fn test_set_coordinates_unknown_seller() {
    let pool = connect().await.expect("Failed to connect to database");
    let repo = SellerRepository::new(&pool);
    let miami = Coordinate::new(25.7617, -80.1918).expect("valid coordinate");

    let err = repo
        .set_coordinates(SellerId::generate(), miami)
        .await
        .expect_err("Unknown seller should not update");
    assert!(matches!(err, RepositoryError::NotFound));
}

#[tokio::test]
#[ignore = "Requires a migrated PostgreSQL database"]
async fn test_legacy_address_coordinates_normalize() {
    let pool = connect().await.expect("Failed to connect to database");
    let repo = SellerRepository::new(&pool);

    let address = json!({ "city": "Boston", "geo_lat": "42.3601", "geo_lng": "-71.0589" });
    let seller = repo
        .create("Legacy Books", &address, None)
        .await
        .expect("Failed to create seller");

    let coordinates = parse_seller_coordinates(&seller.address).expect("legacy keys parse");
    repo.set_coordinates(seller.id, coordinates)
        .await
        .expect("Failed to set coordinates");

    let fetched = repo.get_by_id(seller.id).await.expect("query").expect("exists");
    let stored = fetched.coordinates.expect("coordinates stored");
    assert!((stored.latitude() - 42.3601).abs() < 1e-9);
    assert!((stored.longitude() + 71.0589).abs() < 1e-9);

    repo.delete(seller.id).await.expect("cleanup");
}
