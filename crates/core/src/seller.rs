//! Extraction of coordinates from legacy seller address records.
//!
//! Older seller records carry their location inside the free-form address
//! JSON under several spellings. Current records store it in dedicated
//! `latitude`/`longitude` columns; [`parse_seller_coordinates`] exists to
//! migrate the former into the latter and is not consulted when serving
//! estimates.

use serde_json::Value;

use crate::geo::Coordinate;

/// Keys probed for latitude, in priority order.
pub const LATITUDE_KEYS: &[&str] = &["latitude", "lat", "geo_lat"];

/// Keys probed for longitude, in priority order.
pub const LONGITUDE_KEYS: &[&str] = &["longitude", "lng", "lon", "geo_lng"];

/// Find a valid coordinate pair in a seller address record.
///
/// Every combination of the keys in [`LATITUDE_KEYS`] and [`LONGITUDE_KEYS`]
/// is tried in priority order; the first pair that forms a valid
/// [`Coordinate`] wins. Values may be JSON numbers or numeric strings.
///
/// Returns `None` for `null`, non-objects, objects without any recognized
/// key, and objects whose values all fail validation.
///
/// ```
/// use bazaar_core::parse_seller_coordinates;
/// use serde_json::json;
///
/// let legacy = json!({ "city": "Miami", "lat": "25.7617", "lng": -80.1918 });
/// let c = parse_seller_coordinates(&legacy).unwrap();
/// assert!((c.latitude() - 25.7617).abs() < 1e-9);
///
/// assert!(parse_seller_coordinates(&json!({ "lat": 123.0, "lng": 0.0 })).is_none());
/// ```
#[must_use]
pub fn parse_seller_coordinates(address: &Value) -> Option<Coordinate> {
    let fields = address.as_object()?;

    let latitudes: Vec<f64> = LATITUDE_KEYS
        .iter()
        .filter_map(|key| fields.get(*key).and_then(as_degrees))
        .collect();
    let longitudes: Vec<f64> = LONGITUDE_KEYS
        .iter()
        .filter_map(|key| fields.get(*key).and_then(as_degrees))
        .collect();

    latitudes.iter().find_map(|&lat| {
        longitudes
            .iter()
            .find_map(|&lng| Coordinate::new(lat, lng).ok())
    })
}

/// Read a JSON number, or a string holding one, as degrees.
fn as_degrees(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
}
