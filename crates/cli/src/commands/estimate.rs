//! Offline delivery estimate.
//!
//! ```bash
//! bazaar estimate --from 25.7617,-80.1918 --to 26.1224,-80.1373 --speed 30
//! ```

use bazaar_core::{Coordinate, DeliveryModel, DeliveryModelError};

/// Print the distance and estimated delivery time between two points.
///
/// # Errors
///
/// Returns `DeliveryModelError::ZeroSpeed` if `speed_kmh` is zero.
pub fn run(
    from: Coordinate,
    to: Coordinate,
    speed_kmh: u32,
    prep_time_minutes: u32,
) -> Result<(), DeliveryModelError> {
    let model = DeliveryModel::new(speed_kmh, prep_time_minutes)?;
    let estimate = model.estimate(from, to);

    #[allow(clippy::print_stdout)]
    {
        println!("from:      {from}");
        println!("to:        {to}");
        println!("distance:  {:.2} km", estimate.distance_km);
        println!(
            "estimate:  {} min ({} km/h, {} min prep)",
            estimate.estimated_minutes,
            model.average_speed_kmh(),
            model.prep_time_minutes()
        );
    }

    Ok(())
}
