//! Location filtering applied before anything reaches the map.

use super::ParkingLot;

/// Keeps only lots with a valid location, preserving input order.
pub fn filter_valid_locations(lots: Vec<ParkingLot>) -> Vec<ParkingLot> {
    let total = lots.len();
    let valid: Vec<ParkingLot> = lots
        .into_iter()
        .filter(ParkingLot::has_valid_location)
        .collect();

    if valid.len() < total {
        tracing::debug!(
            total,
            dropped = total - valid.len(),
            "Dropped parking lots with invalid locations"
        );
    }
    valid
}
