//! Geographic coordinate validation and bounding regions
//!
//! Parking lot locations arrive from the backend as nullable latitude and
//! longitude fields. Only locations inside the standard WGS84 ranges are
//! ever handed to the map SDK.

mod types;

pub use types::{Bounds, LatLng, LocationPoint, MAX_LAT, MAX_LON, MIN_LAT, MIN_LON};

/// Checks whether a latitude/longitude pair is a usable map location.
///
/// # Arguments
///
/// * `lat` - Latitude in degrees, `None` when the source field was null
/// * `lon` - Longitude in degrees, `None` when the source field was null
///
/// # Returns
///
/// `true` iff both values are present, latitude is within -90..=90 and
/// longitude is within -180..=180. NaN never passes.
#[inline]
pub fn is_valid_location(lat: Option<f64>, lon: Option<f64>) -> bool {
    match (lat, lon) {
        (Some(lat), Some(lon)) => {
            (MIN_LAT..=MAX_LAT).contains(&lat) && (MIN_LON..=MAX_LON).contains(&lon)
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_seoul_city_hall_is_valid() {
        assert!(is_valid_location(Some(37.5665), Some(126.978)));
    }

    #[test]
    fn test_boundaries_are_inclusive() {
        assert!(is_valid_location(Some(90.0), Some(180.0)));
        assert!(is_valid_location(Some(-90.0), Some(-180.0)));
    }

    #[test]
    fn test_latitude_out_of_range() {
        assert!(!is_valid_location(Some(100.0), Some(126.978)));
        assert!(!is_valid_location(Some(-90.0001), Some(0.0)));
    }

    #[test]
    fn test_longitude_out_of_range() {
        assert!(!is_valid_location(Some(37.5), Some(180.5)));
    }

    #[test]
    fn test_missing_component() {
        assert!(!is_valid_location(None, Some(126.978)));
        assert!(!is_valid_location(Some(37.5665), None));
        assert!(!is_valid_location(None, None));
    }

    #[test]
    fn test_nan_is_rejected() {
        assert!(!is_valid_location(Some(f64::NAN), Some(0.0)));
        assert!(!is_valid_location(Some(0.0), Some(f64::NAN)));
    }

    proptest! {
        #[test]
        fn prop_valid_iff_within_ranges(lat in -200.0f64..200.0, lon in -400.0f64..400.0) {
            let expected = (-90.0..=90.0).contains(&lat) && (-180.0..=180.0).contains(&lon);
            prop_assert_eq!(is_valid_location(Some(lat), Some(lon)), expected);
            prop_assert_eq!(LocationPoint::new(lat, lon).is_valid(), expected);
        }

        #[test]
        fn prop_missing_component_never_valid(value in any::<f64>()) {
            prop_assert!(!is_valid_location(Some(value), None));
            prop_assert!(!is_valid_location(None, Some(value)));
        }

        #[test]
        fn prop_bounds_contain_every_point(
            points in prop::collection::vec((-90.0f64..=90.0, -180.0f64..=180.0), 1..20)
        ) {
            let points: Vec<LatLng> = points.into_iter().map(|(lat, lng)| LatLng::new(lat, lng)).collect();
            let bounds = Bounds::from_points(points.iter().copied()).unwrap();
            for point in points {
                prop_assert!(bounds.contains(point));
            }
        }
    }
}
