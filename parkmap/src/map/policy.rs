//! Camera framing for a rendered marker set.
//!
//! - no markers: the camera is left alone
//! - one marker: center on it at a close zoom level
//! - two or more: fit the camera to the region covering all of them

use super::{MapError, MapId, MapSdk};
use crate::coord::{Bounds, LatLng};

/// Camera change to apply after rendering markers.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CameraPlan {
    Unchanged,
    Center { center: LatLng, level: u8 },
    Fit(Bounds),
}

impl CameraPlan {
    /// Chooses the framing for the given marker positions.
    pub fn for_points(points: &[LatLng], close_level: u8) -> Self {
        match points {
            [] => CameraPlan::Unchanged,
            [only] => CameraPlan::Center {
                center: *only,
                level: close_level,
            },
            _ => Bounds::from_points(points.iter().copied())
                .map(CameraPlan::Fit)
                .unwrap_or(CameraPlan::Unchanged),
        }
    }

    /// Issues the SDK camera calls for this plan.
    pub fn apply(&self, sdk: &dyn MapSdk, map: MapId) -> Result<(), MapError> {
        match *self {
            CameraPlan::Unchanged => Ok(()),
            CameraPlan::Center { center, level } => {
                sdk.set_center(map, center)?;
                sdk.set_level(map, level)
            }
            CameraPlan::Fit(bounds) => sdk.set_bounds(map, bounds),
        }
    }
}
