//! Fetch, validate and render parking lots as one action.

use std::sync::Arc;

use super::list::fetch;
use super::{DisplayError, ExecuteOptions};
use crate::config::DEFAULT_CENTER;
use crate::coord::LatLng;
use crate::map::{MapService, MarkerOptions, DEFAULT_CONTAINER_ID};
use crate::parking::{filter_valid_locations, ParkingLot, ParkingLotRepository, SearchParams};

/// Displays parking lots on a map.
///
/// Errors from the repository or the map are returned as they are; nothing
/// is retried and no partial work is undone here.
#[derive(Clone)]
pub struct DisplayMapMarkers {
    repository: Arc<dyn ParkingLotRepository>,
    map: Arc<dyn MapService>,
    container_id: String,
    center: LatLng,
}

impl DisplayMapMarkers {
    /// Creates the use case with the default container and center.
    pub fn new(repository: Arc<dyn ParkingLotRepository>, map: Arc<dyn MapService>) -> Self {
        Self {
            repository,
            map,
            container_id: DEFAULT_CONTAINER_ID.to_string(),
            center: DEFAULT_CENTER,
        }
    }

    pub fn with_container(mut self, container_id: impl Into<String>) -> Self {
        self.container_id = container_id.into();
        self
    }

    pub fn with_center(mut self, center: LatLng) -> Self {
        self.center = center;
        self
    }

    /// Fetches lots, initializes the map and renders the valid ones.
    ///
    /// Steps, in order:
    /// 1. fetch with `params`, or the full listing when `None`
    /// 2. drop lots without a valid location
    /// 3. initialize the map unless `skip_initialization`
    /// 4. render markers, only if any valid lot remains
    ///
    /// A fetch failure returns before the map is touched. Returns the
    /// rendered lots.
    pub async fn execute(
        &self,
        params: Option<&SearchParams>,
        options: ExecuteOptions,
    ) -> Result<Vec<ParkingLot>, DisplayError> {
        let lots = fetch(self.repository.as_ref(), params).await?;
        let fetched = lots.len();
        let valid = filter_valid_locations(lots);

        if !options.skip_initialization {
            self.map.initialize(&self.container_id, self.center).await?;
        }

        if !valid.is_empty() {
            self.map.display_markers(
                &valid,
                MarkerOptions {
                    fit_bounds: options.fit_bounds,
                },
            )?;
        }

        tracing::info!(
            fetched,
            displayed = valid.len(),
            initialized = !options.skip_initialization,
            "Parking lots displayed"
        );
        Ok(valid)
    }
}
