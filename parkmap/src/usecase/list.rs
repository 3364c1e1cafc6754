//! Filtered parking lot listing.

use std::sync::Arc;

use super::DisplayError;
use crate::parking::{filter_valid_locations, ParkingLot, ParkingLotRepository, SearchParams};

/// Fetches parking lots and keeps the ones that can be placed on a map.
#[derive(Clone)]
pub struct GetParkingLots {
    repository: Arc<dyn ParkingLotRepository>,
}

impl GetParkingLots {
    pub fn new(repository: Arc<dyn ParkingLotRepository>) -> Self {
        Self { repository }
    }

    /// Lists lots matching `params`, or every lot when `params` is `None`.
    ///
    /// Lots without a valid location are dropped; order is preserved.
    pub async fn execute(
        &self,
        params: Option<&SearchParams>,
    ) -> Result<Vec<ParkingLot>, DisplayError> {
        let lots = fetch(self.repository.as_ref(), params).await?;
        Ok(filter_valid_locations(lots))
    }
}

/// Runs the filtered or the full query depending on `params`.
pub(super) async fn fetch(
    repository: &dyn ParkingLotRepository,
    params: Option<&SearchParams>,
) -> Result<Vec<ParkingLot>, DisplayError> {
    let lots = match params {
        Some(params) => repository.find_by_search_params(params).await?,
        None => repository.find_all().await?,
    };
    tracing::debug!(
        count = lots.len(),
        filtered = params.is_some(),
        "Fetched parking lots"
    );
    Ok(lots)
}
