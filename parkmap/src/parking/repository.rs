//! Repository abstraction over the parking lot backend.

use futures::future::BoxFuture;
use thiserror::Error;

use super::{ParkingLot, SearchParams};

/// Errors raised while retrieving parking lots.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RepositoryError {
    /// Transport failure, non-2xx status, or an envelope with `success=false`.
    #[error("Failed to fetch parking lots: {0}")]
    FetchFailed(String),

    /// The response body was not a parking lot list or envelope.
    #[error("Failed to parse parking lot response: {0}")]
    ParseFailed(String),
}

/// Source of parking lots.
///
/// Methods return boxed futures so the repository can be shared as
/// `Arc<dyn ParkingLotRepository>` by the use cases.
pub trait ParkingLotRepository: Send + Sync {
    /// Fetches every parking lot.
    fn find_all(&self) -> BoxFuture<'_, Result<Vec<ParkingLot>, RepositoryError>>;

    /// Fetches parking lots matching the given filters.
    fn find_by_search_params<'a>(
        &'a self,
        params: &'a SearchParams,
    ) -> BoxFuture<'a, Result<Vec<ParkingLot>, RepositoryError>>;

    /// Looks a lot up by id by scanning the full listing.
    fn find_by_id(&self, id: u64) -> BoxFuture<'_, Result<Option<ParkingLot>, RepositoryError>> {
        Box::pin(async move {
            let lots = self.find_all().await?;
            Ok(lots.into_iter().find(|lot| lot.id == id))
        })
    }
}
