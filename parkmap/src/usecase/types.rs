//! Use case options and errors

use thiserror::Error;

use crate::map::MapError;
use crate::parking::RepositoryError;

/// Options for [`DisplayMapMarkers::execute`](super::DisplayMapMarkers::execute).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExecuteOptions {
    /// Reuse the existing map instead of creating a new one.
    pub skip_initialization: bool,
    /// Frame the rendered markers with the camera.
    pub fit_bounds: bool,
}

impl Default for ExecuteOptions {
    fn default() -> Self {
        Self {
            skip_initialization: false,
            fit_bounds: true,
        }
    }
}

impl ExecuteOptions {
    /// Options for refreshing markers on an already initialized map.
    pub fn refresh() -> Self {
        Self {
            skip_initialization: true,
            ..Self::default()
        }
    }

    pub fn with_fit_bounds(mut self, fit_bounds: bool) -> Self {
        self.fit_bounds = fit_bounds;
        self
    }
}

/// Failure of a display or listing use case.
///
/// Errors from the repository and the map adapter pass through unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DisplayError {
    #[error(transparent)]
    Repository(#[from] RepositoryError),

    #[error(transparent)]
    Map(#[from] MapError),
}
