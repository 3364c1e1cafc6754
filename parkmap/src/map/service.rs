//! Map service abstraction consumed by the use cases.

use std::sync::Arc;

use futures::future::BoxFuture;

use super::{MapError, Viewport};
use crate::coord::LatLng;
use crate::parking::ParkingLot;

/// Options for [`MapService::display_markers`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MarkerOptions {
    /// Move the camera to frame the rendered markers (default: true).
    pub fit_bounds: bool,
}

impl Default for MarkerOptions {
    fn default() -> Self {
        Self { fit_bounds: true }
    }
}

/// Callback invoked with the settled viewport after the user stops moving the map.
pub type ViewportCallback = Arc<dyn Fn(Viewport) + Send + Sync>;

/// A map surface that can show parking lots.
///
/// The use cases only see this trait, never a concrete SDK.
pub trait MapService: Send + Sync {
    /// Creates the map inside `container_id`, centered on `center`.
    ///
    /// Any previous map held by the service is replaced.
    fn initialize<'a>(
        &'a self,
        container_id: &'a str,
        center: LatLng,
    ) -> BoxFuture<'a, Result<(), MapError>>;

    /// Replaces the rendered markers with one marker per lot with a valid location.
    fn display_markers(&self, lots: &[ParkingLot], options: MarkerOptions)
        -> Result<(), MapError>;

    /// Removes every rendered marker and overlay; a no-op when none exist.
    fn clear_markers(&self);

    /// Registers the single debounced viewport listener, replacing any previous one.
    fn on_viewport_changed(&self, callback: ViewportCallback) -> Result<(), MapError>;

    fn remove_viewport_listener(&self);
}
