//! Map SDK abstraction
//!
//! [`MapSdk`] is the surface the adapter needs from an external map SDK
//! namespace: readiness inspection, the SDK's own async init hook, the
//! map/marker/overlay constructors, camera setters and event subscription.
//! Handles returned by the SDK are opaque ids owned by the caller.

use std::sync::Arc;

use futures::future::BoxFuture;
use serde::Serialize;

use super::MapError;
use crate::coord::{Bounds, LatLng};

/// Handle to a map surface bound to a container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MapId(pub u64);

/// Handle to a marker placed on a map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MarkerId(pub u64);

/// Handle to an info overlay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct OverlayId(pub u64);

/// Handle to an event subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(pub u64);

/// Readiness reported by the SDK namespace.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SdkReadyState {
    /// Namespace exists but the SDK has not started initializing.
    NotLoaded,
    /// Initialization is underway.
    Loading,
    /// Constructors are usable.
    Loaded,
    /// A state code the adapter does not know.
    Unknown(u8),
}

impl SdkReadyState {
    /// Maps the SDK's numeric `readyState`.
    pub fn from_code(code: u8) -> Self {
        match code {
            0 => Self::NotLoaded,
            1 => Self::Loading,
            2 => Self::Loaded,
            other => Self::Unknown(other),
        }
    }
}

/// Visible region of a map.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Viewport {
    pub center: LatLng,
    pub level: u8,
    pub bounds: Option<Bounds>,
}

/// Event callback registered with the SDK.
pub type EventHandler = Arc<dyn Fn() + Send + Sync>;

/// External map SDK namespace.
///
/// Calls are synchronous except `load`, which resolves when the SDK invokes
/// its init completion callback.
pub trait MapSdk: Send + Sync {
    /// Whether the SDK namespace exists.
    fn is_available(&self) -> bool;

    fn ready_state(&self) -> SdkReadyState;

    /// Whether the namespace exposes an async `load` hook.
    fn has_load_hook(&self) -> bool;

    /// Whether the map constructor is usable.
    fn has_map_constructor(&self) -> bool;

    /// Runs the SDK's async init; resolves when its completion callback fires.
    fn load(&self) -> BoxFuture<'static, ()>;

    fn create_map(&self, container_id: &str, center: LatLng, level: u8)
        -> Result<MapId, MapError>;

    fn create_marker(&self, map: MapId, position: LatLng, title: &str)
        -> Result<MarkerId, MapError>;

    fn remove_marker(&self, marker: MarkerId);

    fn create_overlay(&self, content: &str) -> Result<OverlayId, MapError>;

    /// Opens `overlay` on `map`, anchored to `anchor`.
    fn open_overlay(&self, map: MapId, overlay: OverlayId, anchor: MarkerId);

    fn close_overlay(&self, overlay: OverlayId);

    fn add_click_listener(&self, marker: MarkerId, handler: EventHandler) -> ListenerId;

    /// Subscribes to every viewport change (pan, zoom) of `map`.
    fn add_viewport_listener(&self, map: MapId, handler: EventHandler) -> ListenerId;

    fn remove_listener(&self, listener: ListenerId);

    fn set_center(&self, map: MapId, center: LatLng) -> Result<(), MapError>;

    fn set_level(&self, map: MapId, level: u8) -> Result<(), MapError>;

    /// Moves the camera so `bounds` is fully visible.
    fn set_bounds(&self, map: MapId, bounds: Bounds) -> Result<(), MapError>;

    fn viewport(&self, map: MapId) -> Option<Viewport>;
}

/// The document hosting the map.
pub trait PageHost: Send + Sync {
    /// Whether a script whose `src` contains `src_fragment` is already present.
    fn has_script(&self, src_fragment: &str) -> bool;

    /// Appends a script tag; resolves on its load (`Ok`) or error (`Err`).
    fn inject_script(&self, src: &str) -> BoxFuture<'static, Result<(), String>>;

    fn remove_script(&self, src: &str);

    fn has_container(&self, id: &str) -> bool;

    /// Origin of the current page, e.g. `http://localhost:5173`.
    fn origin(&self) -> String;

    /// Best-effort HTTP status of `url`, for diagnostics.
    fn probe_status(&self, url: &str) -> BoxFuture<'static, Option<u16>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ready_state_codes() {
        assert_eq!(SdkReadyState::from_code(0), SdkReadyState::NotLoaded);
        assert_eq!(SdkReadyState::from_code(1), SdkReadyState::Loading);
        assert_eq!(SdkReadyState::from_code(2), SdkReadyState::Loaded);
        assert_eq!(SdkReadyState::from_code(7), SdkReadyState::Unknown(7));
    }
}
