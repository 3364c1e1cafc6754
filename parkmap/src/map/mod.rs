//! Map provider integration.
//!
//! This module puts a third-party map SDK behind the [`MapService`] trait:
//!
//! - [`SdkLoader`] loads the SDK script into the page, at most once at a time
//! - [`SdkMapService`] creates the map, renders markers with click overlays
//!   and reports debounced viewport changes
//! - [`CameraPlan`] decides how the camera frames a set of markers
//!
//! The SDK itself is reached through the [`MapSdk`] and [`PageHost`] traits.
//! [`HeadlessSdk`] and [`HeadlessPage`] implement them in-process.
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use parkmap::coord::LatLng;
//! use parkmap::map::{
//!     HeadlessBehavior, HeadlessPage, HeadlessSdk, LoaderConfig, MapService, MapSettings,
//!     SdkLoader, SdkMapService,
//! };
//!
//! let sdk = Arc::new(HeadlessSdk::new(HeadlessBehavior::default()));
//! let page = Arc::new(HeadlessPage::new(Arc::clone(&sdk)));
//! let loader = Arc::new(SdkLoader::new(LoaderConfig::new("app-key"), sdk.clone(), page.clone()));
//! let map = SdkMapService::new(sdk, page, loader, MapSettings::default());
//!
//! map.initialize("map", LatLng::new(37.5665, 126.978)).await?;
//! ```

mod adapter;
mod content;
mod debounce;
mod error;
mod headless;
mod loader;
mod policy;
mod sdk;
mod service;

pub use adapter::{MapSettings, SdkMapService, CLOSE_MAP_LEVEL, DEFAULT_MAP_LEVEL};
pub use content::overlay_html;
pub use debounce::{DebounceTrigger, Debouncer, DEFAULT_VIEWPORT_DEBOUNCE};
pub use error::{LoadDiagnostic, MapError};
pub use headless::{
    CameraOp, HeadlessBehavior, HeadlessPage, HeadlessSdk, Scene, SceneMarker,
    DEFAULT_CONTAINER_ID, HEADLESS_ORIGIN,
};
pub use loader::{LoaderConfig, LoaderState, SdkLoader, DEFAULT_SDK_URL};
pub use policy::CameraPlan;
pub use sdk::{
    EventHandler, ListenerId, MapId, MapSdk, MarkerId, OverlayId, PageHost, SdkReadyState,
    Viewport,
};
pub use service::{MapService, MarkerOptions, ViewportCallback};
