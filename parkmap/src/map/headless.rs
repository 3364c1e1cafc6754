//! In-process map SDK and page.
//!
//! [`HeadlessSdk`] and [`HeadlessPage`] implement [`MapSdk`] and
//! [`PageHost`] without a browser. Injecting the SDK script into a headless
//! page exposes the headless SDK namespace, mirroring how the real script
//! defines its global. Map surfaces, markers, overlays and camera calls are
//! recorded so they can be inspected as a [`Scene`].
//!
//! [`HeadlessBehavior`] scripts the failure modes of a real SDK load: script
//! errors with an HTTP status, a namespace that never appears, an init hook
//! that never completes, and so on.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use std::time::Duration;

use futures::future::{self, BoxFuture, FutureExt};
use parking_lot::Mutex;
use serde::Serialize;

use super::{
    EventHandler, ListenerId, MapError, MapId, MapSdk, MarkerId, OverlayId, PageHost,
    SdkReadyState, Viewport,
};
use crate::coord::{Bounds, LatLng};

/// Origin reported by a headless page.
pub const HEADLESS_ORIGIN: &str = "http://localhost";

/// Container present in a new headless page.
pub const DEFAULT_CONTAINER_ID: &str = "map";

/// How the headless SDK reacts while being loaded.
#[derive(Debug, Clone)]
pub struct HeadlessBehavior {
    /// Fail script injection; the status is what a probe of the URL returns.
    pub script_error_status: Option<u16>,
    /// Time between injection and the script's load event.
    pub script_delay: Duration,
    /// Whether a loaded script defines the SDK namespace.
    pub namespace_on_load: bool,
    /// Numeric ready state once the namespace exists.
    pub initial_ready_code: u8,
    pub load_hook: bool,
    /// Whether the init hook ever calls back.
    pub load_completes: bool,
    pub map_constructor: bool,
}

impl Default for HeadlessBehavior {
    fn default() -> Self {
        Self {
            script_error_status: None,
            script_delay: Duration::ZERO,
            namespace_on_load: true,
            initial_ready_code: 0,
            load_hook: true,
            load_completes: true,
            map_constructor: true,
        }
    }
}

/// Camera call recorded by the headless SDK.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CameraOp {
    SetCenter(LatLng),
    SetLevel(u8),
    SetBounds(Bounds),
}

/// A marker as it appears in a [`Scene`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SceneMarker {
    pub title: String,
    pub position: LatLng,
}

/// Snapshot of one headless map surface.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Scene {
    pub container_id: String,
    pub center: LatLng,
    pub level: u8,
    pub fitted_bounds: Option<Bounds>,
    pub markers: Vec<SceneMarker>,
    pub open_overlays: Vec<String>,
}

struct Surface {
    container_id: String,
    center: LatLng,
    level: u8,
    fitted: Option<Bounds>,
}

struct MarkerEntry {
    map: MapId,
    position: LatLng,
    title: String,
}

struct OverlayEntry {
    content: String,
    open_on: Option<(MapId, MarkerId)>,
}

enum Listener {
    Click(MarkerId, EventHandler),
    Viewport(MapId, EventHandler),
}

struct SdkState {
    behavior: HeadlessBehavior,
    available: bool,
    ready_code: u8,
    next_id: u64,
    maps: BTreeMap<MapId, Surface>,
    markers: BTreeMap<MarkerId, MarkerEntry>,
    overlays: BTreeMap<OverlayId, OverlayEntry>,
    listeners: BTreeMap<ListenerId, Listener>,
    camera: Vec<(MapId, CameraOp)>,
    markers_created: usize,
    fail_markers_from: Option<usize>,
}

impl SdkState {
    fn next_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    fn surface_mut(&mut self, map: MapId) -> Result<&mut Surface, MapError> {
        self.maps
            .get_mut(&map)
            .ok_or_else(|| MapError::Sdk(format!("unknown map {}", map.0)))
    }
}

/// In-process implementation of [`MapSdk`].
pub struct HeadlessSdk {
    state: Mutex<SdkState>,
}

impl std::fmt::Debug for HeadlessSdk {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.lock();
        f.debug_struct("HeadlessSdk")
            .field("available", &state.available)
            .field("ready_code", &state.ready_code)
            .field("maps", &state.maps.len())
            .field("markers", &state.markers.len())
            .finish_non_exhaustive()
    }
}

impl HeadlessSdk {
    /// Creates an SDK whose namespace appears once its script is loaded.
    pub fn new(behavior: HeadlessBehavior) -> Self {
        Self {
            state: Mutex::new(SdkState {
                behavior,
                available: false,
                ready_code: 0,
                next_id: 0,
                maps: BTreeMap::new(),
                markers: BTreeMap::new(),
                overlays: BTreeMap::new(),
                listeners: BTreeMap::new(),
                camera: Vec::new(),
                markers_created: 0,
                fail_markers_from: None,
            }),
        }
    }

    pub fn behavior(&self) -> HeadlessBehavior {
        self.state.lock().behavior.clone()
    }

    /// Defines the namespace, as the SDK script does when it runs.
    pub fn expose(&self) {
        let mut state = self.state.lock();
        state.available = true;
        state.ready_code = state.behavior.initial_ready_code;
    }

    pub fn set_available(&self, available: bool) {
        self.state.lock().available = available;
    }

    pub fn set_script_error_status(&self, status: Option<u16>) {
        self.state.lock().behavior.script_error_status = status;
    }

    /// Lets `count` more markers be created, then fails every creation.
    pub fn fail_marker_creation_after(&self, count: usize) {
        let mut state = self.state.lock();
        state.fail_markers_from = Some(state.markers_created + count);
    }

    /// Simulates a click on `marker`; returns `false` if nothing listens.
    pub fn click(&self, marker: MarkerId) -> bool {
        let handlers: Vec<EventHandler> = self
            .state
            .lock()
            .listeners
            .values()
            .filter_map(|listener| match listener {
                Listener::Click(target, handler) if *target == marker => Some(Arc::clone(handler)),
                _ => None,
            })
            .collect();

        for handler in &handlers {
            handler();
        }
        !handlers.is_empty()
    }

    /// Simulates the user panning `map`, firing its viewport listeners.
    pub fn pan_to(&self, map: MapId, center: LatLng) {
        let handlers: Vec<EventHandler> = {
            let mut state = self.state.lock();
            if let Some(surface) = state.maps.get_mut(&map) {
                surface.center = center;
                surface.fitted = None;
            }
            state
                .listeners
                .values()
                .filter_map(|listener| match listener {
                    Listener::Viewport(target, handler) if *target == map => {
                        Some(Arc::clone(handler))
                    }
                    _ => None,
                })
                .collect()
        };

        for handler in handlers {
            handler();
        }
    }

    /// Camera calls made on `map`, oldest first.
    pub fn camera_ops(&self, map: MapId) -> Vec<CameraOp> {
        self.state
            .lock()
            .camera
            .iter()
            .filter(|(target, _)| *target == map)
            .map(|(_, op)| *op)
            .collect()
    }

    /// Live markers across all maps.
    pub fn marker_count(&self) -> usize {
        self.state.lock().markers.len()
    }

    /// Live markers on `map` in creation order.
    pub fn marker_ids(&self, map: MapId) -> Vec<MarkerId> {
        self.state
            .lock()
            .markers
            .iter()
            .filter(|(_, entry)| entry.map == map)
            .map(|(id, _)| *id)
            .collect()
    }

    pub fn open_overlays(&self) -> Vec<OverlayId> {
        self.state
            .lock()
            .overlays
            .iter()
            .filter(|(_, entry)| entry.open_on.is_some())
            .map(|(id, _)| *id)
            .collect()
    }

    pub fn overlay_content(&self, overlay: OverlayId) -> Option<String> {
        self.state
            .lock()
            .overlays
            .get(&overlay)
            .map(|entry| entry.content.clone())
    }

    pub fn listener_count(&self) -> usize {
        self.state.lock().listeners.len()
    }

    /// Snapshot of `map`, `None` if it does not exist.
    pub fn scene(&self, map: MapId) -> Option<Scene> {
        let state = self.state.lock();
        let surface = state.maps.get(&map)?;
        Some(Scene {
            container_id: surface.container_id.clone(),
            center: surface.center,
            level: surface.level,
            fitted_bounds: surface.fitted,
            markers: state
                .markers
                .values()
                .filter(|entry| entry.map == map)
                .map(|entry| SceneMarker {
                    title: entry.title.clone(),
                    position: entry.position,
                })
                .collect(),
            open_overlays: state
                .overlays
                .values()
                .filter(|entry| matches!(entry.open_on, Some((target, _)) if target == map))
                .map(|entry| entry.content.clone())
                .collect(),
        })
    }

    fn record(&self, map: MapId, op: CameraOp) -> Result<(), MapError> {
        let mut state = self.state.lock();
        let surface = state.surface_mut(map)?;
        match op {
            CameraOp::SetCenter(center) => {
                surface.center = center;
                surface.fitted = None;
            }
            CameraOp::SetLevel(level) => surface.level = level,
            CameraOp::SetBounds(bounds) => {
                surface.center = bounds.center();
                surface.fitted = Some(bounds);
            }
        }
        state.camera.push((map, op));
        Ok(())
    }
}

impl MapSdk for HeadlessSdk {
    fn is_available(&self) -> bool {
        self.state.lock().available
    }

    fn ready_state(&self) -> SdkReadyState {
        SdkReadyState::from_code(self.state.lock().ready_code)
    }

    fn has_load_hook(&self) -> bool {
        self.state.lock().behavior.load_hook
    }

    fn has_map_constructor(&self) -> bool {
        let state = self.state.lock();
        state.available && state.behavior.map_constructor
    }

    fn load(&self) -> BoxFuture<'static, ()> {
        let mut state = self.state.lock();
        if !state.behavior.load_completes {
            return future::pending().boxed();
        }
        state.ready_code = 2;
        future::ready(()).boxed()
    }

    fn create_map(
        &self,
        container_id: &str,
        center: LatLng,
        level: u8,
    ) -> Result<MapId, MapError> {
        let mut state = self.state.lock();
        if !state.available || !state.behavior.map_constructor {
            return Err(MapError::Sdk("map constructor unavailable".to_string()));
        }
        let id = MapId(state.next_id());
        state.maps.insert(
            id,
            Surface {
                container_id: container_id.to_string(),
                center,
                level,
                fitted: None,
            },
        );
        Ok(id)
    }

    fn create_marker(
        &self,
        map: MapId,
        position: LatLng,
        title: &str,
    ) -> Result<MarkerId, MapError> {
        let mut state = self.state.lock();
        state.surface_mut(map)?;
        if matches!(state.fail_markers_from, Some(limit) if state.markers_created >= limit) {
            return Err(MapError::Sdk("marker creation failed".to_string()));
        }
        state.markers_created += 1;
        let id = MarkerId(state.next_id());
        state.markers.insert(
            id,
            MarkerEntry {
                map,
                position,
                title: title.to_string(),
            },
        );
        Ok(id)
    }

    fn remove_marker(&self, marker: MarkerId) {
        self.state.lock().markers.remove(&marker);
    }

    fn create_overlay(&self, content: &str) -> Result<OverlayId, MapError> {
        let mut state = self.state.lock();
        let id = OverlayId(state.next_id());
        state.overlays.insert(
            id,
            OverlayEntry {
                content: content.to_string(),
                open_on: None,
            },
        );
        Ok(id)
    }

    fn open_overlay(&self, map: MapId, overlay: OverlayId, anchor: MarkerId) {
        if let Some(entry) = self.state.lock().overlays.get_mut(&overlay) {
            entry.open_on = Some((map, anchor));
        }
    }

    fn close_overlay(&self, overlay: OverlayId) {
        if let Some(entry) = self.state.lock().overlays.get_mut(&overlay) {
            entry.open_on = None;
        }
    }

    fn add_click_listener(&self, marker: MarkerId, handler: EventHandler) -> ListenerId {
        let mut state = self.state.lock();
        let id = ListenerId(state.next_id());
        state.listeners.insert(id, Listener::Click(marker, handler));
        id
    }

    fn add_viewport_listener(&self, map: MapId, handler: EventHandler) -> ListenerId {
        let mut state = self.state.lock();
        let id = ListenerId(state.next_id());
        state.listeners.insert(id, Listener::Viewport(map, handler));
        id
    }

    fn remove_listener(&self, listener: ListenerId) {
        self.state.lock().listeners.remove(&listener);
    }

    fn set_center(&self, map: MapId, center: LatLng) -> Result<(), MapError> {
        self.record(map, CameraOp::SetCenter(center))
    }

    fn set_level(&self, map: MapId, level: u8) -> Result<(), MapError> {
        self.record(map, CameraOp::SetLevel(level))
    }

    fn set_bounds(&self, map: MapId, bounds: Bounds) -> Result<(), MapError> {
        self.record(map, CameraOp::SetBounds(bounds))
    }

    fn viewport(&self, map: MapId) -> Option<Viewport> {
        let state = self.state.lock();
        let surface = state.maps.get(&map)?;
        Some(Viewport {
            center: surface.center,
            level: surface.level,
            bounds: surface.fitted,
        })
    }
}

struct PageState {
    scripts: Vec<String>,
    injections: usize,
    containers: BTreeSet<String>,
    origin: String,
}

/// In-process implementation of [`PageHost`].
pub struct HeadlessPage {
    sdk: Arc<HeadlessSdk>,
    state: Mutex<PageState>,
}

impl HeadlessPage {
    /// Creates a page with a single `map` container.
    pub fn new(sdk: Arc<HeadlessSdk>) -> Self {
        Self {
            sdk,
            state: Mutex::new(PageState {
                scripts: Vec::new(),
                injections: 0,
                containers: BTreeSet::from([DEFAULT_CONTAINER_ID.to_string()]),
                origin: HEADLESS_ORIGIN.to_string(),
            }),
        }
    }

    pub fn with_origin(self, origin: impl Into<String>) -> Self {
        self.state.lock().origin = origin.into();
        self
    }

    pub fn add_container(&self, id: impl Into<String>) {
        self.state.lock().containers.insert(id.into());
    }

    /// Adds a script tag as if another loader had injected it.
    pub fn preload_script(&self, src: impl Into<String>) {
        self.state.lock().scripts.push(src.into());
    }

    pub fn scripts(&self) -> Vec<String> {
        self.state.lock().scripts.clone()
    }

    /// Number of scripts injected through [`PageHost::inject_script`].
    pub fn injection_count(&self) -> usize {
        self.state.lock().injections
    }
}

impl PageHost for HeadlessPage {
    fn has_script(&self, src_fragment: &str) -> bool {
        self.state
            .lock()
            .scripts
            .iter()
            .any(|src| src.contains(src_fragment))
    }

    fn inject_script(&self, src: &str) -> BoxFuture<'static, Result<(), String>> {
        {
            let mut state = self.state.lock();
            state.scripts.push(src.to_string());
            state.injections += 1;
        }
        let behavior = self.sdk.behavior();
        let sdk = Arc::clone(&self.sdk);

        async move {
            if !behavior.script_delay.is_zero() {
                tokio::time::sleep(behavior.script_delay).await;
            }
            if let Some(status) = behavior.script_error_status {
                return Err(format!("script request answered HTTP {}", status));
            }
            if behavior.namespace_on_load {
                sdk.expose();
            }
            Ok(())
        }
        .boxed()
    }

    fn remove_script(&self, src: &str) {
        self.state.lock().scripts.retain(|s| s != src);
    }

    fn has_container(&self, id: &str) -> bool {
        self.state.lock().containers.contains(id)
    }

    fn origin(&self) -> String {
        self.state.lock().origin.clone()
    }

    fn probe_status(&self, _url: &str) -> BoxFuture<'static, Option<u16>> {
        let status = self.sdk.behavior().script_error_status.or(Some(200));
        future::ready(status).boxed()
    }
}
