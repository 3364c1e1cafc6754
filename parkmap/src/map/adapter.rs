//! [`MapService`] implementation over a [`MapSdk`].
//!
//! The adapter owns the map handle plus every marker, overlay and listener
//! it created. Each render clears the previous one first, so at most one
//! render's markers are on the map at any time. Clicking a marker closes
//! every other overlay before opening its own.

use std::sync::{Arc, Weak};
use std::time::Duration;

use futures::future::BoxFuture;
use parking_lot::Mutex;
use tokio::runtime::Handle;

use super::content::overlay_html;
use super::debounce::{Debouncer, DEFAULT_VIEWPORT_DEBOUNCE};
use super::{
    CameraPlan, ListenerId, MapError, MapId, MapSdk, MapService, MarkerId, MarkerOptions,
    OverlayId, PageHost, SdkLoader, ViewportCallback,
};
use crate::coord::LatLng;
use crate::parking::ParkingLot;

/// Default zoom level of a freshly initialized map.
pub const DEFAULT_MAP_LEVEL: u8 = 5;

/// Zoom level used when framing a single marker.
pub const CLOSE_MAP_LEVEL: u8 = 3;

/// Zoom and debounce settings for the adapter.
#[derive(Debug, Clone)]
pub struct MapSettings {
    pub default_level: u8,
    pub close_level: u8,
    pub viewport_debounce: Duration,
}

impl Default for MapSettings {
    fn default() -> Self {
        Self {
            default_level: DEFAULT_MAP_LEVEL,
            close_level: CLOSE_MAP_LEVEL,
            viewport_debounce: DEFAULT_VIEWPORT_DEBOUNCE,
        }
    }
}

#[derive(Debug)]
struct RenderedMarker {
    marker: MarkerId,
    overlay: OverlayId,
    click: ListenerId,
}

/// An initialized map surface and everything rendered on it.
#[derive(Debug)]
struct MapHandle {
    id: MapId,
    markers: Vec<RenderedMarker>,
    /// Overlays of the current render, shared with the click handlers.
    overlays: Arc<Mutex<Vec<OverlayId>>>,
}

struct ViewportSubscription {
    listener: ListenerId,
    _debouncer: Debouncer,
}

/// Map adapter driving an external map SDK.
pub struct SdkMapService {
    sdk: Arc<dyn MapSdk>,
    page: Arc<dyn PageHost>,
    loader: Arc<SdkLoader>,
    settings: MapSettings,
    handle: Mutex<Option<MapHandle>>,
    viewport: Mutex<Option<ViewportSubscription>>,
}

impl std::fmt::Debug for SdkMapService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SdkMapService")
            .field("settings", &self.settings)
            .field("handle", &self.handle)
            .finish_non_exhaustive()
    }
}

impl SdkMapService {
    /// Creates an adapter; `loader` must be bound to the same SDK and page.
    pub fn new(
        sdk: Arc<dyn MapSdk>,
        page: Arc<dyn PageHost>,
        loader: Arc<SdkLoader>,
        settings: MapSettings,
    ) -> Self {
        Self {
            sdk,
            page,
            loader,
            settings,
            handle: Mutex::new(None),
            viewport: Mutex::new(None),
        }
    }

    /// Handle of the current map, if initialized.
    pub fn map_id(&self) -> Option<MapId> {
        self.handle.lock().as_ref().map(|h| h.id)
    }

    /// Number of markers from the latest render.
    pub fn marker_count(&self) -> usize {
        self.handle
            .lock()
            .as_ref()
            .map(|h| h.markers.len())
            .unwrap_or(0)
    }

    pub fn loader(&self) -> &Arc<SdkLoader> {
        &self.loader
    }

    fn render_marker(
        &self,
        map: MapId,
        lot: &ParkingLot,
        position: LatLng,
        overlays: &Arc<Mutex<Vec<OverlayId>>>,
    ) -> Result<RenderedMarker, MapError> {
        let marker = self.sdk.create_marker(map, position, &lot.name)?;
        let overlay = match self.sdk.create_overlay(&overlay_html(lot)) {
            Ok(overlay) => overlay,
            Err(e) => {
                self.sdk.remove_marker(marker);
                return Err(e);
            }
        };
        overlays.lock().push(overlay);

        let sdk: Weak<dyn MapSdk> = Arc::downgrade(&self.sdk);
        let siblings = Arc::clone(overlays);
        let click = self.sdk.add_click_listener(
            marker,
            Arc::new(move || {
                let Some(sdk) = sdk.upgrade() else {
                    return;
                };
                for other in siblings.lock().iter().filter(|o| **o != overlay) {
                    sdk.close_overlay(*other);
                }
                sdk.open_overlay(map, overlay, marker);
            }),
        );

        Ok(RenderedMarker {
            marker,
            overlay,
            click,
        })
    }

    fn release(&self, markers: Vec<RenderedMarker>, overlays: &Mutex<Vec<OverlayId>>) {
        if markers.is_empty() {
            return;
        }
        for rendered in &markers {
            self.sdk.remove_listener(rendered.click);
            self.sdk.close_overlay(rendered.overlay);
            self.sdk.remove_marker(rendered.marker);
        }
        overlays
            .lock()
            .retain(|o| !markers.iter().any(|m| m.overlay == *o));
        tracing::debug!(count = markers.len(), "Released map markers");
    }
}

impl MapService for SdkMapService {
    fn initialize<'a>(
        &'a self,
        container_id: &'a str,
        center: LatLng,
    ) -> BoxFuture<'a, Result<(), MapError>> {
        Box::pin(async move {
            self.loader.ensure_loaded().await?;

            if !self.sdk.is_available() {
                return Err(MapError::ProviderUnavailable);
            }
            if !self.page.has_container(container_id) {
                return Err(MapError::ContainerNotFound(container_id.to_string()));
            }

            let id = self
                .sdk
                .create_map(container_id, center, self.settings.default_level)?;

            // Listener and markers belong to the replaced map
            self.remove_viewport_listener();
            let previous = self.handle.lock().replace(MapHandle {
                id,
                markers: Vec::new(),
                overlays: Arc::new(Mutex::new(Vec::new())),
            });
            if let Some(previous) = previous {
                self.release(previous.markers, &previous.overlays);
            }

            tracing::info!(
                container = container_id,
                lat = center.lat,
                lng = center.lng,
                level = self.settings.default_level,
                "Map initialized"
            );
            Ok(())
        })
    }

    fn display_markers(
        &self,
        lots: &[ParkingLot],
        options: MarkerOptions,
    ) -> Result<(), MapError> {
        let mut guard = self.handle.lock();
        let handle = guard.as_mut().ok_or(MapError::NotInitialized)?;

        let valid: Vec<(&ParkingLot, LatLng)> = lots
            .iter()
            .filter_map(|lot| lot.location.lat_lng().map(|position| (lot, position)))
            .collect();

        self.release(std::mem::take(&mut handle.markers), &handle.overlays);

        let mut rendered = Vec::with_capacity(valid.len());
        for (lot, position) in &valid {
            match self.render_marker(handle.id, lot, *position, &handle.overlays) {
                Ok(marker) => rendered.push(marker),
                Err(e) => {
                    tracing::error!(
                        lot_id = lot.id,
                        rendered = rendered.len(),
                        error = %e,
                        "Marker render failed, discarding partial render"
                    );
                    self.release(rendered, &handle.overlays);
                    return Err(e);
                }
            }
        }
        handle.markers = rendered;
        let map = handle.id;
        drop(guard);

        if options.fit_bounds {
            let points: Vec<LatLng> = valid.iter().map(|(_, position)| *position).collect();
            CameraPlan::for_points(&points, self.settings.close_level)
                .apply(self.sdk.as_ref(), map)?;
        }

        tracing::info!(
            rendered = valid.len(),
            skipped = lots.len() - valid.len(),
            fit_bounds = options.fit_bounds,
            "Rendered parking lot markers"
        );
        Ok(())
    }

    fn clear_markers(&self) {
        if let Some(handle) = self.handle.lock().as_mut() {
            let markers = std::mem::take(&mut handle.markers);
            self.release(markers, &handle.overlays);
        }
    }

    fn on_viewport_changed(&self, callback: ViewportCallback) -> Result<(), MapError> {
        let map = self.map_id().ok_or(MapError::NotInitialized)?;
        let runtime = Handle::try_current().map_err(|_| {
            MapError::Sdk("viewport listener requires a tokio runtime".to_string())
        })?;

        let sdk: Weak<dyn MapSdk> = Arc::downgrade(&self.sdk);
        let debouncer = Debouncer::spawn(&runtime, self.settings.viewport_debounce, move || {
            if let Some(viewport) = sdk.upgrade().and_then(|sdk| sdk.viewport(map)) {
                callback(viewport);
            }
        });
        let trigger = debouncer.handle();
        let listener = self
            .sdk
            .add_viewport_listener(map, Arc::new(move || trigger.trigger()));

        let previous = self.viewport.lock().replace(ViewportSubscription {
            listener,
            _debouncer: debouncer,
        });
        if let Some(previous) = previous {
            self.sdk.remove_listener(previous.listener);
        }
        tracing::debug!(
            debounce_ms = self.settings.viewport_debounce.as_millis() as u64,
            "Viewport listener registered"
        );
        Ok(())
    }

    fn remove_viewport_listener(&self) {
        if let Some(subscription) = self.viewport.lock().take() {
            self.sdk.remove_listener(subscription.listener);
            tracing::debug!("Viewport listener removed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coord::LocationPoint;
    use crate::map::{CameraOp, HeadlessBehavior, HeadlessPage, HeadlessSdk, LoaderConfig};

    fn lot(id: u64, lat: f64, lng: f64) -> ParkingLot {
        ParkingLot {
            id,
            name: format!("Lot {}", id),
            address: String::new(),
            location: LocationPoint::new(lat, lng),
            capacity: 50,
            available: None,
            category: "public".to_string(),
            operating_hours: None,
            phone: None,
        }
    }

    fn service() -> (SdkMapService, Arc<HeadlessSdk>, Arc<HeadlessPage>) {
        let sdk = Arc::new(HeadlessSdk::new(HeadlessBehavior::default()));
        let page = Arc::new(HeadlessPage::new(Arc::clone(&sdk)));
        let loader = Arc::new(SdkLoader::new(
            LoaderConfig::new("test-key"),
            Arc::clone(&sdk) as Arc<dyn MapSdk>,
            Arc::clone(&page) as Arc<dyn PageHost>,
        ));
        let service = SdkMapService::new(
            Arc::clone(&sdk) as Arc<dyn MapSdk>,
            Arc::clone(&page) as Arc<dyn PageHost>,
            loader,
            MapSettings::default(),
        );
        (service, sdk, page)
    }

    async fn initialized() -> (SdkMapService, Arc<HeadlessSdk>, MapId) {
        let (service, sdk, _page) = service();
        service
            .initialize("map", LatLng::new(37.5665, 126.978))
            .await
            .unwrap();
        let map = service.map_id().unwrap();
        (service, sdk, map)
    }

    #[test]
    fn test_display_before_initialize() {
        let (service, sdk, _page) = service();
        let result = service.display_markers(&[lot(1, 37.5, 127.0)], MarkerOptions::default());
        assert_eq!(result, Err(MapError::NotInitialized));
        assert_eq!(sdk.marker_count(), 0);
    }

    #[test]
    fn test_clear_without_markers_is_noop() {
        let (service, _sdk, _page) = service();
        service.clear_markers();
        assert_eq!(service.marker_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_initialize_loads_sdk_and_creates_map() {
        let (service, sdk, page) = service();
        service
            .initialize("map", LatLng::new(37.5665, 126.978))
            .await
            .unwrap();

        let scene = sdk.scene(service.map_id().unwrap()).unwrap();
        assert_eq!(scene.center, LatLng::new(37.5665, 126.978));
        assert_eq!(scene.level, DEFAULT_MAP_LEVEL);
        assert_eq!(page.injection_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_initialize_missing_container() {
        let (service, _sdk, _page) = service();
        let err = service
            .initialize("sidebar", LatLng::new(37.5, 127.0))
            .await
            .unwrap_err();
        assert_eq!(err, MapError::ContainerNotFound("sidebar".to_string()));
    }

    #[tokio::test(start_paused = true)]
    async fn test_initialize_without_namespace() {
        let (service, sdk, _page) = service();
        service.loader().ensure_loaded().await.unwrap();
        sdk.set_available(false);

        let err = service
            .initialize("map", LatLng::new(37.5, 127.0))
            .await
            .unwrap_err();
        assert_eq!(err, MapError::ProviderUnavailable);
    }

    #[tokio::test(start_paused = true)]
    async fn test_single_marker_centers_camera() {
        let (service, sdk, map) = initialized().await;

        service
            .display_markers(&[lot(1, 37.57, 126.98)], MarkerOptions::default())
            .unwrap();

        assert_eq!(
            sdk.camera_ops(map),
            vec![
                CameraOp::SetCenter(LatLng::new(37.57, 126.98)),
                CameraOp::SetLevel(CLOSE_MAP_LEVEL)
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_many_markers_fit_bounds() {
        let (service, sdk, map) = initialized().await;

        service
            .display_markers(
                &[lot(1, 37.50, 127.00), lot(2, 37.60, 126.90), lot(3, 37.55, 126.95)],
                MarkerOptions::default(),
            )
            .unwrap();

        let ops = sdk.camera_ops(map);
        assert_eq!(ops.len(), 1);
        assert!(matches!(ops[0], CameraOp::SetBounds(_)));
        assert_eq!(sdk.marker_count(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_valid_markers_no_camera_change() {
        let (service, sdk, map) = initialized().await;

        service
            .display_markers(&[lot(1, 100.0, 126.98)], MarkerOptions::default())
            .unwrap();

        assert!(sdk.camera_ops(map).is_empty());
        assert_eq!(sdk.marker_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_fit_bounds_disabled() {
        let (service, sdk, map) = initialized().await;

        service
            .display_markers(
                &[lot(1, 37.50, 127.00), lot(2, 37.60, 126.90)],
                MarkerOptions { fit_bounds: false },
            )
            .unwrap();

        assert!(sdk.camera_ops(map).is_empty());
        assert_eq!(sdk.marker_count(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_second_render_replaces_first() {
        let (service, sdk, map) = initialized().await;

        service
            .display_markers(
                &[lot(1, 37.50, 127.00), lot(2, 37.60, 126.90)],
                MarkerOptions::default(),
            )
            .unwrap();
        service
            .display_markers(&[lot(3, 37.55, 126.95)], MarkerOptions::default())
            .unwrap();

        let titles: Vec<String> = sdk
            .scene(map)
            .unwrap()
            .markers
            .into_iter()
            .map(|m| m.title)
            .collect();
        assert_eq!(titles, vec!["Lot 3".to_string()]);
        assert_eq!(service.marker_count(), 1);
        assert_eq!(sdk.listener_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_click_keeps_single_overlay_open() {
        let (service, sdk, map) = initialized().await;
        service
            .display_markers(
                &[lot(1, 37.50, 127.00), lot(2, 37.60, 126.90)],
                MarkerOptions::default(),
            )
            .unwrap();
        let markers = sdk.marker_ids(map);

        assert!(sdk.click(markers[0]));
        assert_eq!(sdk.open_overlays().len(), 1);

        assert!(sdk.click(markers[1]));
        let open = sdk.open_overlays();
        assert_eq!(open.len(), 1);
        assert!(sdk.overlay_content(open[0]).unwrap().contains("Lot 2"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_clear_markers_releases_everything() {
        let (service, sdk, map) = initialized().await;
        service
            .display_markers(&[lot(1, 37.50, 127.00)], MarkerOptions::default())
            .unwrap();
        sdk.click(sdk.marker_ids(map)[0]);

        service.clear_markers();

        assert_eq!(sdk.marker_count(), 0);
        assert!(sdk.open_overlays().is_empty());
        assert_eq!(sdk.listener_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_render_leaves_no_partial_markers() {
        let (service, sdk, map) = initialized().await;
        service
            .display_markers(&[lot(1, 37.50, 127.00)], MarkerOptions::default())
            .unwrap();
        sdk.fail_marker_creation_after(2);

        let err = service
            .display_markers(
                &[lot(2, 37.50, 127.00), lot(3, 37.60, 126.90), lot(4, 37.7, 127.1)],
                MarkerOptions::default(),
            )
            .unwrap_err();

        assert!(matches!(err, MapError::Sdk(_)));
        assert_eq!(sdk.marker_count(), 0);
        assert_eq!(service.marker_count(), 0);
        // Camera untouched by the failed render
        assert_eq!(sdk.camera_ops(map).len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_viewport_listener_debounced() {
        let (service, sdk, map) = initialized().await;
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        service
            .on_viewport_changed(Arc::new(move |viewport| sink.lock().push(viewport)))
            .unwrap();

        sdk.pan_to(map, LatLng::new(37.50, 127.00));
        tokio::time::sleep(Duration::from_millis(100)).await;
        sdk.pan_to(map, LatLng::new(37.51, 127.01));
        tokio::time::sleep(Duration::from_millis(700)).await;

        let seen = seen.lock();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].center, LatLng::new(37.51, 127.01));
    }

    #[tokio::test(start_paused = true)]
    async fn test_new_viewport_listener_replaces_previous() {
        let (service, sdk, map) = initialized().await;
        let first = Arc::new(Mutex::new(0usize));
        let second = Arc::new(Mutex::new(0usize));

        let counter = Arc::clone(&first);
        service
            .on_viewport_changed(Arc::new(move |_| *counter.lock() += 1))
            .unwrap();
        let counter = Arc::clone(&second);
        service
            .on_viewport_changed(Arc::new(move |_| *counter.lock() += 1))
            .unwrap();

        sdk.pan_to(map, LatLng::new(37.50, 127.00));
        tokio::time::sleep(Duration::from_secs(1)).await;

        assert_eq!(*first.lock(), 0);
        assert_eq!(*second.lock(), 1);
        assert_eq!(sdk.listener_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_remove_viewport_listener() {
        let (service, sdk, map) = initialized().await;
        let count = Arc::new(Mutex::new(0usize));
        let counter = Arc::clone(&count);
        service
            .on_viewport_changed(Arc::new(move |_| *counter.lock() += 1))
            .unwrap();

        service.remove_viewport_listener();
        sdk.pan_to(map, LatLng::new(37.50, 127.00));
        tokio::time::sleep(Duration::from_secs(1)).await;

        assert_eq!(*count.lock(), 0);
        assert_eq!(sdk.listener_count(), 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_concurrent_viewport_registration_keeps_one_listener() {
        let (service, sdk, _map) = initialized().await;
        let runtime = Handle::current();

        for _ in 0..200 {
            let barrier = std::sync::Barrier::new(2);
            std::thread::scope(|scope| {
                for _ in 0..2 {
                    scope.spawn(|| {
                        let _guard = runtime.enter();
                        barrier.wait();
                        service.on_viewport_changed(Arc::new(|_| {})).unwrap();
                    });
                }
            });
            assert_eq!(sdk.listener_count(), 1);
        }

        service.remove_viewport_listener();
        assert_eq!(sdk.listener_count(), 0);
    }
}
