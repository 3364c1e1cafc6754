//! Show command - render parking lots on the headless map and print the scene.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use parkmap::coord::{is_valid_location, LatLng};
use parkmap::map::{
    HeadlessBehavior, HeadlessPage, HeadlessSdk, MapError, MapService, Scene, SdkLoader,
    SdkMapService, Viewport,
};
use parkmap::usecase::{DisplayError, DisplayMapMarkers, ExecuteOptions};

use super::common::{build_repository, FilterArgs};
use crate::error::CliError;
use crate::runner::CliRunner;

/// Arguments for the show command.
pub struct ShowArgs {
    pub filters: FilterArgs,
    pub no_fit: bool,
    pub json: bool,
    /// Pan the map here after rendering and report the settled viewport.
    pub pan: Option<LatLng>,
}

/// Parses `LAT,LNG` for `--pan`.
pub fn parse_lat_lng(value: &str) -> Result<LatLng, String> {
    let (lat, lng) = value
        .split_once(',')
        .ok_or_else(|| format!("expected LAT,LNG, got '{}'", value))?;
    let lat: f64 = lat
        .trim()
        .parse()
        .map_err(|_| format!("invalid latitude '{}'", lat.trim()))?;
    let lng: f64 = lng
        .trim()
        .parse()
        .map_err(|_| format!("invalid longitude '{}'", lng.trim()))?;
    if !is_valid_location(Some(lat), Some(lng)) {
        return Err(format!("{},{} is outside the valid coordinate range", lat, lng));
    }
    Ok(LatLng::new(lat, lng))
}

/// Run the show command.
pub fn run(runner: &CliRunner, args: ShowArgs) -> Result<(), CliError> {
    runner.log_startup("show");
    let config = runner.config();
    let repository = build_repository(config)?;

    let sdk = Arc::new(HeadlessSdk::new(HeadlessBehavior::default()));
    let page = Arc::new(HeadlessPage::new(Arc::clone(&sdk)));
    page.add_container(config.map.container_id.clone());
    let loader = Arc::new(SdkLoader::new(
        config.loader_config(),
        sdk.clone(),
        page.clone(),
    ));
    let map = Arc::new(SdkMapService::new(
        sdk.clone(),
        page,
        loader,
        config.map_settings(),
    ));

    let usecase = DisplayMapMarkers::new(repository, map.clone())
        .with_container(config.map.container_id.clone())
        .with_center(config.center());
    let options = ExecuteOptions::default().with_fit_bounds(!args.no_fit);
    let params = args.filters.to_search_params();
    let debounce = config.map_settings().viewport_debounce;

    let settled = runner.block_on(async {
        usecase.execute(params.as_ref(), options).await?;
        match args.pan {
            Some(target) => pan_and_wait(&sdk, &map, target, debounce)
                .await
                .map_err(DisplayError::from),
            None => Ok(None),
        }
    })?;

    let map_id = map
        .map_id()
        .ok_or_else(|| CliError::Output("map was not created".to_string()))?;
    let scene = sdk
        .scene(map_id)
        .ok_or_else(|| CliError::Output("map surface disappeared".to_string()))?;

    if args.json {
        let output = serde_json::json!({ "scene": scene, "viewport": settled });
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        print_scene(&scene);
        if let Some(viewport) = settled {
            println!();
            println!(
                "Viewport settled at {:.5}, {:.5} (level {})",
                viewport.center.lat, viewport.center.lng, viewport.level
            );
        }
    }
    Ok(())
}

/// Pans the map and waits for the debounced viewport callback.
async fn pan_and_wait(
    sdk: &HeadlessSdk,
    map: &SdkMapService,
    target: LatLng,
    debounce: Duration,
) -> Result<Option<Viewport>, MapError> {
    let map_id = map.map_id().ok_or(MapError::NotInitialized)?;
    let (tx, rx) = tokio::sync::oneshot::channel();
    let slot = Mutex::new(Some(tx));

    map.on_viewport_changed(Arc::new(move |viewport| {
        if let Some(tx) = slot.lock().take() {
            let _ = tx.send(viewport);
        }
    }))?;

    sdk.pan_to(map_id, target);
    let settled = tokio::time::timeout(debounce.saturating_mul(4), rx)
        .await
        .ok()
        .and_then(Result::ok);
    map.remove_viewport_listener();

    if settled.is_none() {
        tracing::warn!("Viewport did not settle");
    }
    Ok(settled)
}

fn print_scene(scene: &Scene) {
    println!(
        "Map '{}' centered at {:.5}, {:.5} (level {})",
        scene.container_id, scene.center.lat, scene.center.lng, scene.level
    );
    if let Some(bounds) = scene.fitted_bounds {
        println!(
            "Fitted to {:.5}, {:.5} .. {:.5}, {:.5}",
            bounds.south_west.lat,
            bounds.south_west.lng,
            bounds.north_east.lat,
            bounds.north_east.lng
        );
    }

    if scene.markers.is_empty() {
        println!("No markers.");
        return;
    }
    println!("{} marker(s):", scene.markers.len());
    for marker in &scene.markers {
        println!(
            "  {:<30} {:>10.5} {:>11.5}",
            marker.title, marker.position.lat, marker.position.lng
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_lat_lng() {
        assert_eq!(
            parse_lat_lng("37.5665, 126.978").unwrap(),
            LatLng::new(37.5665, 126.978)
        );
        assert!(parse_lat_lng("37.5").is_err());
        assert!(parse_lat_lng("north,126").is_err());
        assert!(parse_lat_lng("91,126").is_err());
    }
}
