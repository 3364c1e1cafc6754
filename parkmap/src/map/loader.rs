//! Map SDK script loader.
//!
//! Loads the external SDK into the page at most once per loader and tracks
//! readiness.
//!
//! # State Machine
//!
//! ```text
//! NotLoaded --[ensure_loaded]--> Loading
//! Loading --[SDK ready]--> Ready
//! Loading --[error / poll exhausted / cancelled]--> NotLoaded (caller may retry)
//! ```
//!
//! `Ready` is terminal. While `Loading`, every caller of
//! [`SdkLoader::ensure_loaded`] awaits the same shared attempt, so overlapping
//! calls inject the script once and all observe the same outcome.

use std::sync::Arc;
use std::time::Duration;

use futures::future::{BoxFuture, FutureExt, Shared};
use parking_lot::Mutex;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use super::{LoadDiagnostic, MapError, MapSdk, PageHost, SdkReadyState};

/// Default SDK script location.
pub const DEFAULT_SDK_URL: &str = "https://dapi.kakao.com/v2/maps/sdk.js";

/// Loader timing and endpoint configuration.
#[derive(Debug, Clone)]
pub struct LoaderConfig {
    /// SDK script URL without query string.
    pub sdk_url: String,
    /// App key appended to the script URL.
    pub api_key: String,
    /// Interval between readiness polls.
    pub poll_interval: Duration,
    /// Poll attempts after the injected script fires `load` (default: 50, 5s).
    pub script_poll_attempts: u32,
    /// Poll attempts when a script tag was already present (default: 100, 10s).
    pub ready_poll_attempts: u32,
    /// Upper bound for the SDK's own init callback (default: 15s).
    pub init_timeout: Duration,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            sdk_url: DEFAULT_SDK_URL.to_string(),
            api_key: String::new(),
            poll_interval: Duration::from_millis(100),
            script_poll_attempts: 50,
            ready_poll_attempts: 100,
            init_timeout: Duration::from_secs(15),
        }
    }
}

impl LoaderConfig {
    /// Creates a default configuration for the given app key.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            ..Self::default()
        }
    }

    /// Full script URL; autoload is disabled so the loader drives init itself.
    pub fn script_url(&self) -> String {
        format!(
            "{}?appkey={}&autoload=false&libraries=services",
            self.sdk_url, self.api_key
        )
    }

    /// Part of the script URL used to detect an existing tag.
    fn script_fragment(&self) -> &str {
        self.sdk_url
            .split_once("://")
            .map(|(_, rest)| rest)
            .unwrap_or(&self.sdk_url)
    }
}

/// Observable loader state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoaderState {
    NotLoaded,
    Loading,
    Ready,
}

type SharedLoad = Shared<BoxFuture<'static, Result<(), MapError>>>;

enum Phase {
    NotLoaded,
    Loading {
        attempt: u64,
        load: SharedLoad,
        cancel: CancellationToken,
    },
    Ready,
}

struct LoaderInner {
    phase: Phase,
    next_attempt: u64,
}

/// Loads the map SDK into a page.
///
/// One loader is shared per page (e.g. via `Arc<SdkLoader>`); all map
/// adapters on that page await the same load.
pub struct SdkLoader {
    config: LoaderConfig,
    sdk: Arc<dyn MapSdk>,
    page: Arc<dyn PageHost>,
    inner: Mutex<LoaderInner>,
}

impl std::fmt::Debug for SdkLoader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SdkLoader")
            .field("config", &self.config)
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}

impl SdkLoader {
    pub fn new(config: LoaderConfig, sdk: Arc<dyn MapSdk>, page: Arc<dyn PageHost>) -> Self {
        Self {
            config,
            sdk,
            page,
            inner: Mutex::new(LoaderInner {
                phase: Phase::NotLoaded,
                next_attempt: 0,
            }),
        }
    }

    pub fn state(&self) -> LoaderState {
        match self.inner.lock().phase {
            Phase::NotLoaded => LoaderState::NotLoaded,
            Phase::Loading { .. } => LoaderState::Loading,
            Phase::Ready => LoaderState::Ready,
        }
    }

    /// Returns `true` once the SDK is ready and its namespace is present.
    pub fn is_ready(&self) -> bool {
        self.state() == LoaderState::Ready && self.sdk.is_available()
    }

    /// Loads the SDK unless it is already loaded.
    ///
    /// Joins the in-flight attempt when one exists. A failed attempt returns
    /// the loader to `NotLoaded`; it is never retried automatically.
    ///
    /// # Errors
    ///
    /// - `MissingApiKey` if no app key is configured
    /// - `LoaderFailed` on script error, poll exhaustion or init failure
    /// - `LoadCancelled` if [`cancel`](Self::cancel) was called
    pub async fn ensure_loaded(&self) -> Result<(), MapError> {
        let (attempt, load) = {
            let mut inner = self.inner.lock();
            match &inner.phase {
                Phase::Ready => return Ok(()),
                Phase::Loading { attempt, load, .. } => (*attempt, load.clone()),
                Phase::NotLoaded => {
                    let attempt = inner.next_attempt;
                    inner.next_attempt += 1;
                    let cancel = CancellationToken::new();
                    let load = self.start_load(cancel.clone());
                    inner.phase = Phase::Loading {
                        attempt,
                        load: load.clone(),
                        cancel,
                    };
                    tracing::debug!(attempt, "Map SDK load started");
                    (attempt, load)
                }
            }
        };

        let result = load.await;
        self.finish(attempt, &result);
        result
    }

    /// Cancels the in-flight load, if any.
    pub fn cancel(&self) {
        if let Phase::Loading { cancel, .. } = &self.inner.lock().phase {
            cancel.cancel();
        }
    }

    fn start_load(&self, cancel: CancellationToken) -> SharedLoad {
        let config = self.config.clone();
        let sdk = Arc::clone(&self.sdk);
        let page = Arc::clone(&self.page);
        async move { load_sdk(&config, sdk.as_ref(), page.as_ref(), &cancel).await }
            .boxed()
            .shared()
    }

    fn finish(&self, attempt: u64, result: &Result<(), MapError>) {
        let mut inner = self.inner.lock();
        let current = match &inner.phase {
            Phase::Loading { attempt: current, .. } => *current,
            _ => return,
        };
        if current != attempt {
            return;
        }
        match result {
            Ok(()) => {
                tracing::info!("Map SDK ready");
                inner.phase = Phase::Ready;
            }
            Err(e) => {
                tracing::error!(error = %e, "Map SDK load failed");
                inner.phase = Phase::NotLoaded;
            }
        }
    }
}

enum PollOutcome {
    Ready,
    Exhausted,
    Cancelled,
}

/// Polls `check` every `interval`, at most `max_attempts` times.
async fn poll_until<F>(
    check: F,
    interval: Duration,
    max_attempts: u32,
    cancel: &CancellationToken,
) -> PollOutcome
where
    F: Fn() -> bool,
{
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // First tick completes immediately
    ticker.tick().await;

    for attempt in 1..=max_attempts {
        tokio::select! {
            _ = cancel.cancelled() => return PollOutcome::Cancelled,
            _ = ticker.tick() => {}
        }
        if check() {
            return PollOutcome::Ready;
        }
        if attempt % 10 == 0 {
            tracing::debug!(
                attempt,
                elapsed_ms = (interval * attempt).as_millis() as u64,
                "Waiting for map SDK namespace"
            );
        }
    }
    PollOutcome::Exhausted
}

async fn load_sdk(
    config: &LoaderConfig,
    sdk: &dyn MapSdk,
    page: &dyn PageHost,
    cancel: &CancellationToken,
) -> Result<(), MapError> {
    if config.api_key.trim().is_empty() {
        return Err(MapError::MissingApiKey);
    }

    let url = config.script_url();

    if config.poll_interval.is_zero() {
        return Err(MapError::LoaderFailed(LoadDiagnostic::new(
            "poll interval must be non-zero",
            &url,
            page.origin(),
        )));
    }

    let max_attempts = if page.has_script(config.script_fragment()) {
        tracing::info!("Existing map SDK script tag found, waiting for readiness");
        config.ready_poll_attempts
    } else {
        tracing::info!(url = %url, "Injecting map SDK script");
        let injected = tokio::select! {
            _ = cancel.cancelled() => return Err(MapError::LoadCancelled),
            result = page.inject_script(&url) => result,
        };

        if let Err(reason) = injected {
            page.remove_script(&url);
            let status = tokio::select! {
                _ = cancel.cancelled() => return Err(MapError::LoadCancelled),
                status = page.probe_status(&url) => status,
            };
            let diagnostic =
                LoadDiagnostic::new(format!("script error: {}", reason), &url, page.origin())
                    .with_status(status);
            tracing::error!(
                url = %url,
                status = ?status,
                origin = %diagnostic.origin,
                "Map SDK script failed to load"
            );
            return Err(MapError::LoaderFailed(diagnostic));
        }
        tracing::debug!("Map SDK script loaded");
        config.script_poll_attempts
    };

    match poll_until(
        || sdk.is_available(),
        config.poll_interval,
        max_attempts,
        cancel,
    )
    .await
    {
        PollOutcome::Ready => {}
        PollOutcome::Cancelled => return Err(MapError::LoadCancelled),
        PollOutcome::Exhausted => {
            let waited = config.poll_interval * max_attempts;
            return Err(MapError::LoaderFailed(LoadDiagnostic::new(
                format!("SDK namespace did not appear within {:?}", waited),
                url,
                page.origin(),
            )));
        }
    }

    initialize_sdk(config, sdk, page, &url, cancel).await
}

/// Drives the SDK's own init once its namespace exists.
///
/// The SDK is treated as usable whenever its map constructor is present,
/// even if init timed out or reported an unexpected state.
async fn initialize_sdk(
    config: &LoaderConfig,
    sdk: &dyn MapSdk,
    page: &dyn PageHost,
    url: &str,
    cancel: &CancellationToken,
) -> Result<(), MapError> {
    if !sdk.is_available() {
        return Err(MapError::ProviderUnavailable);
    }

    match sdk.ready_state() {
        SdkReadyState::Loaded => {
            tracing::debug!("Map SDK already initialized");
            Ok(())
        }
        SdkReadyState::NotLoaded | SdkReadyState::Loading => {
            if !sdk.has_load_hook() {
                tracing::warn!("Map SDK has no load hook, continuing with existing namespace");
                return Ok(());
            }
            let init = tokio::select! {
                _ = cancel.cancelled() => return Err(MapError::LoadCancelled),
                init = tokio::time::timeout(config.init_timeout, sdk.load()) => init,
            };
            match init {
                Ok(()) => Ok(()),
                Err(_) if sdk.has_map_constructor() => {
                    tracing::warn!(
                        timeout_secs = config.init_timeout.as_secs(),
                        "Map SDK init timed out, map constructor present so continuing"
                    );
                    Ok(())
                }
                Err(_) => Err(MapError::LoaderFailed(LoadDiagnostic::new(
                    format!("SDK init timed out after {:?}", config.init_timeout),
                    url,
                    page.origin(),
                ))),
            }
        }
        SdkReadyState::Unknown(code) if sdk.has_map_constructor() => {
            tracing::warn!(code, "Unexpected map SDK ready state, map constructor present");
            Ok(())
        }
        SdkReadyState::Unknown(code) => Err(MapError::LoaderFailed(LoadDiagnostic::new(
            format!("unexpected SDK ready state {}", code),
            url,
            page.origin(),
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::map::{HeadlessBehavior, HeadlessPage, HeadlessSdk};

    fn loader_with(
        behavior: HeadlessBehavior,
    ) -> (SdkLoader, Arc<HeadlessSdk>, Arc<HeadlessPage>) {
        let sdk = Arc::new(HeadlessSdk::new(behavior));
        let page = Arc::new(HeadlessPage::new(Arc::clone(&sdk)));
        let loader = SdkLoader::new(
            LoaderConfig::new("test-key"),
            Arc::clone(&sdk) as Arc<dyn MapSdk>,
            Arc::clone(&page) as Arc<dyn PageHost>,
        );
        (loader, sdk, page)
    }

    #[test]
    fn test_script_url() {
        let config = LoaderConfig::new("abc123");
        assert_eq!(
            config.script_url(),
            "https://dapi.kakao.com/v2/maps/sdk.js?appkey=abc123&autoload=false&libraries=services"
        );
        assert_eq!(config.script_fragment(), "dapi.kakao.com/v2/maps/sdk.js");
    }

    #[tokio::test(start_paused = true)]
    async fn test_load_transitions_to_ready() {
        let (loader, sdk, page) = loader_with(HeadlessBehavior::default());
        assert_eq!(loader.state(), LoaderState::NotLoaded);

        loader.ensure_loaded().await.unwrap();

        assert_eq!(loader.state(), LoaderState::Ready);
        assert!(loader.is_ready());
        assert_eq!(sdk.ready_state(), SdkReadyState::Loaded);
        assert_eq!(page.injection_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_ready_loader_does_not_reload() {
        let (loader, _sdk, page) = loader_with(HeadlessBehavior::default());

        loader.ensure_loaded().await.unwrap();
        loader.ensure_loaded().await.unwrap();

        assert_eq!(page.injection_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_missing_api_key() {
        let sdk = Arc::new(HeadlessSdk::new(HeadlessBehavior::default()));
        let page = Arc::new(HeadlessPage::new(Arc::clone(&sdk)));
        let loader = SdkLoader::new(
            LoaderConfig::new("  "),
            sdk,
            Arc::clone(&page) as Arc<dyn PageHost>,
        );

        assert_eq!(loader.ensure_loaded().await, Err(MapError::MissingApiKey));
        assert_eq!(loader.state(), LoaderState::NotLoaded);
        assert_eq!(page.injection_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_script_error_reports_diagnostic_and_removes_tag() {
        let behavior = HeadlessBehavior {
            script_error_status: Some(401),
            ..HeadlessBehavior::default()
        };
        let (loader, _sdk, page) = loader_with(behavior);

        let err = loader.ensure_loaded().await.unwrap_err();
        match err {
            MapError::LoaderFailed(diagnostic) => {
                assert_eq!(diagnostic.status, Some(401));
                assert!(diagnostic.url.contains("appkey=test-key"));
                assert_eq!(diagnostic.origin, page.origin());
            }
            other => panic!("unexpected error: {:?}", other),
        }
        assert!(page.scripts().is_empty());
        assert_eq!(loader.state(), LoaderState::NotLoaded);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_load_is_retriable_by_caller() {
        let behavior = HeadlessBehavior {
            script_error_status: Some(500),
            ..HeadlessBehavior::default()
        };
        let (loader, sdk, page) = loader_with(behavior);

        assert!(loader.ensure_loaded().await.is_err());
        sdk.set_script_error_status(None);
        loader.ensure_loaded().await.unwrap();

        assert_eq!(page.injection_count(), 2);
        assert_eq!(loader.state(), LoaderState::Ready);
    }

    #[tokio::test(start_paused = true)]
    async fn test_namespace_never_appears() {
        let behavior = HeadlessBehavior {
            namespace_on_load: false,
            ..HeadlessBehavior::default()
        };
        let (loader, _sdk, _page) = loader_with(behavior);

        let started = tokio::time::Instant::now();
        let err = loader.ensure_loaded().await.unwrap_err();

        assert!(matches!(err, MapError::LoaderFailed(_)));
        let waited = started.elapsed();
        assert!(waited >= Duration::from_secs(5) && waited < Duration::from_millis(5200));
    }

    #[tokio::test(start_paused = true)]
    async fn test_existing_script_skips_injection() {
        let (loader, sdk, page) = loader_with(HeadlessBehavior::default());
        page.preload_script("https://dapi.kakao.com/v2/maps/sdk.js?appkey=other");
        sdk.expose();

        loader.ensure_loaded().await.unwrap();

        assert_eq!(page.injection_count(), 0);
        assert_eq!(loader.state(), LoaderState::Ready);
    }

    #[tokio::test(start_paused = true)]
    async fn test_existing_script_wait_is_bounded() {
        let (loader, _sdk, page) = loader_with(HeadlessBehavior::default());
        page.preload_script("https://dapi.kakao.com/v2/maps/sdk.js");

        let started = tokio::time::Instant::now();
        assert!(loader.ensure_loaded().await.is_err());
        let waited = started.elapsed();
        assert!(waited >= Duration::from_secs(10) && waited < Duration::from_millis(10200));
    }

    #[tokio::test(start_paused = true)]
    async fn test_init_timeout_with_map_constructor_continues() {
        let behavior = HeadlessBehavior {
            load_completes: false,
            ..HeadlessBehavior::default()
        };
        let (loader, _sdk, _page) = loader_with(behavior);

        loader.ensure_loaded().await.unwrap();
        assert_eq!(loader.state(), LoaderState::Ready);
    }

    #[tokio::test(start_paused = true)]
    async fn test_init_timeout_without_map_constructor_fails() {
        let behavior = HeadlessBehavior {
            load_completes: false,
            map_constructor: false,
            ..HeadlessBehavior::default()
        };
        let (loader, _sdk, _page) = loader_with(behavior);

        let err = loader.ensure_loaded().await.unwrap_err();
        assert!(matches!(err, MapError::LoaderFailed(d) if d.reason.contains("timed out")));
    }

    #[tokio::test(start_paused = true)]
    async fn test_missing_load_hook_continues() {
        let behavior = HeadlessBehavior {
            load_hook: false,
            ..HeadlessBehavior::default()
        };
        let (loader, _sdk, _page) = loader_with(behavior);

        loader.ensure_loaded().await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_unknown_ready_state() {
        let behavior = HeadlessBehavior {
            initial_ready_code: 9,
            map_constructor: false,
            ..HeadlessBehavior::default()
        };
        let (loader, _sdk, _page) = loader_with(behavior);

        let err = loader.ensure_loaded().await.unwrap_err();
        assert!(matches!(err, MapError::LoaderFailed(d) if d.reason.contains("ready state 9")));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_aborts_polling() {
        let behavior = HeadlessBehavior {
            namespace_on_load: false,
            ..HeadlessBehavior::default()
        };
        let (loader, _sdk, _page) = loader_with(behavior);
        let loader = Arc::new(loader);

        let pending = {
            let loader = Arc::clone(&loader);
            tokio::spawn(async move { loader.ensure_loaded().await })
        };
        tokio::time::sleep(Duration::from_millis(250)).await;
        assert_eq!(loader.state(), LoaderState::Loading);

        loader.cancel();
        let result = pending.await.unwrap();

        assert_eq!(result, Err(MapError::LoadCancelled));
        assert_eq!(loader.state(), LoaderState::NotLoaded);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_aborts_init_wait() {
        let behavior = HeadlessBehavior {
            load_completes: false,
            ..HeadlessBehavior::default()
        };
        let (loader, _sdk, _page) = loader_with(behavior);
        let loader = Arc::new(loader);

        let started = tokio::time::Instant::now();
        let pending = {
            let loader = Arc::clone(&loader);
            tokio::spawn(async move { loader.ensure_loaded().await })
        };
        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(loader.state(), LoaderState::Loading);

        loader.cancel();
        let result = pending.await.unwrap();

        assert_eq!(result, Err(MapError::LoadCancelled));
        assert!(started.elapsed() < Duration::from_secs(2));
        assert_eq!(loader.state(), LoaderState::NotLoaded);
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_poll_interval_fails_without_sticking() {
        let sdk = Arc::new(HeadlessSdk::new(HeadlessBehavior::default()));
        let page = Arc::new(HeadlessPage::new(Arc::clone(&sdk)));
        let config = LoaderConfig {
            poll_interval: Duration::ZERO,
            ..LoaderConfig::new("test-key")
        };
        let loader = SdkLoader::new(
            config,
            Arc::clone(&sdk) as Arc<dyn MapSdk>,
            Arc::clone(&page) as Arc<dyn PageHost>,
        );

        for _ in 0..2 {
            let err = loader.ensure_loaded().await.unwrap_err();
            assert!(matches!(err, MapError::LoaderFailed(d) if d.reason.contains("non-zero")));
            assert_eq!(loader.state(), LoaderState::NotLoaded);
        }
        assert_eq!(page.injection_count(), 0);
    }
}
