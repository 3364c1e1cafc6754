//! INI configuration file.
//!
//! Every key has a default, so a missing file or a missing key is never an
//! error. Values that are present but cannot be parsed are reported as
//! [`ConfigError::InvalidValue`].

use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use ini::{Ini, Properties};
use thiserror::Error;

use crate::coord::{LatLng, MAX_LAT, MAX_LON, MIN_LAT, MIN_LON};
use crate::map::{
    LoaderConfig, MapSettings, CLOSE_MAP_LEVEL, DEFAULT_CONTAINER_ID, DEFAULT_MAP_LEVEL,
    DEFAULT_SDK_URL,
};

/// Environment variable overriding `api.base_url`.
pub const ENV_API_BASE_URL: &str = "PARKMAP_API_BASE_URL";

/// Environment variable overriding `map.api_key`.
pub const ENV_MAP_API_KEY: &str = "PARKMAP_MAP_API_KEY";

/// Seoul City Hall, the default map center.
pub const DEFAULT_CENTER: LatLng = LatLng::new(37.5665, 126.978);

pub const DEFAULT_API_BASE_URL: &str = "http://localhost:8080/api";

/// Upper bound for `viewport.debounce_ms`.
pub const MAX_DEBOUNCE_MS: u64 = 60_000;

/// Errors raised while reading or writing the configuration file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: ini::Error,
    },

    #[error("Failed to write config file {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid value '{value}' for {section}.{key}")]
    InvalidValue {
        section: &'static str,
        key: &'static str,
        value: String,
    },

    #[error("Unknown configuration key '{0}'")]
    UnknownKey(String),
}

/// Directory holding the configuration file.
pub fn config_directory() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("parkmap")
}

/// Default configuration file location.
pub fn config_file_path() -> PathBuf {
    config_directory().join("config.ini")
}

/// `[api]` section.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiSettings {
    /// Backend base URL; lots are fetched from `{base_url}/parking-lots`.
    pub base_url: String,
    pub timeout_secs: u64,
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_BASE_URL.to_string(),
            timeout_secs: 30,
        }
    }
}

/// `[map]` section.
#[derive(Debug, Clone, PartialEq)]
pub struct MapSection {
    pub api_key: Option<String>,
    pub sdk_url: String,
    pub container_id: String,
    pub center_lat: f64,
    pub center_lng: f64,
    pub default_level: u8,
    pub close_level: u8,
}

impl Default for MapSection {
    fn default() -> Self {
        Self {
            api_key: None,
            sdk_url: DEFAULT_SDK_URL.to_string(),
            container_id: DEFAULT_CONTAINER_ID.to_string(),
            center_lat: DEFAULT_CENTER.lat,
            center_lng: DEFAULT_CENTER.lng,
            default_level: DEFAULT_MAP_LEVEL,
            close_level: CLOSE_MAP_LEVEL,
        }
    }
}

/// `[loader]` section.
#[derive(Debug, Clone, PartialEq)]
pub struct LoaderSection {
    pub poll_interval_ms: u64,
    pub script_poll_attempts: u32,
    pub ready_poll_attempts: u32,
    pub init_timeout_secs: u64,
}

impl Default for LoaderSection {
    fn default() -> Self {
        let defaults = LoaderConfig::default();
        Self {
            poll_interval_ms: defaults.poll_interval.as_millis() as u64,
            script_poll_attempts: defaults.script_poll_attempts,
            ready_poll_attempts: defaults.ready_poll_attempts,
            init_timeout_secs: defaults.init_timeout.as_secs(),
        }
    }
}

/// `[viewport]` section.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewportSection {
    pub debounce_ms: u64,
}

impl Default for ViewportSection {
    fn default() -> Self {
        Self { debounce_ms: 500 }
    }
}

/// `[logging]` section.
#[derive(Debug, Clone, PartialEq)]
pub struct LoggingSection {
    /// Default filter directive when `RUST_LOG` is unset.
    pub level: String,
    /// Optional log file written in addition to stderr.
    pub file: Option<PathBuf>,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file: None,
        }
    }
}

/// Parsed configuration file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConfigFile {
    pub api: ApiSettings,
    pub map: MapSection,
    pub loader: LoaderSection,
    pub viewport: ViewportSection,
    pub logging: LoggingSection,
}

impl ConfigFile {
    /// Loads the file at [`config_file_path`], or defaults if it does not exist.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&config_file_path())
    }

    /// Loads `path`, or defaults if it does not exist.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "No config file, using defaults");
            return Ok(Self::default());
        }
        let ini = Ini::load_from_file(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_ini(&ini)
    }

    /// Builds a configuration from parsed INI content.
    pub fn from_ini(ini: &Ini) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(section) = ini.section(Some("api")) {
            read_string(section, "base_url", &mut config.api.base_url);
            read_parsed(section, "api", "timeout_secs", &mut config.api.timeout_secs)?;
        }

        if let Some(section) = ini.section(Some("map")) {
            config.map.api_key = non_empty(section.get("api_key"));
            read_string(section, "sdk_url", &mut config.map.sdk_url);
            read_string(section, "container_id", &mut config.map.container_id);
            read_parsed(section, "map", "center_lat", &mut config.map.center_lat)?;
            read_parsed(section, "map", "center_lng", &mut config.map.center_lng)?;
            read_parsed(section, "map", "default_level", &mut config.map.default_level)?;
            read_parsed(section, "map", "close_level", &mut config.map.close_level)?;
        }

        if let Some(section) = ini.section(Some("loader")) {
            let loader = &mut config.loader;
            read_parsed(section, "loader", "poll_interval_ms", &mut loader.poll_interval_ms)?;
            read_parsed(
                section,
                "loader",
                "script_poll_attempts",
                &mut loader.script_poll_attempts,
            )?;
            read_parsed(
                section,
                "loader",
                "ready_poll_attempts",
                &mut loader.ready_poll_attempts,
            )?;
            read_parsed(section, "loader", "init_timeout_secs", &mut loader.init_timeout_secs)?;
        }

        if let Some(section) = ini.section(Some("viewport")) {
            read_parsed(section, "viewport", "debounce_ms", &mut config.viewport.debounce_ms)?;
        }

        if let Some(section) = ini.section(Some("logging")) {
            read_string(section, "level", &mut config.logging.level);
            config.logging.file = non_empty(section.get("file")).map(PathBuf::from);
        }

        config.validate()?;
        Ok(config)
    }

    /// Checks value ranges that parsing alone cannot enforce.
    ///
    /// The poll interval must be non-zero, the center must be a valid
    /// location and the debounce delay may not exceed [`MAX_DEBOUNCE_MS`].
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |section, key, value: String| {
            Err(ConfigError::InvalidValue {
                section,
                key,
                value,
            })
        };
        if !(MIN_LAT..=MAX_LAT).contains(&self.map.center_lat) {
            return invalid("map", "center_lat", self.map.center_lat.to_string());
        }
        if !(MIN_LON..=MAX_LON).contains(&self.map.center_lng) {
            return invalid("map", "center_lng", self.map.center_lng.to_string());
        }
        if self.loader.poll_interval_ms == 0 {
            return invalid("loader", "poll_interval_ms", "0".to_string());
        }
        if self.viewport.debounce_ms > MAX_DEBOUNCE_MS {
            return invalid(
                "viewport",
                "debounce_ms",
                self.viewport.debounce_ms.to_string(),
            );
        }
        Ok(())
    }

    /// Serializes every key, including defaults.
    pub fn to_ini(&self) -> Ini {
        let mut ini = Ini::new();

        ini.with_section(Some("api"))
            .set("base_url", self.api.base_url.as_str())
            .set("timeout_secs", self.api.timeout_secs.to_string());

        ini.with_section(Some("map"))
            .set("api_key", self.map.api_key.clone().unwrap_or_default())
            .set("sdk_url", self.map.sdk_url.as_str())
            .set("container_id", self.map.container_id.as_str())
            .set("center_lat", self.map.center_lat.to_string())
            .set("center_lng", self.map.center_lng.to_string())
            .set("default_level", self.map.default_level.to_string())
            .set("close_level", self.map.close_level.to_string());

        ini.with_section(Some("loader"))
            .set("poll_interval_ms", self.loader.poll_interval_ms.to_string())
            .set(
                "script_poll_attempts",
                self.loader.script_poll_attempts.to_string(),
            )
            .set(
                "ready_poll_attempts",
                self.loader.ready_poll_attempts.to_string(),
            )
            .set("init_timeout_secs", self.loader.init_timeout_secs.to_string());

        ini.with_section(Some("viewport"))
            .set("debounce_ms", self.viewport.debounce_ms.to_string());

        ini.with_section(Some("logging"))
            .set("level", self.logging.level.as_str())
            .set(
                "file",
                self.logging
                    .file
                    .as_ref()
                    .map(|p| p.display().to_string())
                    .unwrap_or_default(),
            );

        ini
    }

    /// Writes to [`config_file_path`].
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&config_file_path())
    }

    /// Writes to `path`, creating parent directories.
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        let write_err = |source| ConfigError::Write {
            path: path.to_path_buf(),
            source,
        };
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(write_err)?;
        }
        self.to_ini().write_to_file(path).map_err(write_err)?;
        tracing::debug!(path = %path.display(), "Config file written");
        Ok(())
    }

    /// Applies `PARKMAP_*` environment overrides.
    pub fn apply_env(&mut self) {
        self.apply_overrides(|name| std::env::var(name).ok());
    }

    /// Applies overrides resolved by `lookup`; empty values are ignored.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = non_empty(lookup(ENV_API_BASE_URL).as_deref()) {
            self.api.base_url = url;
        }
        if let Some(key) = non_empty(lookup(ENV_MAP_API_KEY).as_deref()) {
            self.map.api_key = Some(key);
        }
    }

    pub fn center(&self) -> LatLng {
        LatLng::new(self.map.center_lat, self.map.center_lng)
    }

    /// Loader settings; a missing API key becomes an empty key.
    pub fn loader_config(&self) -> LoaderConfig {
        LoaderConfig {
            sdk_url: self.map.sdk_url.clone(),
            api_key: self.map.api_key.clone().unwrap_or_default(),
            poll_interval: Duration::from_millis(self.loader.poll_interval_ms),
            script_poll_attempts: self.loader.script_poll_attempts,
            ready_poll_attempts: self.loader.ready_poll_attempts,
            init_timeout: Duration::from_secs(self.loader.init_timeout_secs),
        }
    }

    pub fn map_settings(&self) -> MapSettings {
        MapSettings {
            default_level: self.map.default_level,
            close_level: self.map.close_level,
            viewport_debounce: Duration::from_millis(self.viewport.debounce_ms),
        }
    }
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

fn read_string(section: &Properties, key: &str, target: &mut String) {
    if let Some(value) = non_empty(section.get(key)) {
        *target = value;
    }
}

fn read_parsed<T: FromStr>(
    section: &Properties,
    section_name: &'static str,
    key: &'static str,
    target: &mut T,
) -> Result<(), ConfigError> {
    if let Some(raw) = non_empty(section.get(key)) {
        *target = raw.parse().map_err(|_| ConfigError::InvalidValue {
            section: section_name,
            key,
            value: raw.clone(),
        })?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = TempDir::new().unwrap();
        let config = ConfigFile::load_from(&dir.path().join("absent.ini")).unwrap();
        assert_eq!(config, ConfigFile::default());
        assert_eq!(config.center(), DEFAULT_CENTER);
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("config.ini");

        let mut config = ConfigFile::default();
        config.api.base_url = "https://parking.example/api".to_string();
        config.map.api_key = Some("key-123".to_string());
        config.map.close_level = 2;
        config.viewport.debounce_ms = 250;
        config.logging.file = Some(PathBuf::from("/tmp/parkmap.log"));
        config.save_to(&path).unwrap();

        let loaded = ConfigFile::load_from(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_partial_file_keeps_other_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.ini");
        std::fs::write(&path, "[map]\ncenter_lat = 35.1796\ncenter_lng = 129.0756\n").unwrap();

        let config = ConfigFile::load_from(&path).unwrap();
        assert_eq!(config.center(), LatLng::new(35.1796, 129.0756));
        assert_eq!(config.map.api_key, None);
        assert_eq!(config.api, ApiSettings::default());
        assert_eq!(config.loader, LoaderSection::default());
    }

    #[test]
    fn test_invalid_number_is_reported() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.ini");
        std::fs::write(&path, "[loader]\npoll_interval_ms = fast\n").unwrap();

        let err = ConfigFile::load_from(&path).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidValue { section: "loader", key: "poll_interval_ms", .. }
        ));
    }

    #[test]
    fn test_out_of_range_values_are_rejected() {
        let cases = [
            ("[loader]\npoll_interval_ms = 0\n", "loader", "poll_interval_ms"),
            ("[map]\ncenter_lat = 91\n", "map", "center_lat"),
            ("[map]\ncenter_lng = -180.5\n", "map", "center_lng"),
            ("[map]\ncenter_lat = NaN\n", "map", "center_lat"),
            ("[viewport]\ndebounce_ms = 18446744073709551615\n", "viewport", "debounce_ms"),
        ];
        for (content, section, key) in cases {
            let ini = Ini::load_from_str(content).unwrap();
            match ConfigFile::from_ini(&ini) {
                Err(ConfigError::InvalidValue {
                    section: s, key: k, ..
                }) => assert_eq!((s, k), (section, key), "{}", content),
                other => panic!("expected InvalidValue for {:?}, got {:?}", content, other),
            }
        }
    }

    #[test]
    fn test_defaults_pass_validation() {
        assert!(ConfigFile::default().validate().is_ok());
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = HashMap::from([
            (ENV_API_BASE_URL, "https://override.example"),
            (ENV_MAP_API_KEY, "  "),
        ]);
        let mut config = ConfigFile::default();
        config.map.api_key = Some("from-file".to_string());

        config.apply_overrides(|name| env.get(name).map(|v| v.to_string()));

        assert_eq!(config.api.base_url, "https://override.example");
        assert_eq!(config.map.api_key.as_deref(), Some("from-file"));
    }

    #[test]
    fn test_loader_config_conversion() {
        let mut config = ConfigFile::default();
        config.map.api_key = Some("abc".to_string());
        config.loader.poll_interval_ms = 250;
        config.loader.init_timeout_secs = 3;

        let loader = config.loader_config();
        assert_eq!(loader.api_key, "abc");
        assert_eq!(loader.poll_interval, Duration::from_millis(250));
        assert_eq!(loader.init_timeout, Duration::from_secs(3));
        assert_eq!(loader.script_poll_attempts, 50);

        let settings = config.map_settings();
        assert_eq!(settings.default_level, DEFAULT_MAP_LEVEL);
        assert_eq!(settings.viewport_debounce, Duration::from_millis(500));
    }
}
