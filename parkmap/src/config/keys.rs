//! Addressable configuration keys for `config get` / `config set`.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use super::{ConfigError, ConfigFile};

/// A single `section.key` entry of the configuration file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigKey {
    ApiBaseUrl,
    ApiTimeoutSecs,
    MapApiKey,
    MapSdkUrl,
    MapContainerId,
    MapCenterLat,
    MapCenterLng,
    MapDefaultLevel,
    MapCloseLevel,
    LoaderPollIntervalMs,
    LoaderScriptPollAttempts,
    LoaderReadyPollAttempts,
    LoaderInitTimeoutSecs,
    ViewportDebounceMs,
    LoggingLevel,
    LoggingFile,
}

const ALL_KEYS: [ConfigKey; 16] = [
    ConfigKey::ApiBaseUrl,
    ConfigKey::ApiTimeoutSecs,
    ConfigKey::MapApiKey,
    ConfigKey::MapSdkUrl,
    ConfigKey::MapContainerId,
    ConfigKey::MapCenterLat,
    ConfigKey::MapCenterLng,
    ConfigKey::MapDefaultLevel,
    ConfigKey::MapCloseLevel,
    ConfigKey::LoaderPollIntervalMs,
    ConfigKey::LoaderScriptPollAttempts,
    ConfigKey::LoaderReadyPollAttempts,
    ConfigKey::LoaderInitTimeoutSecs,
    ConfigKey::ViewportDebounceMs,
    ConfigKey::LoggingLevel,
    ConfigKey::LoggingFile,
];

impl ConfigKey {
    /// Every key in file order.
    pub fn all() -> &'static [ConfigKey] {
        &ALL_KEYS
    }

    pub fn section(&self) -> &'static str {
        match self {
            Self::ApiBaseUrl | Self::ApiTimeoutSecs => "api",
            Self::MapApiKey
            | Self::MapSdkUrl
            | Self::MapContainerId
            | Self::MapCenterLat
            | Self::MapCenterLng
            | Self::MapDefaultLevel
            | Self::MapCloseLevel => "map",
            Self::LoaderPollIntervalMs
            | Self::LoaderScriptPollAttempts
            | Self::LoaderReadyPollAttempts
            | Self::LoaderInitTimeoutSecs => "loader",
            Self::ViewportDebounceMs => "viewport",
            Self::LoggingLevel | Self::LoggingFile => "logging",
        }
    }

    pub fn key_name(&self) -> &'static str {
        match self {
            Self::ApiBaseUrl => "base_url",
            Self::ApiTimeoutSecs => "timeout_secs",
            Self::MapApiKey => "api_key",
            Self::MapSdkUrl => "sdk_url",
            Self::MapContainerId => "container_id",
            Self::MapCenterLat => "center_lat",
            Self::MapCenterLng => "center_lng",
            Self::MapDefaultLevel => "default_level",
            Self::MapCloseLevel => "close_level",
            Self::LoaderPollIntervalMs => "poll_interval_ms",
            Self::LoaderScriptPollAttempts => "script_poll_attempts",
            Self::LoaderReadyPollAttempts => "ready_poll_attempts",
            Self::LoaderInitTimeoutSecs => "init_timeout_secs",
            Self::ViewportDebounceMs => "debounce_ms",
            Self::LoggingLevel => "level",
            Self::LoggingFile => "file",
        }
    }

    /// Full `section.key` name.
    pub fn name(&self) -> String {
        format!("{}.{}", self.section(), self.key_name())
    }

    /// Current value as text; empty when unset.
    pub fn get(&self, config: &ConfigFile) -> String {
        match self {
            Self::ApiBaseUrl => config.api.base_url.clone(),
            Self::ApiTimeoutSecs => config.api.timeout_secs.to_string(),
            Self::MapApiKey => config.map.api_key.clone().unwrap_or_default(),
            Self::MapSdkUrl => config.map.sdk_url.clone(),
            Self::MapContainerId => config.map.container_id.clone(),
            Self::MapCenterLat => config.map.center_lat.to_string(),
            Self::MapCenterLng => config.map.center_lng.to_string(),
            Self::MapDefaultLevel => config.map.default_level.to_string(),
            Self::MapCloseLevel => config.map.close_level.to_string(),
            Self::LoaderPollIntervalMs => config.loader.poll_interval_ms.to_string(),
            Self::LoaderScriptPollAttempts => config.loader.script_poll_attempts.to_string(),
            Self::LoaderReadyPollAttempts => config.loader.ready_poll_attempts.to_string(),
            Self::LoaderInitTimeoutSecs => config.loader.init_timeout_secs.to_string(),
            Self::ViewportDebounceMs => config.viewport.debounce_ms.to_string(),
            Self::LoggingLevel => config.logging.level.clone(),
            Self::LoggingFile => config
                .logging
                .file
                .as_ref()
                .map(|p| p.display().to_string())
                .unwrap_or_default(),
        }
    }

    /// Parses `value` and stores it; an empty value clears optional keys.
    ///
    /// The configuration is left untouched when the value is out of range.
    pub fn set(&self, config: &mut ConfigFile, value: &str) -> Result<(), ConfigError> {
        let mut candidate = config.clone();
        self.assign(&mut candidate, value.trim())?;
        candidate.validate()?;
        *config = candidate;
        Ok(())
    }

    fn assign(&self, config: &mut ConfigFile, value: &str) -> Result<(), ConfigError> {
        match self {
            Self::ApiBaseUrl => config.api.base_url = value.to_string(),
            Self::ApiTimeoutSecs => config.api.timeout_secs = self.parse(value)?,
            Self::MapApiKey => {
                config.map.api_key = (!value.is_empty()).then(|| value.to_string())
            }
            Self::MapSdkUrl => config.map.sdk_url = value.to_string(),
            Self::MapContainerId => config.map.container_id = value.to_string(),
            Self::MapCenterLat => config.map.center_lat = self.parse(value)?,
            Self::MapCenterLng => config.map.center_lng = self.parse(value)?,
            Self::MapDefaultLevel => config.map.default_level = self.parse(value)?,
            Self::MapCloseLevel => config.map.close_level = self.parse(value)?,
            Self::LoaderPollIntervalMs => config.loader.poll_interval_ms = self.parse(value)?,
            Self::LoaderScriptPollAttempts => {
                config.loader.script_poll_attempts = self.parse(value)?
            }
            Self::LoaderReadyPollAttempts => {
                config.loader.ready_poll_attempts = self.parse(value)?
            }
            Self::LoaderInitTimeoutSecs => config.loader.init_timeout_secs = self.parse(value)?,
            Self::ViewportDebounceMs => config.viewport.debounce_ms = self.parse(value)?,
            Self::LoggingLevel => config.logging.level = value.to_string(),
            Self::LoggingFile => {
                config.logging.file = (!value.is_empty()).then(|| PathBuf::from(value))
            }
        }
        Ok(())
    }

    fn parse<T: FromStr>(&self, value: &str) -> Result<T, ConfigError> {
        value.parse().map_err(|_| ConfigError::InvalidValue {
            section: self.section(),
            key: self.key_name(),
            value: value.to_string(),
        })
    }
}

impl FromStr for ConfigKey {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ALL_KEYS
            .iter()
            .copied()
            .find(|key| key.name() == s)
            .ok_or_else(|| ConfigError::UnknownKey(s.to_string()))
    }
}

impl fmt::Display for ConfigKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.section(), self.key_name())
    }
}
