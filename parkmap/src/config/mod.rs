//! Configuration file handling.
//!
//! Settings live in `config.ini` under the platform config directory
//! (`~/.config/parkmap/config.ini` on Linux):
//!
//! ```ini
//! [api]
//! base_url = http://localhost:8080/api
//!
//! [map]
//! api_key = your-app-key
//! center_lat = 37.5665
//! center_lng = 126.978
//! ```
//!
//! `PARKMAP_API_BASE_URL` and `PARKMAP_MAP_API_KEY` override the file.

mod file;
mod keys;

pub use file::{
    config_directory, config_file_path, ApiSettings, ConfigError, ConfigFile, LoaderSection,
    LoggingSection, MapSection, ViewportSection, DEFAULT_API_BASE_URL, DEFAULT_CENTER,
    ENV_API_BASE_URL, ENV_MAP_API_KEY,
};
pub use keys::ConfigKey;
