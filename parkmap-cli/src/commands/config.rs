//! `parkmap config` - read and edit the INI settings file.
//!
//! Keys are addressed as `section.key`. Writes go through [`ConfigKey::set`],
//! so a rejected value never reaches the file.

use std::path::Path;

use clap::Subcommand;
use parkmap::config::{ConfigFile, ConfigKey};

use crate::error::CliError;

#[derive(Debug, Subcommand)]
pub enum ConfigCommands {
    /// Print one setting
    Get {
        /// Setting name, e.g. viewport.debounce_ms
        key: String,
    },

    /// Change one setting and save the file
    Set {
        /// Setting name, e.g. map.center_lat
        key: String,

        /// New value; empty clears map.api_key and logging.file
        value: String,
    },

    /// Print every setting grouped by section
    List,

    /// Print where the settings file lives
    Path,
}

pub fn run(command: ConfigCommands, path: &Path) -> Result<(), CliError> {
    match command {
        ConfigCommands::Get { key } => {
            let config = ConfigFile::load_from(path)?;
            println!("{}", display_value(&lookup(&key)?.get(&config)));
            Ok(())
        }
        ConfigCommands::Set { key, value } => {
            let key = lookup(&key)?;
            update(path, key, &value)?;
            println!("{} = {}", key, display_value(&value));
            Ok(())
        }
        ConfigCommands::List => {
            let config = ConfigFile::load_from(path)?;
            print!("{}", render_listing(&config));
            Ok(())
        }
        ConfigCommands::Path => {
            println!("{}", path.display());
            Ok(())
        }
    }
}

fn lookup(name: &str) -> Result<ConfigKey, CliError> {
    name.parse().map_err(|_| {
        CliError::Config(format!(
            "no setting named '{}' (run 'parkmap config list' for the full set)",
            name
        ))
    })
}

fn update(path: &Path, key: ConfigKey, value: &str) -> Result<(), CliError> {
    let mut config = ConfigFile::load_from(path)?;
    key.set(&mut config, value)?;
    config.save_to(path)?;
    tracing::debug!(key = %key, path = %path.display(), "Setting saved");
    Ok(())
}

fn display_value(value: &str) -> &str {
    if value.trim().is_empty() {
        "<unset>"
    } else {
        value
    }
}

fn render_listing(config: &ConfigFile) -> String {
    let mut out = String::new();
    let mut section = None;
    for key in ConfigKey::all() {
        if section != Some(key.section()) {
            if section.is_some() {
                out.push('\n');
            }
            out.push_str(&format!("[{}]\n", key.section()));
            section = Some(key.section());
        }
        out.push_str(&format!(
            "{:<22} {}\n",
            key.key_name(),
            display_value(&key.get(config))
        ));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_update_persists_value() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.ini");

        update(&path, ConfigKey::MapCloseLevel, "2").unwrap();

        let config = ConfigFile::load_from(&path).unwrap();
        assert_eq!(config.map.close_level, 2);
    }

    #[test]
    fn test_unknown_name_is_config_error() {
        assert!(matches!(lookup("map.zoom"), Err(CliError::Config(_))));
    }

    #[test]
    fn test_rejected_value_never_creates_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.ini");

        assert!(update(&path, ConfigKey::ViewportDebounceMs, "soon").is_err());
        assert!(update(&path, ConfigKey::LoaderPollIntervalMs, "0").is_err());
        assert!(update(&path, ConfigKey::MapCenterLat, "95").is_err());
        assert!(!path.exists());
    }

    #[test]
    fn test_listing_groups_by_section() {
        let listing = render_listing(&ConfigFile::default());

        assert!(listing.starts_with("[api]\n"));
        assert!(listing.contains("\n[viewport]\ndebounce_ms"));
        assert!(listing.contains("api_key                <unset>"));
    }
}
