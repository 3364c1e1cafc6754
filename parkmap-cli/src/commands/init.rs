//! Init command - initialize configuration file.

use std::io::{self, Write};
use std::path::Path;

use parkmap::config::ConfigFile;

use crate::error::CliError;

/// Run the init command.
///
/// Existing settings are kept; only a missing map API key is prompted for.
pub fn run(path: &Path, api_key: Option<String>) -> Result<(), CliError> {
    let mut config = ConfigFile::load_from(path)?;

    if let Some(key) = api_key {
        config.map.api_key = Some(key);
    } else if config.map.api_key.is_none() {
        config.map.api_key = prompt_api_key();
    }
    config.save_to(path)?;

    println!("Configuration file: {}", path.display());
    println!();
    if config.map.api_key.is_none() {
        println!("No map API key set. Add api_key under [map] before running 'parkmap show'.");
    }
    println!("Edit this file to customize parkmap settings.");
    println!("PARKMAP_API_BASE_URL and PARKMAP_MAP_API_KEY override the file when set.");
    Ok(())
}

fn prompt_api_key() -> Option<String> {
    print!("Map SDK app key (press Enter to skip): ");
    io::stdout().flush().ok();

    let mut input = String::new();
    if io::stdin().read_line(&mut input).is_err() {
        return None;
    }
    let input = input.trim();
    if input.is_empty() {
        println!("Skipped.");
        return None;
    }
    Some(input.to_string())
}
