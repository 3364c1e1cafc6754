//! Common types and utilities shared across CLI commands.

use std::sync::Arc;

use clap::Args;
use parkmap::config::ConfigFile;
use parkmap::parking::{HttpParkingLotRepository, ParkingLot, ReqwestClient, SearchParams};

use crate::error::CliError;

/// Search filters accepted by `list` and `show`.
#[derive(Debug, Clone, Default, Args)]
pub struct FilterArgs {
    /// District (gu), e.g. Jongno-gu
    #[arg(long)]
    pub district: Option<String>,

    /// Neighbourhood (dong)
    #[arg(long)]
    pub dong: Option<String>,

    /// Part of the parking lot name
    #[arg(long)]
    pub name: Option<String>,

    /// Part of the address
    #[arg(long)]
    pub address: Option<String>,

    /// Parking lot category
    #[arg(long = "type", value_name = "TYPE")]
    pub category: Option<String>,
}

impl FilterArgs {
    /// Search parameters, `None` when no filter was given.
    pub fn to_search_params(&self) -> Option<SearchParams> {
        let params = SearchParams {
            district: self.district.clone(),
            dong: self.dong.clone(),
            name: self.name.clone(),
            address: self.address.clone(),
            category: self.category.clone(),
        };
        (!params.is_empty()).then_some(params)
    }
}

/// Builds the HTTP repository from the `[api]` settings.
pub fn build_repository(
    config: &ConfigFile,
) -> Result<Arc<HttpParkingLotRepository<ReqwestClient>>, CliError> {
    let client = ReqwestClient::with_timeout(config.api.timeout_secs)
        .map_err(|e| CliError::Config(e.to_string()))?;
    Ok(Arc::new(HttpParkingLotRepository::new(
        client,
        config.api.base_url.clone(),
    )))
}

/// Prints lots as an aligned table.
pub fn print_lots(lots: &[ParkingLot]) {
    if lots.is_empty() {
        println!("No parking lots found.");
        return;
    }

    println!(
        "{:>6}  {:<28} {:>10} {:>11}  {:>9}",
        "ID", "NAME", "LAT", "LNG", "SPACES"
    );
    for lot in lots {
        let spaces = match lot.available {
            Some(available) => format!("{}/{}", available, lot.capacity),
            None => lot.capacity.to_string(),
        };
        println!(
            "{:>6}  {:<28} {:>10.5} {:>11.5}  {:>9}",
            lot.id,
            truncate(&lot.name, 28),
            lot.location.latitude.unwrap_or_default(),
            lot.location.longitude.unwrap_or_default(),
            spaces
        );
    }
    println!();
    println!("{} parking lot(s)", lots.len());
}

fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        return text.to_string();
    }
    let mut out: String = text.chars().take(width.saturating_sub(1)).collect();
    out.push('…');
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_filters_mean_full_listing() {
        assert_eq!(FilterArgs::default().to_search_params(), None);
    }

    #[test]
    fn test_filters_become_search_params() {
        let args = FilterArgs {
            district: Some("Mapo-gu".to_string()),
            category: Some("public".to_string()),
            ..FilterArgs::default()
        };
        let params = args.to_search_params().unwrap();
        assert_eq!(params.district.as_deref(), Some("Mapo-gu"));
        assert_eq!(params.category.as_deref(), Some("public"));
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("a very long parking lot name", 8).chars().count(), 8);
    }
}
