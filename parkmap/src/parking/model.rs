//! Parking lot domain entity, wire DTO and search filters.

use serde::{Deserialize, Serialize};

use crate::coord::LocationPoint;

/// A parking lot as shown on the map.
///
/// Values are built once from a [`ParkingLotDto`] and never mutated; a fresh
/// set is fetched for every render cycle.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParkingLot {
    pub id: u64,
    pub name: String,
    pub address: String,
    pub location: LocationPoint,
    /// Total number of spaces.
    pub capacity: u32,
    /// Currently free spaces, when the backend reports them.
    pub available: Option<u32>,
    pub category: String,
    pub operating_hours: Option<String>,
    pub phone: Option<String>,
}

impl ParkingLot {
    /// Returns `true` if the lot can be placed on the map.
    pub fn has_valid_location(&self) -> bool {
        self.location.is_valid()
    }
}

/// Parking lot record as sent by the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParkingLotDto {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
    #[serde(default)]
    pub total_spaces: u32,
    #[serde(default)]
    pub available_spaces: Option<u32>,
    #[serde(rename = "type", default)]
    pub category: String,
    #[serde(default)]
    pub operating_hours: Option<String>,
    #[serde(default)]
    pub phone_number: Option<String>,
}

impl From<ParkingLotDto> for ParkingLot {
    fn from(dto: ParkingLotDto) -> Self {
        Self {
            id: dto.id,
            name: dto.name,
            address: dto.address,
            location: LocationPoint::from_parts(dto.latitude, dto.longitude),
            capacity: dto.total_spaces,
            available: dto.available_spaces,
            category: dto.category,
            operating_hours: dto.operating_hours,
            phone: dto.phone_number,
        }
    }
}

/// Optional filters for a parking lot query.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchParams {
    pub district: Option<String>,
    pub dong: Option<String>,
    pub name: Option<String>,
    pub address: Option<String>,
    pub category: Option<String>,
}

impl SearchParams {
    pub fn with_district(mut self, district: impl Into<String>) -> Self {
        self.district = Some(district.into());
        self
    }

    pub fn with_dong(mut self, dong: impl Into<String>) -> Self {
        self.dong = Some(dong.into());
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_address(mut self, address: impl Into<String>) -> Self {
        self.address = Some(address.into());
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    /// Returns `true` if no filter carries a non-blank value.
    pub fn is_empty(&self) -> bool {
        self.to_query().is_empty()
    }

    /// Query string pairs for the non-blank filters, in a stable order.
    pub fn to_query(&self) -> Vec<(&'static str, String)> {
        [
            ("district", &self.district),
            ("dong", &self.dong),
            ("name", &self.name),
            ("address", &self.address),
            ("type", &self.category),
        ]
        .into_iter()
        .filter_map(|(key, value)| {
            value
                .as_deref()
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(|v| (key, v.to_string()))
        })
        .collect()
    }
}
