//! Parking lot domain and data source
//!
//! This module provides the parking lot domain model, the location filter
//! applied before rendering, and the repository used to fetch lots from the
//! backend API.
//!
//! # Example
//!
//! ```ignore
//! use parkmap::parking::{HttpParkingLotRepository, ParkingLotRepository, ReqwestClient};
//!
//! let client = ReqwestClient::new()?;
//! let repository = HttpParkingLotRepository::new(client, "http://localhost:8080/api");
//! let lots = repository.find_all().await?;
//! ```

mod api;
mod http;
mod model;
mod repository;
mod service;

pub use api::{decode_parking_lots, HttpParkingLotRepository, PARKING_LOTS_PATH};
pub use http::{AsyncHttpClient, HttpResponse, ReqwestClient};
pub use model::{ParkingLot, ParkingLotDto, SearchParams};
pub use repository::{ParkingLotRepository, RepositoryError};
pub use service::filter_valid_locations;

#[cfg(test)]
pub use http::tests::MockAsyncHttpClient;
