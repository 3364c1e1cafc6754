//! Application use cases
//!
//! [`DisplayMapMarkers`] composes retrieval, location validation and
//! rendering. [`GetParkingLots`] is the listing half on its own.

mod display;
mod list;
mod types;

pub use display::DisplayMapMarkers;
pub use list::GetParkingLots;
pub use types::{DisplayError, ExecuteOptions};
