//! parkmap - Parking lots on an interactive map
//!
//! This library fetches parking lots from a backend API and renders them as
//! markers on a map surface provided by an external map SDK.
//!
//! - [`coord`]: coordinates, location validation and bounds
//! - [`parking`]: the parking lot model and its HTTP data source
//! - [`map`]: SDK loading, marker rendering and viewport events
//! - [`usecase`]: the display and listing use cases
//! - [`config`] and [`logging`]: the ambient settings shared with the CLI

pub mod config;
pub mod coord;
pub mod logging;
pub mod map;
pub mod parking;
pub mod usecase;
