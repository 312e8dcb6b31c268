//! Data models for the AeroGuard core
//!
//! This module contains the core domain models organized by concern:
//! - Location: Coordinates and probe offsets
//! - Station: Station readings, feeds and search hits
//! - Forecast: Derived hourly and daily series

pub mod forecast;
pub mod location;
pub mod station;

// Re-export all public types for convenient access
pub use forecast::{DailyOutlook, DiurnalPoint, ForecastPoint, OutlookSource};
pub use location::{Coordinate, CoordinateDelta};
pub use station::{
    DailyForecastEntry, Pollutants, SearchHit, SearchStation, StationFeed, StationReading,
};
