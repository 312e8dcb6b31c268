//! Coordinate model for geographic points and probe offsets

use serde::{Deserialize, Serialize};

use crate::{AeroGuardError, Result};

/// Geographic point in decimal degrees
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
pub struct Coordinate {
    /// Latitude in decimal degrees, [-90, 90]
    pub lat: f64,
    /// Longitude in decimal degrees, [-180, 180]
    pub lon: f64,
}

/// Latitude/longitude shift applied to a [`Coordinate`]
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
pub struct CoordinateDelta {
    pub dlat: f64,
    pub dlon: f64,
}

impl CoordinateDelta {
    #[must_use]
    pub const fn new(dlat: f64, dlon: f64) -> Self {
        Self { dlat, dlon }
    }
}

impl Coordinate {
    /// Create a validated coordinate
    pub fn new(lat: f64, lon: f64) -> Result<Self> {
        let coordinate = Self { lat, lon };
        coordinate.validate()?;
        Ok(coordinate)
    }

    /// Check that both components are finite and within range
    pub fn validate(&self) -> Result<()> {
        if !self.lat.is_finite() || !(-90.0..=90.0).contains(&self.lat) {
            return Err(AeroGuardError::validation(format!(
                "latitude {} is outside [-90, 90]",
                self.lat
            )));
        }
        if !self.lon.is_finite() || !(-180.0..=180.0).contains(&self.lon) {
            return Err(AeroGuardError::validation(format!(
                "longitude {} is outside [-180, 180]",
                self.lon
            )));
        }
        Ok(())
    }

    /// Shift by a delta. The result is not re-validated, so offsets near the
    /// poles or the antimeridian may leave the valid range.
    #[must_use]
    pub fn offset_by(&self, delta: CoordinateDelta) -> Self {
        Self {
            lat: self.lat + delta.dlat,
            lon: self.lon + delta.dlon,
        }
    }

    /// Great-circle distance in kilometers
    #[must_use]
    pub fn distance_km(&self, other: &Coordinate) -> f64 {
        haversine::distance(
            haversine::Location {
                latitude: self.lat,
                longitude: self.lon,
            },
            haversine::Location {
                latitude: other.lat,
                longitude: other.lon,
            },
            haversine::Units::Kilometers,
        )
    }

    /// Provider feed key, `geo:{lat};{lon}`
    #[must_use]
    pub fn geo_key(&self) -> String {
        format!("geo:{};{}", self.lat, self.lon)
    }

    /// Format as a coordinates string
    #[must_use]
    pub fn format_coordinates(&self) -> String {
        format!("{:.4}, {:.4}", self.lat, self.lon)
    }
}
