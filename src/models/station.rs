//! Station readings and provider feed payloads

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Coordinate;

/// A single AQI observation at a monitoring station
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct StationReading {
    /// Provider-assigned station id, stable across queries
    pub id: u64,
    /// Station display name
    pub name: String,
    /// Station position
    pub coordinate: Coordinate,
    /// Air quality index
    pub aqi: u32,
    /// When the provider observed this value
    pub observed_at: DateTime<Utc>,
}

impl StationReading {
    #[must_use]
    pub fn new(
        id: u64,
        name: impl Into<String>,
        coordinate: Coordinate,
        aqi: u32,
        observed_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            coordinate,
            aqi,
            observed_at,
        }
    }

    /// Distance from a reference point in kilometers
    #[must_use]
    pub fn distance_km(&self, from: &Coordinate) -> f64 {
        self.coordinate.distance_km(from)
    }
}

/// Individual pollutant sub-indices reported by a station
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct Pollutants {
    pub pm25: Option<f64>,
    pub pm10: Option<f64>,
    pub no2: Option<f64>,
    pub co: Option<f64>,
    pub o3: Option<f64>,
    pub so2: Option<f64>,
}

/// One day of a provider-supplied pollutant forecast
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct DailyForecastEntry {
    /// Day as reported by the provider (`YYYY-MM-DD`)
    pub day: String,
    pub avg: u32,
    pub min: u32,
    pub max: u32,
}

/// Full feed for the station nearest to a point
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct StationFeed {
    pub reading: StationReading,
    pub pollutants: Pollutants,
    /// Dominant pollutant key, e.g. `pm25`
    pub dominant_pollutant: Option<String>,
    /// Genuine PM2.5 daily forecast, empty when the feed has none
    pub daily_pm25: Vec<DailyForecastEntry>,
}

impl From<StationReading> for StationFeed {
    fn from(reading: StationReading) -> Self {
        Self {
            reading,
            pollutants: Pollutants::default(),
            dominant_pollutant: None,
            daily_pm25: Vec::new(),
        }
    }
}

/// Station summary returned by a keyword search
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct SearchHit {
    pub id: u64,
    /// `None` when the provider reports no current value
    pub aqi: Option<u32>,
    /// Provider time string, passed through untouched
    pub observed_at: Option<String>,
    pub station: SearchStation,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct SearchStation {
    pub name: String,
    pub coordinate: Coordinate,
}
