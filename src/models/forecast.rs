//! Derived forecast series. These are recomputed on every call and never stored.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::classify::AqiCategory;

/// Estimated AQI at an hour offset from now
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub struct ForecastPoint {
    /// Hours from now; 0 is the current hour
    pub offset_hours: u32,
    /// Wall-clock hour this point falls on (0-23)
    pub hour: u32,
    pub estimated_aqi: u32,
    pub category: AqiCategory,
}

/// One point of the 24-hour diurnal curve
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub struct DiurnalPoint {
    pub hour: u32,
    pub estimated_aqi: u32,
    pub category: AqiCategory,
}

/// Where a daily outlook entry came from
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum OutlookSource {
    /// Forecast published by the provider
    Provider,
    /// Synthesized from the current reading
    Estimated,
}

/// Daily AQI range for the weekly outlook
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct DailyOutlook {
    pub date: Option<NaiveDate>,
    /// Short weekday name, or the provider's day string
    pub day: String,
    pub avg: u32,
    pub min: u32,
    pub max: u32,
    /// Category of the day's average
    pub category: AqiCategory,
    pub source: OutlookSource,
}
