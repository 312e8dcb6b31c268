//! `AeroGuard` - Hyperlocal air quality aggregation and health guidance
//!
//! This library resolves the cluster of monitoring stations around a
//! coordinate, classifies readings into AQI categories and persona-specific
//! risk levels, and produces short-term AQI estimates.

pub mod api;
pub mod classify;
pub mod config;
pub mod dashboard;
pub mod error;
pub mod forecast;
pub mod models;
pub mod provider;
pub mod stations;
pub mod web;

// Re-export core types for public API
pub use classify::{AqiCategory, Persona, RiskAssessment, RiskLevel, classify, risk_level};
pub use config::AeroGuardConfig;
pub use dashboard::{Clock, DashboardService, DashboardSnapshot};
pub use error::{AeroGuardError, ProviderFailure};
pub use forecast::{ForecastEstimator, JitterSource, ThreadJitter};
pub use models::{Coordinate, ForecastPoint, StationReading};
pub use provider::{AirQualityProvider, WaqiClient};
pub use stations::StationResolver;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Core result type used throughout the library
pub type Result<T> = std::result::Result<T, AeroGuardError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_is_set() {
        assert!(!VERSION.is_empty());
    }
}
