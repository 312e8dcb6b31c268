//! Dashboard snapshot service
//!
//! Composes the station resolver, the classifier and the forecast estimator
//! into the views the dashboard renders for one coordinate.

use chrono::{DateTime, Local, NaiveDate, Timelike, Utc};
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, instrument, warn};

use crate::classify::{self, AqiCategory, HealthImpact, Persona, RiskAssessment};
use crate::config::{AeroGuardConfig, ForecastConfig};
use crate::forecast::{ForecastEstimator, JitterSource, OutlookSettings};
use crate::models::{
    Coordinate, DailyOutlook, DiurnalPoint, ForecastPoint, SearchHit, StationFeed, StationReading,
};
use crate::provider::AirQualityProvider;
use crate::stations::StationResolver;
use crate::{AeroGuardError, Result};

/// Local wall-clock inputs for the forecast heuristics
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Clock {
    pub hour: u32,
    pub today: NaiveDate,
}

impl Clock {
    #[must_use]
    pub fn now() -> Self {
        let now = Local::now();
        Self {
            hour: now.hour(),
            today: now.date_naive(),
        }
    }
}

/// Category plus its display attributes
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct CategorySummary {
    pub category: AqiCategory,
    pub label: &'static str,
    pub color: &'static str,
    pub message: &'static str,
}

impl From<AqiCategory> for CategorySummary {
    fn from(category: AqiCategory) -> Self {
        Self {
            category,
            label: category.label(),
            color: category.color(),
            message: category.health_message(),
        }
    }
}

/// Station reading labeled for the map
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct StationSummary {
    #[serde(flatten)]
    pub reading: StationReading,
    pub category: CategorySummary,
    /// Distance from the requested center
    pub distance_km: f64,
}

impl StationSummary {
    #[must_use]
    pub fn new(reading: StationReading, center: &Coordinate) -> Self {
        Self {
            category: classify::classify(reading.aqi).into(),
            distance_km: reading.distance_km(center),
            reading,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PersonaRisk {
    pub label: &'static str,
    pub advice: &'static str,
    #[serde(flatten)]
    pub risk: RiskAssessment,
    pub health_impacts: Vec<HealthImpact>,
}

impl PersonaRisk {
    #[must_use]
    pub fn assess(aqi: u32, persona: Persona) -> Self {
        let risk = classify::risk_level(aqi, persona);
        Self {
            label: persona.label(),
            advice: persona.advice(),
            health_impacts: classify::health_impacts(&risk),
            risk,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ForecastBundle {
    pub current_aqi: u32,
    pub hourly: Vec<ForecastPoint>,
    pub diurnal: Vec<DiurnalPoint>,
    pub daily: Vec<DailyOutlook>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DashboardSnapshot {
    pub center: Coordinate,
    pub feed: StationFeed,
    pub category: CategorySummary,
    pub risk: PersonaRisk,
    pub stations: Vec<StationSummary>,
    pub forecast: ForecastBundle,
    pub generated_at: DateTime<Utc>,
}

/// Dashboard composition service
pub struct DashboardService {
    provider: Arc<dyn AirQualityProvider>,
    resolver: StationResolver,
    forecast: ForecastConfig,
}

impl DashboardService {
    pub fn new(provider: Arc<dyn AirQualityProvider>, config: &AeroGuardConfig) -> Self {
        Self {
            resolver: StationResolver::with_grid(provider.clone(), config.stations.grid_delta_deg),
            provider,
            forecast: config.forecast.clone(),
        }
    }

    /// Full snapshot for `center`: current feed, nearby stations, persona
    /// risk and forecasts
    #[instrument(skip(self, clock, jitter))]
    pub async fn snapshot<J: JitterSource + Send>(
        &self,
        center: Coordinate,
        persona: Persona,
        clock: Clock,
        jitter: J,
    ) -> Result<DashboardSnapshot> {
        center.validate()?;

        let (feed, stations) =
            futures::join!(self.provider.feed(center), self.resolver.resolve_nearby(center));
        let feed = feed.map_err(|failure| {
            warn!("Center feed unavailable: {}", failure);
            AeroGuardError::from(failure)
        })?;
        let stations = stations?
            .into_iter()
            .map(|reading| StationSummary::new(reading, &center))
            .collect::<Vec<_>>();

        let forecast = self.build_forecast(&feed, None, None, clock, jitter)?;
        let aqi = feed.reading.aqi;

        info!(
            aqi,
            stations = stations.len(),
            "Built dashboard snapshot for {}",
            feed.reading.name
        );

        Ok(DashboardSnapshot {
            center,
            category: classify::classify(aqi).into(),
            risk: PersonaRisk::assess(aqi, persona),
            stations,
            forecast,
            feed,
            generated_at: Utc::now(),
        })
    }

    /// Labeled stations around `center`
    pub async fn stations(&self, center: Coordinate) -> Result<Vec<StationSummary>> {
        let stations = self.resolver.resolve_nearby(center).await?;
        Ok(stations
            .into_iter()
            .map(|reading| StationSummary::new(reading, &center))
            .collect())
    }

    /// Forecast series for the station nearest to `center`
    #[instrument(skip(self, clock, jitter))]
    pub async fn forecast<J: JitterSource + Send>(
        &self,
        center: Coordinate,
        hours: Option<u32>,
        days: Option<u32>,
        clock: Clock,
        jitter: J,
    ) -> Result<ForecastBundle> {
        center.validate()?;
        let feed = self.provider.feed(center).await?;
        self.build_forecast(&feed, hours, days, clock, jitter)
    }

    /// Keyword search, used to re-center the dashboard
    #[instrument(skip(self))]
    pub async fn search(&self, keyword: &str) -> Result<Vec<SearchHit>> {
        let keyword = keyword.trim();
        if keyword.is_empty() {
            return Err(AeroGuardError::validation("Keyword is required"));
        }
        Ok(self.provider.search(keyword).await?)
    }

    fn build_forecast<J: JitterSource>(
        &self,
        feed: &StationFeed,
        hours: Option<u32>,
        days: Option<u32>,
        clock: Clock,
        jitter: J,
    ) -> Result<ForecastBundle> {
        let mut estimator = ForecastEstimator::new(jitter, OutlookSettings::from(&self.forecast));
        let current_aqi = feed.reading.aqi;

        Ok(ForecastBundle {
            current_aqi,
            hourly: estimator.estimate_hourly(
                current_aqi,
                clock.hour,
                hours.unwrap_or(self.forecast.horizon_hours),
            )?,
            diurnal: estimator.diurnal_curve(current_aqi),
            daily: estimator.daily_outlook(
                feed,
                clock.today,
                days.unwrap_or(self.forecast.horizon_days),
            )?,
        })
    }
}
