//! Short-term AQI estimation
//!
//! Projects a single current reading forward using a time-of-day traffic
//! pattern plus bounded random variation. This is a heuristic for charting,
//! not a prediction model; repeated calls with the same inputs differ in
//! value but never in shape.

use chrono::{Days, NaiveDate};
use rand::RngExt;
use std::ops::Range;
use tracing::debug;

use crate::classify::classify;
use crate::config::ForecastConfig;
use crate::models::{DailyOutlook, DiurnalPoint, ForecastPoint, OutlookSource, StationFeed};
use crate::{AeroGuardError, Result};

/// Lowest value the 24-hour diurnal curve reports
pub const DIURNAL_FLOOR: u32 = 10;

/// Source of uniform random samples
pub trait JitterSource {
    /// Sample from `[range.start, range.end)`
    fn uniform(&mut self, range: Range<f64>) -> f64;
}

/// Thread-local RNG, used outside of tests
#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadJitter;

impl JitterSource for ThreadJitter {
    fn uniform(&mut self, range: Range<f64>) -> f64 {
        if range.is_empty() {
            return range.start;
        }
        rand::rng().random_range(range)
    }
}

/// Traffic-driven periods of the day
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DayPeriod {
    /// 07:00-09:59
    MorningRush,
    /// 17:00-20:59
    EveningRush,
    /// 10:00-14:59
    Midday,
    /// 21:00-05:59
    Night,
    /// Everything in between
    Transition,
}

impl DayPeriod {
    #[must_use]
    pub fn for_hour(hour: u32) -> Self {
        match hour % 24 {
            7..=9 => DayPeriod::MorningRush,
            17..=20 => DayPeriod::EveningRush,
            10..=14 => DayPeriod::Midday,
            21..=23 | 0..=5 => DayPeriod::Night,
            _ => DayPeriod::Transition,
        }
    }

    /// Multiplicative factor range applied to the current reading
    #[must_use]
    pub fn factor_range(self) -> Range<f64> {
        match self {
            DayPeriod::MorningRush => 1.15..1.25,
            DayPeriod::EveningRush => 1.20..1.30,
            DayPeriod::Midday => 0.95..1.05,
            DayPeriod::Night => 0.80..0.90,
            DayPeriod::Transition => 0.925..1.075,
        }
    }
}

/// Daily outlook tuning
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OutlookSettings {
    /// Half-width of the per-day additive jitter
    pub daily_jitter: f64,
    /// Offset of the min/max band around the day's estimate
    pub daily_band: f64,
}

impl Default for OutlookSettings {
    fn default() -> Self {
        Self {
            daily_jitter: 15.0,
            daily_band: 20.0,
        }
    }
}

impl From<&ForecastConfig> for OutlookSettings {
    fn from(config: &ForecastConfig) -> Self {
        Self {
            daily_jitter: config.daily_jitter,
            daily_band: config.daily_band,
        }
    }
}

pub struct ForecastEstimator<J: JitterSource = ThreadJitter> {
    jitter: J,
    settings: OutlookSettings,
}

impl<J: JitterSource> ForecastEstimator<J> {
    pub fn new(jitter: J, settings: OutlookSettings) -> Self {
        Self { jitter, settings }
    }

    /// Hourly trajectory for offsets `0..=horizon_hours`, offset 0 being now
    pub fn estimate_hourly(
        &mut self,
        current_aqi: u32,
        current_hour: u32,
        horizon_hours: u32,
    ) -> Result<Vec<ForecastPoint>> {
        if horizon_hours == 0 {
            return Err(AeroGuardError::config(
                "Forecast horizon must be at least one hour",
            ));
        }
        validate_hour(current_hour)?;

        let points = (0..=horizon_hours)
            .map(|offset_hours| {
                let hour = (current_hour + offset_hours % 24) % 24;
                let factor = self.jitter.uniform(DayPeriod::for_hour(hour).factor_range());
                let estimated_aqi = round_aqi(f64::from(current_aqi) * factor, 0);
                ForecastPoint {
                    offset_hours,
                    hour,
                    estimated_aqi,
                    category: classify(estimated_aqi),
                }
            })
            .collect();

        debug!(current_aqi, current_hour, horizon_hours, "Estimated hourly trajectory");
        Ok(points)
    }

    /// Synthetic daily outlook starting at `today`
    pub fn estimate_daily(
        &mut self,
        current_aqi: u32,
        today: NaiveDate,
        horizon_days: u32,
    ) -> Result<Vec<DailyOutlook>> {
        if horizon_days == 0 {
            return Err(AeroGuardError::config(
                "Daily outlook horizon must be at least one day",
            ));
        }

        let jitter = self.settings.daily_jitter;
        let band = self.settings.daily_band;

        let outlook = (0..horizon_days)
            .map(|day_offset| {
                let date = today.checked_add_days(Days::new(u64::from(day_offset)));
                let estimate = f64::from(current_aqi) + self.jitter.uniform(-jitter..jitter);
                let avg = round_aqi(estimate, 0);
                DailyOutlook {
                    date,
                    day: date.map_or_else(
                        || format!("+{day_offset}d"),
                        |d| d.format("%a").to_string(),
                    ),
                    avg,
                    min: round_aqi(estimate - band, 0),
                    max: round_aqi(estimate + band, 0),
                    category: classify(avg),
                    source: OutlookSource::Estimated,
                }
            })
            .collect();

        Ok(outlook)
    }

    /// Weekly outlook for a feed, preferring the provider's own PM2.5 forecast
    pub fn daily_outlook(
        &mut self,
        feed: &StationFeed,
        today: NaiveDate,
        horizon_days: u32,
    ) -> Result<Vec<DailyOutlook>> {
        if feed.daily_pm25.is_empty() {
            return self.estimate_daily(feed.reading.aqi, today, horizon_days);
        }
        if horizon_days == 0 {
            return Err(AeroGuardError::config(
                "Daily outlook horizon must be at least one day",
            ));
        }

        let outlook = feed
            .daily_pm25
            .iter()
            .take(horizon_days as usize)
            .map(|entry| {
                let date = NaiveDate::parse_from_str(&entry.day, "%Y-%m-%d").ok();
                DailyOutlook {
                    date,
                    day: date.map_or_else(|| entry.day.clone(), |d| d.format("%a").to_string()),
                    avg: entry.avg,
                    min: entry.min,
                    max: entry.max,
                    category: classify(entry.avg),
                    source: OutlookSource::Provider,
                }
            })
            .collect();

        Ok(outlook)
    }

    /// 24-point curve over the hours of a day, floored at [`DIURNAL_FLOOR`]
    pub fn diurnal_curve(&mut self, current_aqi: u32) -> Vec<DiurnalPoint> {
        (0..24u32)
            .map(|hour| {
                let drift = (f64::from(hour) / 4.0).sin() * 15.0;
                let variation = drift + self.jitter.uniform(-5.0..5.0);
                let estimated_aqi = round_aqi(f64::from(current_aqi) + variation, DIURNAL_FLOOR);
                DiurnalPoint {
                    hour,
                    estimated_aqi,
                    category: classify(estimated_aqi),
                }
            })
            .collect()
    }
}

fn validate_hour(hour: u32) -> Result<()> {
    if hour > 23 {
        return Err(AeroGuardError::validation(format!(
            "hour {hour} is outside [0, 23]"
        )));
    }
    Ok(())
}

fn round_aqi(value: f64, floor: u32) -> u32 {
    // float-to-int casts saturate, negative values land on 0
    (value.round() as u32).max(floor)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::AqiCategory;
    use crate::models::{Coordinate, DailyForecastEntry, StationReading};
    use chrono::Utc;
    use rstest::rstest;

    /// Always returns the lower bound
    struct LowJitter;

    impl JitterSource for LowJitter {
        fn uniform(&mut self, range: Range<f64>) -> f64 {
            range.start
        }
    }

    /// Always returns the midpoint
    struct MidJitter;

    impl JitterSource for MidJitter {
        fn uniform(&mut self, range: Range<f64>) -> f64 {
            (range.start + range.end) / 2.0
        }
    }

    fn estimator<J: JitterSource>(jitter: J) -> ForecastEstimator<J> {
        ForecastEstimator::new(jitter, OutlookSettings::default())
    }

    #[rstest]
    #[case(7, DayPeriod::MorningRush)]
    #[case(9, DayPeriod::MorningRush)]
    #[case(10, DayPeriod::Midday)]
    #[case(14, DayPeriod::Midday)]
    #[case(15, DayPeriod::Transition)]
    #[case(16, DayPeriod::Transition)]
    #[case(17, DayPeriod::EveningRush)]
    #[case(20, DayPeriod::EveningRush)]
    #[case(21, DayPeriod::Night)]
    #[case(0, DayPeriod::Night)]
    #[case(5, DayPeriod::Night)]
    #[case(6, DayPeriod::Transition)]
    fn test_day_periods(#[case] hour: u32, #[case] expected: DayPeriod) {
        assert_eq!(DayPeriod::for_hour(hour), expected);
    }

    #[test]
    fn test_hourly_shape() {
        let points = estimator(ThreadJitter).estimate_hourly(100, 12, 6).unwrap();
        assert_eq!(points.len(), 7);
        let offsets: Vec<u32> = points.iter().map(|p| p.offset_hours).collect();
        assert_eq!(offsets, vec![0, 1, 2, 3, 4, 5, 6]);
        let hours: Vec<u32> = points.iter().map(|p| p.hour).collect();
        assert_eq!(hours, vec![12, 13, 14, 15, 16, 17, 18]);
    }

    #[test]
    fn test_hourly_structure_is_stable_across_calls() {
        let mut estimator = estimator(ThreadJitter);
        let first = estimator.estimate_hourly(140, 22, 12).unwrap();
        let second = estimator.estimate_hourly(140, 22, 12).unwrap();
        assert_eq!(first.len(), second.len());
        for (a, b) in first.iter().zip(&second) {
            assert_eq!(a.offset_hours, b.offset_hours);
            assert_eq!(a.hour, b.hour);
        }
    }

    #[test]
    fn test_hourly_zero_stays_zero() {
        let points = estimator(ThreadJitter).estimate_hourly(0, 3, 24).unwrap();
        assert!(points.iter().all(|p| p.estimated_aqi == 0));
    }

    #[test]
    fn test_hourly_values_stay_within_period_bounds() {
        let mut estimator = estimator(ThreadJitter);
        for _ in 0..50 {
            for point in estimator.estimate_hourly(200, 0, 23).unwrap() {
                let range = DayPeriod::for_hour(point.hour).factor_range();
                let low = (200.0 * range.start).round() as u32;
                let high = (200.0 * range.end).round() as u32;
                assert!(
                    (low..=high).contains(&point.estimated_aqi),
                    "hour {} gave {}",
                    point.hour,
                    point.estimated_aqi
                );
            }
        }
    }

    #[test]
    fn test_hourly_with_fixed_jitter() {
        let points = estimator(LowJitter).estimate_hourly(200, 6, 3).unwrap();
        let values: Vec<u32> = points.iter().map(|p| p.estimated_aqi).collect();
        assert_eq!(values, vec![185, 230, 230, 230]);
    }

    #[test]
    fn test_points_carry_category_of_their_value() {
        let mut estimator = estimator(LowJitter);
        let points = estimator.estimate_hourly(200, 6, 1).unwrap();
        assert_eq!(points[0].category, AqiCategory::Unhealthy);
        assert_eq!(points[1].category, AqiCategory::VeryUnhealthy);

        let curve = estimator.diurnal_curve(0);
        assert_eq!(curve[0].category, AqiCategory::Good);

        let today = NaiveDate::from_ymd_opt(2024, 11, 4).unwrap();
        let outlook = estimator.estimate_daily(140, today, 1).unwrap();
        // 140 - 15 = 125
        assert_eq!(outlook[0].avg, 125);
        assert_eq!(outlook[0].category, AqiCategory::UnhealthyForSensitive);
    }

    #[test]
    fn test_hourly_wraps_past_midnight() {
        let points = estimator(MidJitter).estimate_hourly(100, 22, 4).unwrap();
        let hours: Vec<u32> = points.iter().map(|p| p.hour).collect();
        assert_eq!(hours, vec![22, 23, 0, 1, 2]);
        assert!(points.iter().all(|p| p.estimated_aqi == 85));
    }

    #[test]
    fn test_hourly_rejects_bad_input() {
        let mut estimator = estimator(ThreadJitter);
        assert!(matches!(
            estimator.estimate_hourly(100, 12, 0),
            Err(AeroGuardError::Config { .. })
        ));
        assert!(matches!(
            estimator.estimate_hourly(100, 24, 6),
            Err(AeroGuardError::Validation { .. })
        ));
    }

    #[test]
    fn test_daily_outlook_band() {
        let today = NaiveDate::from_ymd_opt(2024, 11, 4).unwrap();
        let outlook = estimator(MidJitter).estimate_daily(100, today, 7).unwrap();
        assert_eq!(outlook.len(), 7);
        assert_eq!(outlook[0].day, "Mon");
        assert_eq!(outlook[6].date, NaiveDate::from_ymd_opt(2024, 11, 10));
        for day in &outlook {
            assert_eq!(day.avg, 100);
            assert_eq!(day.max, 120);
            assert_eq!(day.min, 80);
            assert_eq!(day.source, OutlookSource::Estimated);
        }
    }

    #[test]
    fn test_daily_outlook_floors_at_zero() {
        let today = NaiveDate::from_ymd_opt(2024, 11, 4).unwrap();
        let outlook = estimator(LowJitter).estimate_daily(5, today, 3).unwrap();
        for day in &outlook {
            assert_eq!(day.avg, 0);
            assert_eq!(day.min, 0);
            assert_eq!(day.max, 10);
        }
    }

    #[test]
    fn test_daily_outlook_rejects_zero_days() {
        let today = NaiveDate::from_ymd_opt(2024, 11, 4).unwrap();
        assert!(matches!(
            estimator(ThreadJitter).estimate_daily(100, today, 0),
            Err(AeroGuardError::Config { .. })
        ));
    }

    #[test]
    fn test_daily_outlook_prefers_provider_forecast() {
        let today = NaiveDate::from_ymd_opt(2024, 11, 4).unwrap();
        let reading = StationReading::new(
            1,
            "Mumbai",
            Coordinate { lat: 19.11, lon: 72.93 },
            80,
            Utc::now(),
        );
        let mut feed = StationFeed::from(reading);
        feed.daily_pm25 = vec![
            DailyForecastEntry { day: "2024-11-04".into(), avg: 90, min: 70, max: 110 },
            DailyForecastEntry { day: "2024-11-05".into(), avg: 95, min: 80, max: 120 },
            DailyForecastEntry { day: "2024-11-06".into(), avg: 99, min: 85, max: 130 },
        ];

        let outlook = estimator(ThreadJitter).daily_outlook(&feed, today, 2).unwrap();
        assert_eq!(outlook.len(), 2);
        assert_eq!(outlook[0].day, "Mon");
        assert_eq!(outlook[1].avg, 95);
        assert_eq!(outlook[1].category, AqiCategory::Moderate);
        assert!(outlook.iter().all(|d| d.source == OutlookSource::Provider));
    }

    #[test]
    fn test_diurnal_curve_floor() {
        let curve = estimator(LowJitter).diurnal_curve(0);
        assert_eq!(curve.len(), 24);
        assert!(curve.iter().all(|p| p.estimated_aqi >= DIURNAL_FLOOR));
        assert_eq!(curve[0].estimated_aqi, DIURNAL_FLOOR);
    }

    #[test]
    fn test_diurnal_curve_follows_drift() {
        let curve = estimator(MidJitter).diurnal_curve(100);
        let hours: Vec<u32> = curve.iter().map(|p| p.hour).collect();
        assert_eq!(hours, (0..24).collect::<Vec<_>>());
        assert_eq!(curve[0].estimated_aqi, 100);
        // sin(6 / 4) * 15 = 14.96
        assert_eq!(curve[6].estimated_aqi, 115);
    }
}
