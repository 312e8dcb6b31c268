//! AQI classification and persona-adjusted health risk
//!
//! Maps a raw air quality index to one of six health categories and estimates
//! how severe a given ambient reading is for a particular group of people.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::AeroGuardError;

/// Health category bands, ordered from cleanest to worst
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AqiCategory {
    /// 0-50
    Good,
    /// 51-100
    Moderate,
    /// 101-150
    UnhealthyForSensitive,
    /// 151-200
    Unhealthy,
    /// 201-300
    VeryUnhealthy,
    /// 301 and above
    Hazardous,
}

impl AqiCategory {
    pub const ALL: [AqiCategory; 6] = [
        AqiCategory::Good,
        AqiCategory::Moderate,
        AqiCategory::UnhealthyForSensitive,
        AqiCategory::Unhealthy,
        AqiCategory::VeryUnhealthy,
        AqiCategory::Hazardous,
    ];

    /// Band position, 0 for Good through 5 for Hazardous
    #[must_use]
    pub fn ordinal(self) -> usize {
        self as usize
    }

    /// Closed-open interval `[lower, upper)`; `upper` is `None` for the last band
    #[must_use]
    pub fn bounds(self) -> (u32, Option<u32>) {
        match self {
            AqiCategory::Good => (0, Some(51)),
            AqiCategory::Moderate => (51, Some(101)),
            AqiCategory::UnhealthyForSensitive => (101, Some(151)),
            AqiCategory::Unhealthy => (151, Some(201)),
            AqiCategory::VeryUnhealthy => (201, Some(301)),
            AqiCategory::Hazardous => (301, None),
        }
    }

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            AqiCategory::Good => "Good",
            AqiCategory::Moderate => "Moderate",
            AqiCategory::UnhealthyForSensitive => "Unhealthy for Sensitive Groups",
            AqiCategory::Unhealthy => "Unhealthy",
            AqiCategory::VeryUnhealthy => "Very Unhealthy",
            AqiCategory::Hazardous => "Hazardous",
        }
    }

    /// Display palette name used by the dashboard badges
    #[must_use]
    pub fn color(self) -> &'static str {
        match self {
            AqiCategory::Good => "emerald",
            AqiCategory::Moderate => "amber",
            AqiCategory::UnhealthyForSensitive => "orange",
            AqiCategory::Unhealthy => "red",
            AqiCategory::VeryUnhealthy => "purple",
            AqiCategory::Hazardous => "rose",
        }
    }

    #[must_use]
    pub fn health_message(self) -> &'static str {
        match self {
            AqiCategory::Good => "Air quality is satisfactory and poses little or no risk.",
            AqiCategory::Moderate => {
                "Air quality is acceptable. Unusually sensitive people should consider limiting prolonged outdoor exertion."
            }
            AqiCategory::UnhealthyForSensitive => {
                "Members of sensitive groups may experience health effects. The general public is less likely to be affected."
            }
            AqiCategory::Unhealthy => {
                "Some members of the general public may experience health effects; sensitive groups may experience more serious effects."
            }
            AqiCategory::VeryUnhealthy => {
                "Health alert: the risk of health effects is increased for everyone."
            }
            AqiCategory::Hazardous => {
                "Health warning of emergency conditions: everyone is more likely to be affected."
            }
        }
    }
}

impl fmt::Display for AqiCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Classify an AQI value. Total over all non-negative integers.
#[must_use]
pub fn classify(aqi: u32) -> AqiCategory {
    match aqi {
        0..=50 => AqiCategory::Good,
        51..=100 => AqiCategory::Moderate,
        101..=150 => AqiCategory::UnhealthyForSensitive,
        151..=200 => AqiCategory::Unhealthy,
        201..=300 => AqiCategory::VeryUnhealthy,
        _ => AqiCategory::Hazardous,
    }
}

/// Population group used to weight an ambient reading
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Persona {
    #[default]
    General,
    Children,
    Elderly,
    OutdoorWorker,
}

impl Persona {
    pub const ALL: [Persona; 4] = [
        Persona::General,
        Persona::Children,
        Persona::Elderly,
        Persona::OutdoorWorker,
    ];

    #[must_use]
    pub fn risk_multiplier(self) -> f64 {
        match self {
            Persona::General => 1.0,
            Persona::Children => 1.3,
            Persona::Elderly => 1.4,
            Persona::OutdoorWorker => 1.2,
        }
    }

    /// Wire name, matches the serde representation
    #[must_use]
    pub fn key(self) -> &'static str {
        match self {
            Persona::General => "general",
            Persona::Children => "children",
            Persona::Elderly => "elderly",
            Persona::OutdoorWorker => "outdoor-worker",
        }
    }

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Persona::General => "General Public",
            Persona::Children => "Children",
            Persona::Elderly => "Elderly",
            Persona::OutdoorWorker => "Outdoor Worker",
        }
    }

    #[must_use]
    pub fn advice(self) -> &'static str {
        match self {
            Persona::General => {
                "Consider reducing prolonged outdoor activities. Sensitive individuals should limit outdoor exertion."
            }
            Persona::Children => {
                "Avoid outdoor activity after 5 PM when AQI peaks. Keep children indoors during high pollution hours. Ensure windows are closed."
            }
            Persona::Elderly => {
                "Stay indoors during peak pollution hours. Use air purifiers at home. Wear a mask if stepping out. Monitor heart rate and breathing."
            }
            Persona::OutdoorWorker => {
                "Wear an N95 mask throughout your shift. Take frequent breaks in filtered air environments. Stay hydrated and monitor symptoms."
            }
        }
    }
}

impl FromStr for Persona {
    type Err = AeroGuardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = s.trim().to_ascii_lowercase();
        Persona::ALL
            .into_iter()
            .find(|persona| persona.key() == key)
            .ok_or_else(|| {
                AeroGuardError::validation(format!(
                    "unknown persona '{s}', expected one of: general, children, elderly, outdoor-worker"
                ))
            })
    }
}

/// Persona-adjusted risk levels, parallel to the AQI categories
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    Low,
    Moderate,
    High,
    VeryHigh,
    Severe,
}

impl RiskLevel {
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            RiskLevel::Low => "Low",
            RiskLevel::Moderate => "Moderate",
            RiskLevel::High => "High",
            RiskLevel::VeryHigh => "Very High",
            RiskLevel::Severe => "Severe",
        }
    }

    #[must_use]
    pub fn percent(self) -> u8 {
        match self {
            RiskLevel::Low => 20,
            RiskLevel::Moderate => 40,
            RiskLevel::High => 60,
            RiskLevel::VeryHigh => 80,
            RiskLevel::Severe => 100,
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RiskAssessment {
    pub persona: Persona,
    pub level: RiskLevel,
    pub percent: u8,
    /// AQI after the persona multiplier, before any rounding
    pub adjusted_aqi: f64,
}

/// Persona-weighted risk for an ambient reading.
///
/// Thresholds compare the unrounded adjusted value; only the percent is
/// quantized. The two worst AQI bands share the `Severe` level.
#[must_use]
pub fn risk_level(aqi: u32, persona: Persona) -> RiskAssessment {
    let adjusted_aqi = f64::from(aqi) * persona.risk_multiplier();

    let level = if adjusted_aqi <= 50.0 {
        RiskLevel::Low
    } else if adjusted_aqi <= 100.0 {
        RiskLevel::Moderate
    } else if adjusted_aqi <= 150.0 {
        RiskLevel::High
    } else if adjusted_aqi <= 200.0 {
        RiskLevel::VeryHigh
    } else {
        RiskLevel::Severe
    };

    RiskAssessment {
        persona,
        level,
        percent: level.percent(),
        adjusted_aqi,
    }
}

/// Estimated impact on one health condition
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct HealthImpact {
    pub condition: &'static str,
    pub description: &'static str,
    pub percent: u8,
}

const IMPACT_TABLE: [(&str, &str, i16); 4] = [
    (
        "Respiratory Issues",
        "Irritation of airways, coughing, difficulty breathing",
        10,
    ),
    (
        "Cardiovascular Stress",
        "Increased heart rate, blood pressure changes",
        0,
    ),
    ("Eye Irritation", "Burning, watering, redness of eyes", 15),
    (
        "Fatigue & Headache",
        "General discomfort, reduced concentration",
        -10,
    ),
];

/// Per-condition impact derived from a risk assessment, clamped to 0-100
#[must_use]
pub fn health_impacts(risk: &RiskAssessment) -> Vec<HealthImpact> {
    IMPACT_TABLE
        .iter()
        .map(|&(condition, description, shift)| {
            let percent = (i16::from(risk.percent) + shift).clamp(0, 100);
            HealthImpact {
                condition,
                description,
                percent: u8::try_from(percent).unwrap_or(100),
            }
        })
        .collect()
}
