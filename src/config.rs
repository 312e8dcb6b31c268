//! Configuration management for `AeroGuard`
//!
//! Handles loading configuration from files, environment variables,
//! and provides validation for all configuration settings.

use crate::AeroGuardError;
use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Legacy environment variable holding the provider access token
pub const TOKEN_ENV_VAR: &str = "AQICN_API_TOKEN";

/// Longest hourly forecast horizon accepted
pub const MAX_HORIZON_HOURS: u32 = 72;

/// Longest daily outlook accepted
pub const MAX_HORIZON_DAYS: u32 = 14;

/// Root configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AeroGuardConfig {
    /// Air quality provider settings
    #[serde(default)]
    pub provider: ProviderConfig,
    /// Nearby station probing
    #[serde(default)]
    pub stations: StationsConfig,
    /// Forecast heuristics
    #[serde(default)]
    pub forecast: ForecastConfig,
    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
    /// HTTP server
    #[serde(default)]
    pub server: ServerConfig,
}

/// Air quality provider settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Access token for the WAQI feed
    pub token: Option<String>,
    /// Base URL of the provider API
    #[serde(default = "default_provider_base_url")]
    pub base_url: String,
    /// Per-request timeout in seconds
    #[serde(default = "default_provider_timeout")]
    pub timeout_seconds: u32,
}

/// Nearby station probing settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StationsConfig {
    /// Spacing of the probe grid in degrees (0.1° is roughly 11 km)
    #[serde(default = "default_grid_delta")]
    pub grid_delta_deg: f64,
}

/// Forecast heuristic settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForecastConfig {
    /// Hours ahead in the hourly trajectory
    #[serde(default = "default_horizon_hours")]
    pub horizon_hours: u32,
    /// Days in the weekly outlook
    #[serde(default = "default_horizon_days")]
    pub horizon_days: u32,
    /// Half-width of the daily jitter
    #[serde(default = "default_daily_jitter")]
    pub daily_jitter: f64,
    /// Offset of the daily min/max band
    #[serde(default = "default_daily_band")]
    pub daily_band: f64,
}

/// Logging configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (error, warn, info, debug, trace)
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Log format (pretty or json)
    #[serde(default = "default_log_format")]
    pub format: String,
}

/// HTTP server settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_server_port")]
    pub port: u16,
}

// Default value functions
fn default_provider_base_url() -> String {
    "https://api.waqi.info".to_string()
}

fn default_provider_timeout() -> u32 {
    10
}

fn default_grid_delta() -> f64 {
    0.1
}

fn default_horizon_hours() -> u32 {
    6
}

fn default_horizon_days() -> u32 {
    7
}

fn default_daily_jitter() -> f64 {
    15.0
}

fn default_daily_band() -> f64 {
    20.0
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

fn default_server_port() -> u16 {
    8080
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            token: None,
            base_url: default_provider_base_url(),
            timeout_seconds: default_provider_timeout(),
        }
    }
}

impl Default for StationsConfig {
    fn default() -> Self {
        Self {
            grid_delta_deg: default_grid_delta(),
        }
    }
}

impl Default for ForecastConfig {
    fn default() -> Self {
        Self {
            horizon_hours: default_horizon_hours(),
            horizon_days: default_horizon_days(),
            daily_jitter: default_daily_jitter(),
            daily_band: default_daily_band(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: default_server_port(),
        }
    }
}

impl Default for AeroGuardConfig {
    fn default() -> Self {
        Self {
            provider: ProviderConfig::default(),
            stations: StationsConfig::default(),
            forecast: ForecastConfig::default(),
            logging: LoggingConfig::default(),
            server: ServerConfig::default(),
        }
    }
}

impl AeroGuardConfig {
    /// Load configuration from specified path
    pub fn load_from_path(config_path: Option<PathBuf>) -> Result<Self> {
        let mut builder = Config::builder();

        let config_file = config_path.unwrap_or_else(|| {
            Self::get_config_path().unwrap_or_else(|| PathBuf::from("config.toml"))
        });

        if config_file.exists() {
            builder = builder.add_source(
                File::from(config_file.clone())
                    .required(false)
                    .format(config::FileFormat::Toml),
            );
        }

        // AEROGUARD_PROVIDER__TOKEN, AEROGUARD_SERVER__PORT, ...
        builder = builder.add_source(
            Environment::with_prefix("AEROGUARD")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let settings = builder
            .build()
            .with_context(|| "Failed to build configuration")?;

        let mut config: AeroGuardConfig = settings
            .try_deserialize()
            .with_context(|| "Failed to deserialize configuration")?;

        if config.provider.token.is_none() {
            config.provider.token = std::env::var(TOKEN_ENV_VAR).ok();
        }

        config.apply_defaults();
        config.validate()?;

        Ok(config)
    }

    /// Get the default configuration file path
    #[must_use]
    pub fn get_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("aeroguard").join("config.toml"))
    }

    /// Apply default values to missing configuration fields
    pub fn apply_defaults(&mut self) {
        if self.provider.base_url.is_empty() {
            self.provider.base_url = default_provider_base_url();
        }
        if self.provider.timeout_seconds == 0 {
            self.provider.timeout_seconds = default_provider_timeout();
        }
        if self.stations.grid_delta_deg == 0.0 {
            self.stations.grid_delta_deg = default_grid_delta();
        }
        if self.forecast.horizon_hours == 0 {
            self.forecast.horizon_hours = default_horizon_hours();
        }
        if self.forecast.horizon_days == 0 {
            self.forecast.horizon_days = default_horizon_days();
        }
        if self.logging.level.is_empty() {
            self.logging.level = default_log_level();
        }
        if self.logging.format.is_empty() {
            self.logging.format = default_log_format();
        }
    }

    /// Validate all configuration settings
    pub fn validate(&self) -> Result<()> {
        self.validate_token()?;
        self.validate_numeric_ranges()?;
        self.validate_string_values()?;
        Ok(())
    }

    /// The token is optional at load time, but must look sane when present
    pub fn validate_token(&self) -> Result<()> {
        if let Some(token) = &self.provider.token {
            if token.trim().is_empty() {
                return Err(AeroGuardError::config(
                    "Provider token cannot be empty if provided. Either remove it or provide a valid token.",
                )
                .into());
            }
            if token.len() > 200 {
                return Err(AeroGuardError::config(
                    "Provider token appears to be invalid (too long). Please check your token.",
                )
                .into());
            }
        }
        Ok(())
    }

    /// Validate numeric configuration ranges
    fn validate_numeric_ranges(&self) -> Result<()> {
        if self.provider.timeout_seconds > 120 {
            return Err(
                AeroGuardError::config("Provider timeout cannot exceed 120 seconds").into(),
            );
        }

        let delta = self.stations.grid_delta_deg;
        if !delta.is_finite() || delta <= 0.0 || delta > 1.0 {
            return Err(AeroGuardError::config(
                "Station grid delta must be within (0, 1] degrees",
            )
            .into());
        }

        if self.forecast.horizon_hours > MAX_HORIZON_HOURS {
            return Err(AeroGuardError::config(format!(
                "Forecast horizon cannot exceed {MAX_HORIZON_HOURS} hours"
            ))
            .into());
        }

        if self.forecast.horizon_days > MAX_HORIZON_DAYS {
            return Err(AeroGuardError::config(format!(
                "Daily outlook cannot exceed {MAX_HORIZON_DAYS} days"
            ))
            .into());
        }

        if !(self.forecast.daily_jitter >= 0.0 && self.forecast.daily_band >= 0.0) {
            return Err(AeroGuardError::config(
                "Daily jitter and band must be non-negative",
            )
            .into());
        }

        Ok(())
    }

    /// Validate string configuration values
    fn validate_string_values(&self) -> Result<()> {
        let valid_log_levels = ["error", "warn", "info", "debug", "trace"];
        if !valid_log_levels.contains(&self.logging.level.as_str()) {
            return Err(AeroGuardError::config(format!(
                "Invalid log level '{}'. Must be one of: {}",
                self.logging.level,
                valid_log_levels.join(", ")
            ))
            .into());
        }

        let valid_log_formats = ["pretty", "json"];
        if !valid_log_formats.contains(&self.logging.format.as_str()) {
            return Err(AeroGuardError::config(format!(
                "Invalid log format '{}'. Must be one of: {}",
                self.logging.format,
                valid_log_formats.join(", ")
            ))
            .into());
        }

        if !self.provider.base_url.starts_with("http://")
            && !self.provider.base_url.starts_with("https://")
        {
            return Err(AeroGuardError::config(
                "Provider base URL must be a valid HTTP or HTTPS URL",
            )
            .into());
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AeroGuardConfig::default();
        assert_eq!(config.provider.base_url, "https://api.waqi.info");
        assert_eq!(config.provider.timeout_seconds, 10);
        assert_eq!(config.stations.grid_delta_deg, 0.1);
        assert_eq!(config.forecast.horizon_hours, 6);
        assert_eq!(config.forecast.horizon_days, 7);
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.server.port, 8080);
        assert!(config.provider.token.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_empty_token_rejected() {
        let mut config = AeroGuardConfig::default();
        config.provider.token = Some("  ".to_string());
        assert!(config.validate_token().is_err());

        config.provider.token = Some("demo".to_string());
        assert!(config.validate_token().is_ok());
    }

    #[test]
    fn test_config_validation_invalid_log_level() {
        let mut config = AeroGuardConfig::default();
        config.logging.level = "invalid".to_string();
        let result = config.validate();
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("Invalid log level"));
    }

    #[test]
    fn test_config_validation_numeric_ranges() {
        let mut config = AeroGuardConfig::default();
        config.provider.timeout_seconds = 500;
        let result = config.validate();
        assert!(result.unwrap_err().to_string().contains("timeout cannot exceed"));

        let mut config = AeroGuardConfig::default();
        config.stations.grid_delta_deg = -0.1;
        assert!(config.validate().is_err());

        let mut config = AeroGuardConfig::default();
        config.forecast.daily_jitter = f64::NAN;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_apply_defaults_fills_zero_values() {
        let mut config = AeroGuardConfig::default();
        config.forecast.horizon_hours = 0;
        config.provider.base_url.clear();
        config.apply_defaults();
        assert_eq!(config.forecast.horizon_hours, 6);
        assert_eq!(config.provider.base_url, "https://api.waqi.info");
    }

    #[test]
    fn test_load_from_toml_file() {
        let path = std::env::temp_dir().join(format!(
            "aeroguard-config-test-{}.toml",
            std::process::id()
        ));
        std::fs::write(
            &path,
            "[provider]\ntoken = \"file-token\"\n\n[stations]\ngrid_delta_deg = 0.2\n\n[server]\nport = 9090\n",
        )
        .unwrap();

        let config = AeroGuardConfig::load_from_path(Some(path.clone()));
        std::fs::remove_file(&path).unwrap();

        let config = config.unwrap();
        assert_eq!(config.provider.token.as_deref(), Some("file-token"));
        assert_eq!(config.stations.grid_delta_deg, 0.2);
        assert_eq!(config.server.port, 9090);
        assert_eq!(config.forecast.horizon_days, 7);
    }

    #[test]
    fn test_config_path_generation() {
        if let Some(path) = AeroGuardConfig::get_config_path() {
            assert!(path.to_string_lossy().contains("aeroguard"));
            assert!(path.to_string_lossy().contains("config.toml"));
        }
    }
}
