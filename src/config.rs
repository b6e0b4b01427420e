//! Configuration management for the irrigation forecast service
//!
//! Handles loading configuration from files, environment variables,
//! and provides validation for all configuration settings.

use crate::IrrigationError;
use crate::models::Location;
use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IrrigationConfig {
    /// Forecast API configuration
    #[serde(default)]
    pub forecast: ForecastConfig,
    /// ET estimation service configuration
    #[serde(default)]
    pub et: EtConfig,
    /// Water balance and SWL chart settings
    #[serde(default)]
    pub simulation: SimulationConfig,
    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Default field location and HTTP API settings
    #[serde(default)]
    pub defaults: DefaultsConfig,
}

/// Credential that never shows up in `Debug` output or logs
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ApiKey(String);

impl ApiKey {
    pub fn new<S: Into<String>>(key: S) -> Self {
        Self(key.into())
    }

    #[must_use]
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApiKey(***)")
    }
}

/// Forecast API configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForecastConfig {
    /// API key sent as the `apikey` query parameter
    pub api_key: Option<ApiKey>,
    /// Hourly forecast endpoint
    #[serde(default = "default_forecast_url")]
    pub url: String,
    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u32,
    /// Transient-failure retries layered around the client (0 disables)
    #[serde(default)]
    pub max_retries: u32,
}

/// ET estimation service settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EtConfig {
    /// Estimation endpoint receiving one POST per chunk
    #[serde(default = "default_et_url")]
    pub url: String,
    /// Weather station the estimates are computed for
    #[serde(default = "default_station_id")]
    pub station_id: String,
    /// Forecast fields feeding each ET request
    #[serde(default)]
    pub fields: EtFieldNames,
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u32,
    #[serde(default)]
    pub max_retries: u32,
}

/// Forecast field ids for the four ET inputs
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EtFieldNames {
    #[serde(default = "default_temperature_field")]
    pub temperature: String,
    #[serde(default = "default_wind_speed_field")]
    pub wind_speed: String,
    #[serde(default = "default_humidity_field")]
    pub humidity: String,
    #[serde(default = "default_precipitation_field")]
    pub precipitation: String,
}

impl EtFieldNames {
    /// Field ids in ET request order: temperature, wind speed, humidity, precipitation
    #[must_use]
    pub fn as_array(&self) -> [&str; 4] {
        [
            &self.temperature,
            &self.wind_speed,
            &self.humidity,
            &self.precipitation,
        ]
    }
}

/// Water balance settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationConfig {
    /// Soil-water level at the start of the window
    #[serde(default = "default_initial_level")]
    pub initial_level: f64,
    /// Hours covered by one ET estimate
    #[serde(default = "default_chunk_hours")]
    pub chunk_hours: usize,
    /// Lower bound of the target band
    #[serde(default = "default_target_min")]
    pub target_min: f64,
    /// Upper bound of the target band
    #[serde(default = "default_target_max")]
    pub target_max: f64,
    /// Optimal level reference line
    #[serde(default = "default_optimal_level")]
    pub optimal_level: f64,
}

/// Logging configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (error, warn, info, debug, trace)
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Log format (pretty or compact)
    #[serde(default = "default_log_format")]
    pub format: String,
}

/// Default application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DefaultsConfig {
    #[serde(default = "default_latitude")]
    pub latitude: f64,
    #[serde(default = "default_longitude")]
    pub longitude: f64,
    /// Weather chart fields when none are requested
    #[serde(default = "default_weather_fields")]
    pub weather_fields: Vec<String>,
    /// HTTP API port
    #[serde(default = "default_port")]
    pub port: u16,
}

// Default value functions
fn default_forecast_url() -> String {
    "https://api.climacell.co/v3/weather/forecast/hourly".to_string()
}

fn default_et_url() -> String {
    "http://localhost:8001/api/add".to_string()
}

fn default_station_id() -> String {
    "wx8v08a8".to_string()
}

fn default_temperature_field() -> String {
    "temp".to_string()
}

fn default_wind_speed_field() -> String {
    "wind_speed".to_string()
}

fn default_humidity_field() -> String {
    "humidity".to_string()
}

fn default_precipitation_field() -> String {
    "precipitation".to_string()
}

fn default_timeout() -> u32 {
    30
}

fn default_initial_level() -> f64 {
    210.0
}

fn default_chunk_hours() -> usize {
    3
}

fn default_target_min() -> f64 {
    120.0
}

fn default_target_max() -> f64 {
    180.0
}

fn default_optimal_level() -> f64 {
    145.0
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

fn default_latitude() -> f64 {
    38.665_223_4
}

fn default_longitude() -> f64 {
    48.806_469_6
}

fn default_weather_fields() -> Vec<String> {
    vec![
        "temp".to_string(),
        "humidity".to_string(),
        "precipitation".to_string(),
    ]
}

fn default_port() -> u16 {
    8080
}

impl Default for ForecastConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            url: default_forecast_url(),
            timeout_seconds: default_timeout(),
            max_retries: 0,
        }
    }
}

impl Default for EtConfig {
    fn default() -> Self {
        Self {
            url: default_et_url(),
            station_id: default_station_id(),
            fields: EtFieldNames::default(),
            timeout_seconds: default_timeout(),
            max_retries: 0,
        }
    }
}

impl Default for EtFieldNames {
    fn default() -> Self {
        Self {
            temperature: default_temperature_field(),
            wind_speed: default_wind_speed_field(),
            humidity: default_humidity_field(),
            precipitation: default_precipitation_field(),
        }
    }
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            initial_level: default_initial_level(),
            chunk_hours: default_chunk_hours(),
            target_min: default_target_min(),
            target_max: default_target_max(),
            optimal_level: default_optimal_level(),
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

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            latitude: default_latitude(),
            longitude: default_longitude(),
            weather_fields: default_weather_fields(),
            port: default_port(),
        }
    }
}

impl DefaultsConfig {
    /// Location from request coordinates, falling back to the configured field
    pub fn location_or(
        &self,
        latitude: Option<f64>,
        longitude: Option<f64>,
    ) -> crate::Result<Location> {
        Location::new(
            latitude.unwrap_or(self.latitude),
            longitude.unwrap_or(self.longitude),
        )
    }
}

impl IrrigationConfig {
    /// Load configuration from file and environment variables
    pub fn load() -> Result<Self> {
        Self::load_from_path(None)
    }

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

        // IRRIGATION_FORECAST__API_KEY, IRRIGATION_ET__STATION_ID, ...
        builder = builder.add_source(
            Environment::with_prefix("IRRIGATION")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let settings = builder
            .build()
            .with_context(|| "Failed to build configuration")?;

        let mut config: IrrigationConfig = settings
            .try_deserialize()
            .with_context(|| "Failed to deserialize configuration")?;

        config.apply_defaults();
        config.validate()?;

        Ok(config)
    }

    /// Get the default configuration file path
    #[must_use]
    pub fn get_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("irrigation-forecast").join("config.toml"))
    }

    /// Apply default values to empty configuration fields
    pub fn apply_defaults(&mut self) {
        if self.forecast.url.is_empty() {
            self.forecast.url = default_forecast_url();
        }
        if self.forecast.timeout_seconds == 0 {
            self.forecast.timeout_seconds = default_timeout();
        }
        if self.et.url.is_empty() {
            self.et.url = default_et_url();
        }
        if self.et.station_id.is_empty() {
            self.et.station_id = default_station_id();
        }
        if self.et.timeout_seconds == 0 {
            self.et.timeout_seconds = default_timeout();
        }
        if self.simulation.chunk_hours == 0 {
            self.simulation.chunk_hours = default_chunk_hours();
        }
        if self.logging.level.is_empty() {
            self.logging.level = default_log_level();
        }
        if self.logging.format.is_empty() {
            self.logging.format = default_log_format();
        }
        if self.defaults.weather_fields.is_empty() {
            self.defaults.weather_fields = default_weather_fields();
        }
    }

    /// Validate all configuration settings
    pub fn validate(&self) -> Result<()> {
        self.validate_api_keys()?;
        self.validate_numeric_ranges()?;
        self.validate_string_values()?;
        Ok(())
    }

    /// Validate API keys and credentials
    pub fn validate_api_keys(&self) -> Result<()> {
        if let Some(api_key) = &self.forecast.api_key {
            if api_key.expose().trim().is_empty() {
                return Err(IrrigationError::config(
                    "Forecast API key cannot be empty if provided. Either remove it or provide a valid key.",
                )
                .into());
            }
        }
        Ok(())
    }

    fn validate_numeric_ranges(&self) -> Result<()> {
        for (name, timeout) in [
            ("Forecast", self.forecast.timeout_seconds),
            ("ET", self.et.timeout_seconds),
        ] {
            if timeout > 300 {
                return Err(IrrigationError::config(format!(
                    "{name} API timeout cannot exceed 300 seconds"
                ))
                .into());
            }
        }

        if self.forecast.max_retries > 10 || self.et.max_retries > 10 {
            return Err(IrrigationError::config("API max retries cannot exceed 10").into());
        }

        if self.simulation.target_min > self.simulation.target_max {
            return Err(IrrigationError::config(
                "Simulation target_min cannot exceed target_max",
            )
            .into());
        }

        self.defaults.location_or(None, None)?;

        Ok(())
    }

    fn validate_string_values(&self) -> Result<()> {
        let valid_log_levels = ["error", "warn", "info", "debug", "trace"];
        if !valid_log_levels.contains(&self.logging.level.as_str()) {
            return Err(IrrigationError::config(format!(
                "Invalid log level '{}'. Must be one of: {}",
                self.logging.level,
                valid_log_levels.join(", ")
            ))
            .into());
        }

        let valid_log_formats = ["pretty", "compact"];
        if !valid_log_formats.contains(&self.logging.format.as_str()) {
            return Err(IrrigationError::config(format!(
                "Invalid log format '{}'. Must be one of: {}",
                self.logging.format,
                valid_log_formats.join(", ")
            ))
            .into());
        }

        for (name, url) in [("Forecast", &self.forecast.url), ("ET", &self.et.url)] {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(IrrigationError::config(format!(
                    "{name} API URL must be a valid HTTP or HTTPS URL"
                ))
                .into());
            }
        }

        if self.et.fields.as_array().iter().any(|f| f.is_empty()) {
            return Err(IrrigationError::config("ET field names cannot be empty").into());
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = IrrigationConfig::default();
        assert_eq!(
            config.forecast.url,
            "https://api.climacell.co/v3/weather/forecast/hourly"
        );
        assert_eq!(config.forecast.timeout_seconds, 30);
        assert_eq!(config.forecast.max_retries, 0);
        assert_eq!(config.simulation.initial_level, 210.0);
        assert_eq!(config.simulation.chunk_hours, 3);
        assert_eq!(
            config.et.fields.as_array(),
            ["temp", "wind_speed", "humidity", "precipitation"]
        );
        assert!(config.forecast.api_key.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_api_key_is_redacted() {
        let mut config = IrrigationConfig::default();
        config.forecast.api_key = Some(ApiKey::new("super-secret-key"));
        let debug = format!("{config:?}");
        assert!(!debug.contains("super-secret-key"));
        assert!(debug.contains("ApiKey(***)"));
    }

    #[test]
    fn test_config_validation_empty_api_key() {
        let mut config = IrrigationConfig::default();
        config.forecast.api_key = Some(ApiKey::new("  "));
        assert!(config.validate_api_keys().is_err());
    }

    #[test]
    fn test_config_validation_invalid_log_level() {
        let mut config = IrrigationConfig::default();
        config.logging.level = "invalid".to_string();
        let result = config.validate();
        assert!(result.unwrap_err().to_string().contains("Invalid log level"));
    }

    #[test]
    fn test_config_validation_numeric_ranges() {
        let mut config = IrrigationConfig::default();
        config.et.timeout_seconds = 500;
        let result = config.validate();
        assert!(result.unwrap_err().to_string().contains("timeout cannot exceed"));

        let mut config = IrrigationConfig::default();
        config.simulation.target_min = 200.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_validation_bad_url() {
        let mut config = IrrigationConfig::default();
        config.et.url = "ftp://example.com".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_apply_defaults() {
        let mut config = IrrigationConfig::default();
        config.forecast.url.clear();
        config.simulation.chunk_hours = 0;
        config.defaults.weather_fields.clear();
        config.apply_defaults();
        assert_eq!(config.forecast.url, default_forecast_url());
        assert_eq!(config.simulation.chunk_hours, 3);
        assert_eq!(config.defaults.weather_fields.len(), 3);
    }

    #[test]
    fn test_load_from_toml_file() {
        let path = std::env::temp_dir().join(format!(
            "irrigation-forecast-test-{}.toml",
            std::process::id()
        ));
        std::fs::write(
            &path,
            "[forecast]\napi_key = \"file-key-123\"\n\n[simulation]\ninitial_level = 190.0\n",
        )
        .unwrap();

        let config = IrrigationConfig::load_from_path(Some(path.clone())).unwrap();
        std::fs::remove_file(&path).unwrap();

        assert_eq!(
            config.forecast.api_key.as_ref().map(ApiKey::expose),
            Some("file-key-123")
        );
        assert_eq!(config.simulation.initial_level, 190.0);
        assert_eq!(config.simulation.chunk_hours, 3);
    }

    #[test]
    fn test_location_fallback() {
        let defaults = DefaultsConfig::default();
        let location = defaults.location_or(None, Some(10.0)).unwrap();
        assert_eq!(location.latitude, defaults.latitude);
        assert_eq!(location.longitude, 10.0);
        assert!(matches!(
            defaults.location_or(Some(120.0), None),
            Err(IrrigationError::Validation { .. })
        ));
    }

    #[test]
    fn test_config_path_generation() {
        if let Some(path) = IrrigationConfig::get_config_path() {
            assert!(path.to_string_lossy().contains("irrigation-forecast"));
            assert!(path.to_string_lossy().ends_with("config.toml"));
        }
    }
}
