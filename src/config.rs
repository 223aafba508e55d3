//! Configuration management for the `RouteWatch` collector
//!
//! Handles loading configuration from files, environment variables,
//! and provides validation for all configuration settings.

use crate::RouteWatchError;
use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Root configuration structure for the `RouteWatch` collector
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct RouteWatchConfig {
    /// Routing provider configuration
    #[serde(default)]
    pub google: GoogleConfig,
    /// Weather provider configuration
    #[serde(default)]
    pub weather: WeatherConfig,
    /// Persistence backend configuration
    #[serde(default)]
    pub storage: StorageConfig,
    /// Recurring job configuration
    #[serde(default)]
    pub scheduler: SchedulerConfig,
    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
    /// What to collect
    #[serde(default)]
    pub collection: CollectionConfig,
}

/// Google Routes API settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GoogleConfig {
    /// Routes API key, required when any route is configured
    pub api_key: Option<String>,
    /// computeRoutes endpoint
    #[serde(default = "default_google_base_url")]
    pub base_url: String,
    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u32,
    /// Transient-failure retries inside the HTTP client, 0 disables
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    /// Routes API travel mode
    #[serde(default = "default_travel_mode")]
    pub travel_mode: String,
    /// Departure time offset from now; must be in the future for traffic-aware estimates
    #[serde(default = "default_departure_offset")]
    pub departure_offset_minutes: u32,
}

/// OpenWeather API settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeatherConfig {
    /// OpenWeather API key, required when any weather location is configured
    pub api_key: Option<String>,
    /// Current weather endpoint
    #[serde(default = "default_weather_base_url")]
    pub base_url: String,
    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u32,
    /// Transient-failure retries inside the HTTP client, 0 disables
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    /// Unit system (standard, metric or imperial)
    #[serde(default = "default_units")]
    pub units: String,
}

/// Storage engine selection
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// Embedded file-based store
    Sqlite,
    /// Client-server store
    Postgres,
}

/// Persistence settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_backend")]
    pub backend: StorageBackend,
    /// Database file for the sqlite backend
    #[serde(default = "default_sqlite_path")]
    pub sqlite_path: String,
    /// Connection URL for the postgres backend
    pub database_url: Option<String>,
    /// Pool size per repository
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

/// Recurring job settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerConfig {
    /// Interval between two runs of the same job
    #[serde(default = "default_interval_minutes")]
    pub interval_minutes: u32,
    /// How often the worker checks for due jobs
    #[serde(default = "default_tick_millis")]
    pub tick_millis: u64,
    /// Run one collection pass right after startup
    #[serde(default = "default_collect_on_startup")]
    pub collect_on_startup: bool,
    /// Grace period for a running job on shutdown
    #[serde(default = "default_shutdown_timeout")]
    pub shutdown_timeout_seconds: u32,
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

/// Routes and locations polled on every run
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct CollectionConfig {
    #[serde(default)]
    pub routes: Vec<RouteTarget>,
    #[serde(default)]
    pub weather: Vec<WeatherTarget>,
}

/// One origin/destination pair to track
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RouteTarget {
    pub origin: String,
    pub destination: String,
    /// Also collect the destination -> origin direction
    #[serde(default)]
    pub round_trip: bool,
}

/// One coordinate pair to observe
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WeatherTarget {
    /// Label used in logs only
    #[serde(default)]
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
}

// Default value functions
fn default_google_base_url() -> String {
    "https://routes.googleapis.com/directions/v2:computeRoutes".to_string()
}

fn default_weather_base_url() -> String {
    "https://api.openweathermap.org/data/2.5/weather".to_string()
}

fn default_timeout() -> u32 {
    30
}

fn default_max_retries() -> u32 {
    2
}

fn default_travel_mode() -> String {
    "DRIVE".to_string()
}

fn default_departure_offset() -> u32 {
    2
}

fn default_units() -> String {
    "metric".to_string()
}

fn default_backend() -> StorageBackend {
    StorageBackend::Sqlite
}

fn default_sqlite_path() -> String {
    "traffic_data.db".to_string()
}

fn default_max_connections() -> u32 {
    2
}

fn default_interval_minutes() -> u32 {
    60
}

fn default_tick_millis() -> u64 {
    1000
}

fn default_collect_on_startup() -> bool {
    true
}

fn default_shutdown_timeout() -> u32 {
    10
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for GoogleConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_google_base_url(),
            timeout_seconds: default_timeout(),
            max_retries: default_max_retries(),
            travel_mode: default_travel_mode(),
            departure_offset_minutes: default_departure_offset(),
        }
    }
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_weather_base_url(),
            timeout_seconds: default_timeout(),
            max_retries: default_max_retries(),
            units: default_units(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: default_backend(),
            sqlite_path: default_sqlite_path(),
            database_url: None,
            max_connections: default_max_connections(),
        }
    }
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            interval_minutes: default_interval_minutes(),
            tick_millis: default_tick_millis(),
            collect_on_startup: default_collect_on_startup(),
            shutdown_timeout_seconds: default_shutdown_timeout(),
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

impl SchedulerConfig {
    #[must_use]
    pub fn interval(&self) -> Duration {
        Duration::from_secs(u64::from(self.interval_minutes) * 60)
    }

    #[must_use]
    pub fn tick(&self) -> Duration {
        Duration::from_millis(self.tick_millis)
    }

    #[must_use]
    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_secs(self.shutdown_timeout_seconds.into())
    }
}

impl RouteWatchConfig {
    /// Load configuration from an explicit file, or from the default locations
    /// when `config_path` is `None`. An explicit path must exist.
    pub fn load_from_path(config_path: Option<PathBuf>) -> Result<Self> {
        let mut builder = Config::builder();

        let config_file = match config_path {
            Some(path) if !path.exists() => {
                return Err(RouteWatchError::config(format!(
                    "Config file {} not found",
                    path.display()
                ))
                .into());
            }
            Some(path) => Some(path),
            None => Self::get_config_path()
                .filter(|path| path.exists())
                .or_else(|| Some(PathBuf::from("config.toml")).filter(|path| path.exists())),
        };

        if let Some(config_file) = config_file {
            builder = builder.add_source(
                File::from(config_file)
                    .required(true)
                    .format(config::FileFormat::Toml),
            );
        }

        // Add environment variable overrides with ROUTEWATCH_ prefix
        builder = builder.add_source(
            Environment::with_prefix("ROUTEWATCH")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let settings = builder
            .build()
            .with_context(|| "Failed to build configuration")?;

        let mut config: RouteWatchConfig = settings
            .try_deserialize()
            .with_context(|| "Failed to deserialize configuration")?;

        // Apply defaults for missing values
        config.apply_defaults();

        // Validate configuration
        config.validate()?;

        Ok(config)
    }

    /// Get the default configuration file path
    #[must_use]
    pub fn get_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("routewatch").join("config.toml"))
    }

    /// Apply default values to missing configuration fields
    pub fn apply_defaults(&mut self) {
        if self.google.base_url.is_empty() {
            self.google.base_url = default_google_base_url();
        }
        if self.google.timeout_seconds == 0 {
            self.google.timeout_seconds = default_timeout();
        }
        if self.google.travel_mode.is_empty() {
            self.google.travel_mode = default_travel_mode();
        }
        if self.weather.base_url.is_empty() {
            self.weather.base_url = default_weather_base_url();
        }
        if self.weather.timeout_seconds == 0 {
            self.weather.timeout_seconds = default_timeout();
        }
        if self.weather.units.is_empty() {
            self.weather.units = default_units();
        }
        if self.storage.sqlite_path.is_empty() {
            self.storage.sqlite_path = default_sqlite_path();
        }
        if self.storage.max_connections == 0 {
            self.storage.max_connections = default_max_connections();
        }
        if self.scheduler.interval_minutes == 0 {
            self.scheduler.interval_minutes = default_interval_minutes();
        }
        if self.scheduler.tick_millis == 0 {
            self.scheduler.tick_millis = default_tick_millis();
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
        self.validate_api_keys()?;
        self.validate_numeric_ranges()?;
        self.validate_string_values()?;
        self.validate_storage()?;
        self.validate_targets()?;
        Ok(())
    }

    /// Validate API keys and credentials
    pub fn validate_api_keys(&self) -> Result<()> {
        if !self.collection.routes.is_empty() {
            check_api_key("Google Routes", self.google.api_key.as_deref())?;
        }
        if !self.collection.weather.is_empty() {
            check_api_key("OpenWeather", self.weather.api_key.as_deref())?;
        }
        Ok(())
    }

    /// Validate numeric configuration ranges
    fn validate_numeric_ranges(&self) -> Result<()> {
        if self.google.timeout_seconds > 300 || self.weather.timeout_seconds > 300 {
            return Err(RouteWatchError::config("Provider timeout cannot exceed 300 seconds").into());
        }

        if self.google.max_retries > 10 || self.weather.max_retries > 10 {
            return Err(RouteWatchError::config("Provider max retries cannot exceed 10").into());
        }

        if self.google.departure_offset_minutes == 0 || self.google.departure_offset_minutes > 60 {
            return Err(RouteWatchError::config(
                "Departure offset must be between 1 and 60 minutes",
            )
            .into());
        }

        if self.scheduler.interval_minutes > 24 * 60 {
            return Err(RouteWatchError::config(
                "Collection interval cannot exceed 1440 minutes (1 day)",
            )
            .into());
        }

        if self.scheduler.tick_millis > 60_000 {
            return Err(RouteWatchError::config("Scheduler tick cannot exceed 60000 ms").into());
        }

        if self.storage.max_connections > 100 {
            return Err(RouteWatchError::config("Storage max connections cannot exceed 100").into());
        }

        Ok(())
    }

    /// Validate string configuration values
    fn validate_string_values(&self) -> Result<()> {
        let valid_log_levels = ["error", "warn", "info", "debug", "trace"];
        if !valid_log_levels.contains(&self.logging.level.as_str()) {
            return Err(RouteWatchError::config(format!(
                "Invalid log level '{}'. Must be one of: {}",
                self.logging.level,
                valid_log_levels.join(", ")
            ))
            .into());
        }

        let valid_log_formats = ["pretty", "json"];
        if !valid_log_formats.contains(&self.logging.format.as_str()) {
            return Err(RouteWatchError::config(format!(
                "Invalid log format '{}'. Must be one of: {}",
                self.logging.format,
                valid_log_formats.join(", ")
            ))
            .into());
        }

        let valid_units = ["standard", "metric", "imperial"];
        if !valid_units.contains(&self.weather.units.as_str()) {
            return Err(RouteWatchError::config(format!(
                "Invalid weather units '{}'. Must be one of: {}",
                self.weather.units,
                valid_units.join(", ")
            ))
            .into());
        }

        for (name, url) in [
            ("Google Routes", &self.google.base_url),
            ("OpenWeather", &self.weather.base_url),
        ] {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(RouteWatchError::config(format!(
                    "{name} base URL must be a valid HTTP or HTTPS URL"
                ))
                .into());
            }
        }

        Ok(())
    }

    fn validate_storage(&self) -> Result<()> {
        if self.storage.backend == StorageBackend::Postgres
            && self.storage.database_url.as_deref().is_none_or(str::is_empty)
        {
            return Err(RouteWatchError::config(
                "The postgres backend requires storage.database_url",
            )
            .into());
        }
        Ok(())
    }

    fn validate_targets(&self) -> Result<()> {
        for route in &self.collection.routes {
            if route.origin.trim().is_empty() || route.destination.trim().is_empty() {
                return Err(RouteWatchError::config(
                    "Route origin and destination cannot be empty",
                )
                .into());
            }
        }

        for location in &self.collection.weather {
            if !(-90.0..=90.0).contains(&location.latitude)
                || !(-180.0..=180.0).contains(&location.longitude)
            {
                return Err(RouteWatchError::config(format!(
                    "Invalid coordinates for weather location '{}': {}, {}",
                    location.name, location.latitude, location.longitude
                ))
                .into());
            }
        }

        Ok(())
    }
}

fn check_api_key(provider: &str, api_key: Option<&str>) -> Result<()> {
    match api_key {
        None | Some("") => Err(RouteWatchError::config(format!(
            "{provider} API key is required when {provider} targets are configured"
        ))
        .into()),
        Some(key) if key.len() < 8 => Err(RouteWatchError::config(format!(
            "{provider} API key appears to be invalid (too short). Please check your API key."
        ))
        .into()),
        Some(_) => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn config_with_route() -> RouteWatchConfig {
        let mut config = RouteWatchConfig::default();
        config.collection.routes.push(RouteTarget {
            origin: "place-home".to_string(),
            destination: "place-work".to_string(),
            round_trip: true,
        });
        config
    }

    #[test]
    fn test_default_config() {
        let config = RouteWatchConfig::default();
        assert_eq!(
            config.google.base_url,
            "https://routes.googleapis.com/directions/v2:computeRoutes"
        );
        assert_eq!(config.google.travel_mode, "DRIVE");
        assert_eq!(config.weather.units, "metric");
        assert_eq!(config.storage.backend, StorageBackend::Sqlite);
        assert_eq!(config.scheduler.interval(), Duration::from_secs(3600));
        assert_eq!(config.scheduler.tick(), Duration::from_secs(1));
        assert_eq!(config.logging.level, "info");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_route_requires_google_key() {
        let config = config_with_route();
        let result = config.validate();
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("Google Routes API key is required"));
    }

    #[test]
    fn test_route_with_valid_key() {
        let mut config = config_with_route();
        config.google.api_key = Some("valid_api_key_123".to_string());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation_invalid_log_level() {
        let mut config = RouteWatchConfig::default();
        config.logging.level = "invalid".to_string();
        let result = config.validate();
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("Invalid log level"));
    }

    #[test]
    fn test_postgres_requires_url() {
        let mut config = RouteWatchConfig::default();
        config.storage.backend = StorageBackend::Postgres;
        assert!(config.validate().is_err());

        config.storage.database_url = Some("postgres://localhost/routewatch".to_string());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_invalid_weather_coordinates() {
        let mut config = RouteWatchConfig::default();
        config.weather.api_key = Some("valid_api_key_123".to_string());
        config.collection.weather.push(WeatherTarget {
            name: "nowhere".to_string(),
            latitude: 123.0,
            longitude: 0.0,
        });
        let result = config.validate();
        assert!(result.unwrap_err().to_string().contains("Invalid coordinates"));
    }

    #[test]
    fn test_apply_defaults_fills_zero_values() {
        let mut config = RouteWatchConfig::default();
        config.scheduler.interval_minutes = 0;
        config.storage.sqlite_path = String::new();
        config.apply_defaults();
        assert_eq!(config.scheduler.interval_minutes, 60);
        assert_eq!(config.storage.sqlite_path, "traffic_data.db");
    }

    #[test]
    fn test_load_from_toml_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            r#"
[google]
api_key = "google_key_123"

[scheduler]
interval_minutes = 30

[[collection.routes]]
origin = "ChIJ-home"
destination = "ChIJ-work"
round_trip = true
"#
        )
        .unwrap();

        let config = RouteWatchConfig::load_from_path(Some(file.path().to_path_buf())).unwrap();
        assert_eq!(config.scheduler.interval_minutes, 30);
        assert_eq!(config.collection.routes.len(), 1);
        assert!(config.collection.routes[0].round_trip);
        assert_eq!(config.weather.base_url, default_weather_base_url());
    }

    #[test]
    fn test_missing_explicit_config_file_is_an_error() {
        let dir = tempfile::TempDir::new().unwrap();
        let missing = dir.path().join("config.toml");

        let err = RouteWatchConfig::load_from_path(Some(missing)).unwrap_err();
        assert!(err.to_string().contains("not found"));
        assert!(matches!(
            err.downcast_ref::<RouteWatchError>(),
            Some(RouteWatchError::Config { .. })
        ));
    }

    #[test]
    fn test_config_path_generation() {
        if let Some(path) = RouteWatchConfig::get_config_path() {
            assert!(path.to_string_lossy().contains("routewatch"));
            assert!(path.to_string_lossy().contains("config.toml"));
        }
    }
}
