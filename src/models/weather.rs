//! Weather snapshot model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Current weather conditions at one location
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct WeatherSnapshot {
    /// Condition group, e.g. "Clouds" or "Rain"
    pub condition_type: String,
    /// Human-readable condition, e.g. "overcast clouds"
    pub condition_description: String,
    /// Temperature in the configured units (Celsius by default)
    pub temperature: f64,
    pub feels_like: f64,
    /// Atmospheric pressure in hPa
    pub pressure: f64,
    /// Visibility in meters
    pub visibility: i64,
    /// Wind speed in m/s (metric units)
    pub wind_speed: f64,
    /// Relative humidity in percent
    pub humidity: f64,
    pub observed_at: DateTime<Utc>,
}

impl WeatherSnapshot {
    /// Temperature rounded to one decimal, in whatever units were requested
    #[must_use]
    pub fn format_temperature(&self) -> String {
        format!("{:.1}", self.temperature)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_temperature() {
        let snapshot = WeatherSnapshot {
            condition_type: "Clear".to_string(),
            condition_description: "clear sky".to_string(),
            temperature: 21.04,
            feels_like: 20.5,
            pressure: 1012.0,
            visibility: 10_000,
            wind_speed: 2.0,
            humidity: 40.0,
            observed_at: Utc::now(),
        };
        assert_eq!(snapshot.format_temperature(), "21.0");
    }
}
