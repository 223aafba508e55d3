use std::sync::Arc;
use tracing::{info, instrument};

use crate::gateway::WeatherGateway;
use crate::repository::WeatherRepository;

/// Fetches current conditions for one location and appends them
pub struct CollectWeatherData {
    gateway: Arc<dyn WeatherGateway>,
    repository: Arc<dyn WeatherRepository>,
}

impl CollectWeatherData {
    pub fn new(gateway: Arc<dyn WeatherGateway>, repository: Arc<dyn WeatherRepository>) -> Self {
        Self {
            gateway,
            repository,
        }
    }

    /// Returns the repository's save outcome; gateway errors are returned as-is.
    #[instrument(skip(self))]
    pub async fn execute(&self, longitude: f64, latitude: f64) -> crate::Result<bool> {
        let weather = self.gateway.get_weather_data(latitude, longitude).await?;
        info!(
            "Observed {} ({}), temperature {}",
            weather.condition_type,
            weather.condition_description,
            weather.format_temperature()
        );
        Ok(self.repository.save_weather(weather).await)
    }
}
