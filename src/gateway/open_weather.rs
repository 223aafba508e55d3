use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::instrument;

use super::WeatherGateway;
use crate::RouteWatchError;
use crate::clients::OpenWeatherClient;
use crate::clients::open_weather::{CurrentWeatherResponse, PROVIDER};
use crate::models::WeatherSnapshot;

/// Weather gateway backed by the OpenWeather current weather API
pub struct OpenWeatherGateway {
    client: OpenWeatherClient,
}

impl OpenWeatherGateway {
    #[must_use]
    pub fn new(client: OpenWeatherClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl WeatherGateway for OpenWeatherGateway {
    #[instrument(skip(self))]
    async fn get_weather_data(
        &self,
        latitude: f64,
        longitude: f64,
    ) -> crate::Result<WeatherSnapshot> {
        let response = self.client.current_weather(latitude, longitude).await?;
        weather_from_response(response, Utc::now())
    }
}

/// Map a current weather answer into a snapshot; the first condition wins
pub fn weather_from_response(
    response: CurrentWeatherResponse,
    observed_at: DateTime<Utc>,
) -> crate::Result<WeatherSnapshot> {
    let condition = response
        .weather
        .into_iter()
        .next()
        .ok_or_else(|| RouteWatchError::payload(PROVIDER, "no weather condition in response"))?;

    Ok(WeatherSnapshot {
        condition_type: condition.main,
        condition_description: condition.description,
        temperature: response.main.temp,
        feels_like: response.main.feels_like,
        pressure: response.main.pressure,
        visibility: response.visibility,
        wind_speed: response.wind.speed,
        humidity: response.main.humidity,
        observed_at,
    })
}
