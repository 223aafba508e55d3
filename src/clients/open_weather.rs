//! OpenWeather current weather API client

use reqwest::Url;
use reqwest_middleware::ClientWithMiddleware;
use serde::Deserialize;
use tracing::{debug, instrument};

use super::{build_http_client, decode_response};
use crate::RouteWatchError;
use crate::config::WeatherConfig;

pub const PROVIDER: &str = "openweather";

pub struct OpenWeatherClient {
    http: ClientWithMiddleware,
    api_key: String,
    base_url: String,
    units: String,
}

/// Subset of the current weather response the collector stores
#[derive(Debug, Deserialize)]
pub struct CurrentWeatherResponse {
    #[serde(default)]
    pub weather: Vec<Condition>,
    pub main: MainReadings,
    pub visibility: i64,
    pub wind: Wind,
}

#[derive(Debug, Deserialize)]
pub struct Condition {
    pub main: String,
    pub description: String,
}

#[derive(Debug, Deserialize)]
pub struct MainReadings {
    pub temp: f64,
    pub feels_like: f64,
    pub pressure: f64,
    pub humidity: f64,
}

#[derive(Debug, Deserialize)]
pub struct Wind {
    pub speed: f64,
}

impl OpenWeatherClient {
    pub fn new(config: &WeatherConfig) -> crate::Result<Self> {
        let api_key = config
            .api_key
            .clone()
            .ok_or_else(|| RouteWatchError::config("Missing OpenWeather API key"))?;

        Ok(Self {
            http: build_http_client(config.timeout_seconds, config.max_retries)?,
            api_key,
            base_url: config.base_url.clone(),
            units: config.units.clone(),
        })
    }

    /// Fetch current conditions at a coordinate pair
    #[instrument(skip(self))]
    pub async fn current_weather(
        &self,
        latitude: f64,
        longitude: f64,
    ) -> crate::Result<CurrentWeatherResponse> {
        let url = Url::parse_with_params(
            &self.base_url,
            &[
                ("lat", latitude.to_string()),
                ("lon", longitude.to_string()),
                ("appid", self.api_key.clone()),
                ("units", self.units.clone()),
            ],
        )
        .map_err(|e| RouteWatchError::config(format!("Invalid OpenWeather base URL: {e}")))?;

        debug!("Calling the OpenWeather API");
        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| RouteWatchError::provider(PROVIDER, format!("Request failed: {e}")))?;

        decode_response(PROVIDER, response).await
    }
}
