//! Data gateways: fetch provider data and map it into snapshots
//!
//! Use cases only see the traits below. Gateways do not retry; a provider
//! failure comes back as an error and aborts the caller's current run.

pub mod google_maps;
pub mod open_weather;

pub use google_maps::GoogleMapsTrafficGateway;
pub use open_weather::OpenWeatherGateway;

use async_trait::async_trait;

use crate::models::{RouteSnapshot, WeatherSnapshot};

#[async_trait]
pub trait TrafficGateway: Send + Sync {
    /// Current routes from `origin` to `destination`, the primary route first.
    /// Every snapshot of one call carries the same `observed_at`.
    async fn get_route_data(
        &self,
        origin: &str,
        destination: &str,
    ) -> crate::Result<Vec<RouteSnapshot>>;
}

#[async_trait]
pub trait WeatherGateway: Send + Sync {
    async fn get_weather_data(
        &self,
        latitude: f64,
        longitude: f64,
    ) -> crate::Result<WeatherSnapshot>;
}
