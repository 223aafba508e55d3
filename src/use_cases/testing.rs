//! In-memory gateways and repositories for use case tests

use async_trait::async_trait;
use chrono::Utc;
use std::collections::VecDeque;
use std::sync::Mutex;

use crate::RouteWatchError;
use crate::gateway::{TrafficGateway, WeatherGateway};
use crate::models::{RouteKind, RouteSnapshot, WeatherSnapshot};
use crate::repository::{TrafficRepository, WeatherRepository};

/// Returns `routes` snapshots per call, or fails every call
pub struct FakeTrafficGateway {
    routes: Option<usize>,
    calls: Mutex<Vec<(String, String)>>,
}

impl FakeTrafficGateway {
    pub fn returning(routes: usize) -> Self {
        Self {
            routes: Some(routes),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn failing() -> Self {
        Self {
            routes: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<(String, String)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl TrafficGateway for FakeTrafficGateway {
    async fn get_route_data(
        &self,
        origin: &str,
        destination: &str,
    ) -> crate::Result<Vec<RouteSnapshot>> {
        self.calls
            .lock()
            .unwrap()
            .push((origin.to_string(), destination.to_string()));

        let Some(count) = self.routes else {
            return Err(RouteWatchError::provider("fake", "provider outage"));
        };

        let observed_at = Utc::now();
        Ok((0..count)
            .map(|index| RouteSnapshot {
                route_kind: RouteKind::for_position(index),
                origin: origin.to_string(),
                destination: destination.to_string(),
                distance_meters: 1000.0 * (index + 1) as f64,
                duration_seconds: 600.0,
                static_duration_seconds: 540.0,
                encoded_path: format!("path-{index}"),
                observed_at,
            })
            .collect())
    }
}

/// Records saved routes; outcomes are consumed in order, then default to `true`
pub struct RecordingTrafficRepository {
    outcomes: Mutex<VecDeque<bool>>,
    attempts: Mutex<usize>,
    saved: Mutex<Vec<RouteSnapshot>>,
}

impl RecordingTrafficRepository {
    pub fn succeeding() -> Self {
        Self::with_outcomes(Vec::new())
    }

    pub fn with_outcomes(outcomes: Vec<bool>) -> Self {
        Self {
            outcomes: Mutex::new(outcomes.into()),
            attempts: Mutex::new(0),
            saved: Mutex::new(Vec::new()),
        }
    }

    pub fn saved(&self) -> Vec<RouteSnapshot> {
        self.saved.lock().unwrap().clone()
    }

    pub fn attempts(&self) -> usize {
        *self.attempts.lock().unwrap()
    }
}

#[async_trait]
impl TrafficRepository for RecordingTrafficRepository {
    async fn save_route(&self, snapshot: RouteSnapshot) -> bool {
        *self.attempts.lock().unwrap() += 1;
        let outcome = self.outcomes.lock().unwrap().pop_front().unwrap_or(true);
        if outcome {
            self.saved.lock().unwrap().push(snapshot);
        }
        outcome
    }
}

pub struct FakeWeatherGateway {
    fail: bool,
    calls: Mutex<Vec<(f64, f64)>>,
}

impl FakeWeatherGateway {
    pub fn clouds() -> Self {
        Self {
            fail: false,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Recorded `(latitude, longitude)` pairs
    pub fn calls(&self) -> Vec<(f64, f64)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl WeatherGateway for FakeWeatherGateway {
    async fn get_weather_data(
        &self,
        latitude: f64,
        longitude: f64,
    ) -> crate::Result<WeatherSnapshot> {
        self.calls.lock().unwrap().push((latitude, longitude));
        if self.fail {
            return Err(RouteWatchError::provider("fake", "provider outage"));
        }
        Ok(WeatherSnapshot {
            condition_type: "Clouds".to_string(),
            condition_description: "overcast clouds".to_string(),
            temperature: 18.5,
            feels_like: 17.9,
            pressure: 1013.0,
            visibility: 10000,
            wind_speed: 3.1,
            humidity: 60.0,
            observed_at: Utc::now(),
        })
    }
}

pub struct RecordingWeatherRepository {
    outcome: bool,
    saved: Mutex<Vec<WeatherSnapshot>>,
}

impl RecordingWeatherRepository {
    pub fn new(outcome: bool) -> Self {
        Self {
            outcome,
            saved: Mutex::new(Vec::new()),
        }
    }

    pub fn saved(&self) -> Vec<WeatherSnapshot> {
        self.saved.lock().unwrap().clone()
    }
}

#[async_trait]
impl WeatherRepository for RecordingWeatherRepository {
    async fn save_weather(&self, snapshot: WeatherSnapshot) -> bool {
        if self.outcome {
            self.saved.lock().unwrap().push(snapshot);
        }
        self.outcome
    }
}
