//! Composition root: wires concrete gateways and repositories into use cases
//! and turns configured targets into scheduled jobs.

use anyhow::{Context, Result};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

use crate::RouteWatchError;
use crate::clients::{GoogleRoutesClient, OpenWeatherClient};
use crate::config::{CollectionConfig, RouteTarget, RouteWatchConfig, WeatherTarget};
use crate::gateway::{GoogleMapsTrafficGateway, OpenWeatherGateway};
use crate::repository;
use crate::scheduler::{JobId, Scheduler};
use crate::use_cases::{CollectTrafficData, CollectWeatherData};

/// Use cases for the configured targets. A use case is only built when it has
/// at least one target, so unused providers need no credentials.
pub struct Collectors {
    pub traffic: Option<Arc<CollectTrafficData>>,
    pub weather: Option<Arc<CollectWeatherData>>,
}

impl Collectors {
    /// Build providers and open storage as described by `config`
    pub async fn connect(config: &RouteWatchConfig) -> Result<Self> {
        let repositories = repository::connect(&config.storage)
            .await
            .context("Failed to open storage")?;

        let traffic = if config.collection.routes.is_empty() {
            None
        } else {
            let client = GoogleRoutesClient::new(&config.google)?;
            Some(Arc::new(CollectTrafficData::new(
                Arc::new(GoogleMapsTrafficGateway::new(client)),
                repositories.traffic,
            )))
        };

        let weather = if config.collection.weather.is_empty() {
            None
        } else {
            let client = OpenWeatherClient::new(&config.weather)?;
            Some(Arc::new(CollectWeatherData::new(
                Arc::new(OpenWeatherGateway::new(client)),
                repositories.weather,
            )))
        };

        Ok(Self { traffic, weather })
    }
}

/// Collect one configured route and log the outcome
pub async fn collect_route(use_case: &CollectTrafficData, target: &RouteTarget) -> Result<bool> {
    info!(
        "Collecting route data: {} -> {}{}",
        target.origin,
        target.destination,
        if target.round_trip { " (round trip)" } else { "" }
    );

    let saved = use_case
        .execute(&target.origin, &target.destination, target.round_trip)
        .await
        .with_context(|| {
            format!(
                "Error while collecting route data {} -> {}",
                target.origin, target.destination
            )
        })?;

    if saved {
        info!("Route data saved successfully");
    } else {
        warn!("Route data collected, but some snapshots could not be saved");
    }
    Ok(saved)
}

/// Collect weather for one configured location and log the outcome
pub async fn collect_weather(use_case: &CollectWeatherData, target: &WeatherTarget) -> Result<bool> {
    info!(
        "Collecting weather data for {} ({}, {})",
        target.name, target.latitude, target.longitude
    );

    let saved = use_case
        .execute(target.longitude, target.latitude)
        .await
        .with_context(|| format!("Error while collecting weather data for {}", target.name))?;

    if saved {
        info!("Weather data saved successfully");
    } else {
        warn!("Weather data collected, but the snapshot could not be saved");
    }
    Ok(saved)
}

/// One pass over every target. A failing target is logged and skipped.
pub async fn run_once(collectors: &Collectors, collection: &CollectionConfig) {
    if let Some(traffic) = &collectors.traffic {
        for target in &collection.routes {
            if let Err(e) = collect_route(traffic, target).await {
                log_failure(&e);
            }
        }
    }

    if let Some(weather) = &collectors.weather {
        for target in &collection.weather {
            if let Err(e) = collect_weather(weather, target).await {
                log_failure(&e);
            }
        }
    }
}

fn log_failure(e: &anyhow::Error) {
    match e.downcast_ref::<RouteWatchError>() {
        Some(cause) => error!("{e:#}. {}", cause.user_message()),
        None => error!("{e:#}"),
    }
}

/// Register one periodic job per configured route and weather location
pub fn register_jobs(
    scheduler: &Scheduler,
    collectors: &Collectors,
    collection: &CollectionConfig,
    interval: Duration,
) -> Result<Vec<JobId>> {
    let mut ids = Vec::new();

    if let Some(traffic) = &collectors.traffic {
        for target in &collection.routes {
            let use_case = Arc::clone(traffic);
            let target = target.clone();
            let name = format!("traffic {} -> {}", target.origin, target.destination);
            let id = scheduler.register_periodic(name, interval, move || {
                let use_case = Arc::clone(&use_case);
                let target = target.clone();
                async move { collect_route(&use_case, &target).await.map(|_| ()) }
            })?;
            ids.push(id);
        }
    }

    if let Some(weather) = &collectors.weather {
        for target in &collection.weather {
            let use_case = Arc::clone(weather);
            let target = target.clone();
            let name = format!("weather {}", target.name);
            let id = scheduler.register_periodic(name, interval, move || {
                let use_case = Arc::clone(&use_case);
                let target = target.clone();
                async move { collect_weather(&use_case, &target).await.map(|_| ()) }
            })?;
            ids.push(id);
        }
    }

    info!("Registered {} collection jobs", ids.len());
    Ok(ids)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::use_cases::testing::{
        FakeTrafficGateway, FakeWeatherGateway, RecordingTrafficRepository,
        RecordingWeatherRepository,
    };

    fn collection() -> CollectionConfig {
        CollectionConfig {
            routes: vec![
                RouteTarget {
                    origin: "home".to_string(),
                    destination: "work".to_string(),
                    round_trip: true,
                },
                RouteTarget {
                    origin: "home".to_string(),
                    destination: "gym".to_string(),
                    round_trip: false,
                },
            ],
            weather: vec![WeatherTarget {
                name: "CDMX".to_string(),
                latitude: 19.43,
                longitude: -99.13,
            }],
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_register_jobs_schedules_every_target() {
        let traffic_repo = Arc::new(RecordingTrafficRepository::succeeding());
        let weather_repo = Arc::new(RecordingWeatherRepository::new(true));
        let collectors = Collectors {
            traffic: Some(Arc::new(CollectTrafficData::new(
                Arc::new(FakeTrafficGateway::returning(2)),
                traffic_repo.clone(),
            ))),
            weather: Some(Arc::new(CollectWeatherData::new(
                Arc::new(FakeWeatherGateway::clouds()),
                weather_repo.clone(),
            ))),
        };
        let scheduler = Scheduler::new(Duration::from_secs(1));

        let ids = register_jobs(&scheduler, &collectors, &collection(), Duration::from_secs(60))
            .unwrap();
        assert_eq!(ids.len(), 3);
        assert_eq!(scheduler.job_count(), 3);

        tokio::time::sleep(Duration::from_secs(61)).await;

        // round trip: 2 directions x 2 routes, single direction: 2 routes
        assert_eq!(traffic_repo.saved().len(), 6);
        assert_eq!(weather_repo.saved().len(), 1);
    }

    #[tokio::test]
    async fn test_run_once_skips_failing_targets() {
        let weather_repo = Arc::new(RecordingWeatherRepository::new(true));
        let collectors = Collectors {
            traffic: Some(Arc::new(CollectTrafficData::new(
                Arc::new(FakeTrafficGateway::failing()),
                Arc::new(RecordingTrafficRepository::succeeding()),
            ))),
            weather: Some(Arc::new(CollectWeatherData::new(
                Arc::new(FakeWeatherGateway::clouds()),
                weather_repo.clone(),
            ))),
        };

        run_once(&collectors, &collection()).await;

        assert_eq!(weather_repo.saved().len(), 1);
    }

    #[tokio::test]
    async fn test_collect_route_reports_partial_failure() {
        let use_case = CollectTrafficData::new(
            Arc::new(FakeTrafficGateway::returning(2)),
            Arc::new(RecordingTrafficRepository::with_outcomes(vec![true, false])),
        );
        let target = &collection().routes[1];

        assert!(!collect_route(&use_case, target).await.unwrap());
    }

    #[tokio::test]
    async fn test_collect_weather_error_carries_target_name() {
        let use_case = CollectWeatherData::new(
            Arc::new(FakeWeatherGateway::failing()),
            Arc::new(RecordingWeatherRepository::new(true)),
        );
        let target = &collection().weather[0];

        let err = collect_weather(&use_case, target).await.unwrap_err();
        assert!(err.to_string().contains("CDMX"));
    }
}
