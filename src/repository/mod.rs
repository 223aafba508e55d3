//! Snapshot repositories
//!
//! Each save is an independent append. Storage failures are logged and
//! reported as `false`; they never propagate past a repository.

pub mod postgres;
pub mod sqlite;

pub use postgres::{PostgresTrafficRepository, PostgresWeatherRepository};
pub use sqlite::{SqliteTrafficRepository, SqliteWeatherRepository};

use async_trait::async_trait;
use std::sync::Arc;
use tracing::info;

use crate::RouteWatchError;
use crate::config::{StorageBackend, StorageConfig};
use crate::models::{RouteSnapshot, WeatherSnapshot};

#[async_trait]
pub trait TrafficRepository: Send + Sync {
    /// Append one route snapshot, `true` once it is durably written
    async fn save_route(&self, snapshot: RouteSnapshot) -> bool;
}

#[async_trait]
pub trait WeatherRepository: Send + Sync {
    /// Append one weather snapshot, `true` once it is durably written
    async fn save_weather(&self, snapshot: WeatherSnapshot) -> bool;
}

/// Repositories for the configured backend, ready to inject into use cases
pub struct Repositories {
    pub traffic: Arc<dyn TrafficRepository>,
    pub weather: Arc<dyn WeatherRepository>,
}

/// Open both repositories on the configured backend, creating tables if absent
pub async fn connect(config: &StorageConfig) -> crate::Result<Repositories> {
    let repositories = match config.backend {
        StorageBackend::Sqlite => {
            info!("Using sqlite storage at {}", config.sqlite_path);
            Repositories {
                traffic: Arc::new(
                    SqliteTrafficRepository::connect(&config.sqlite_path, config.max_connections)
                        .await?,
                ),
                weather: Arc::new(
                    SqliteWeatherRepository::connect(&config.sqlite_path, config.max_connections)
                        .await?,
                ),
            }
        }
        StorageBackend::Postgres => {
            let url = config
                .database_url
                .as_deref()
                .ok_or_else(|| RouteWatchError::config("Missing storage.database_url"))?;
            info!("Using postgres storage");
            Repositories {
                traffic: Arc::new(
                    PostgresTrafficRepository::connect(url, config.max_connections).await?,
                ),
                weather: Arc::new(
                    PostgresWeatherRepository::connect(url, config.max_connections).await?,
                ),
            }
        }
    };
    Ok(repositories)
}
