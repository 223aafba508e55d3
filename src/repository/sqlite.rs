//! Embedded file-based storage

use async_trait::async_trait;
use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use std::path::Path;
use tracing::{debug, error, instrument};

use super::{TrafficRepository, WeatherRepository};
use crate::models::{RouteSnapshot, WeatherSnapshot};

const CREATE_ROUTES: &str = r#"
CREATE TABLE IF NOT EXISTS routes (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    route_type TEXT NOT NULL,
    origin TEXT NOT NULL,
    destination TEXT NOT NULL,
    distance_meters REAL NOT NULL,
    duration_seconds REAL NOT NULL,
    static_duration_seconds REAL NOT NULL,
    polyline TEXT,
    timestamp TEXT NOT NULL,
    inserted_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
)"#;

const CREATE_WEATHER: &str = r#"
CREATE TABLE IF NOT EXISTS weather (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    weather_type TEXT NOT NULL,
    weather_description TEXT NOT NULL,
    temperature REAL NOT NULL,
    feels_like REAL NOT NULL,
    pressure REAL NOT NULL,
    visibility INTEGER NOT NULL,
    wind_speed REAL NOT NULL,
    humidity REAL NOT NULL,
    timestamp TEXT NOT NULL,
    inserted_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
)"#;

async fn open_pool(path: &Path, max_connections: u32, schema: &str) -> crate::Result<SqlitePool> {
    let options = SqliteConnectOptions::new()
        .filename(path)
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal);

    let pool = SqlitePoolOptions::new()
        .max_connections(max_connections)
        .connect_with(options)
        .await?;

    sqlx::query(schema).execute(&pool).await?;
    debug!("Opened sqlite database {}", path.display());
    Ok(pool)
}

pub struct SqliteTrafficRepository {
    pool: SqlitePool,
}

impl SqliteTrafficRepository {
    pub async fn connect(path: impl AsRef<Path>, max_connections: u32) -> crate::Result<Self> {
        let pool = open_pool(path.as_ref(), max_connections, CREATE_ROUTES).await?;
        Ok(Self { pool })
    }
}

#[async_trait]
impl TrafficRepository for SqliteTrafficRepository {
    #[instrument(skip_all, fields(route_kind = %snapshot.route_kind))]
    async fn save_route(&self, snapshot: RouteSnapshot) -> bool {
        let result = sqlx::query(
            "INSERT INTO routes (
                route_type, origin, destination, distance_meters,
                duration_seconds, static_duration_seconds, polyline, timestamp
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(snapshot.route_kind.as_str())
        .bind(&snapshot.origin)
        .bind(&snapshot.destination)
        .bind(snapshot.distance_meters)
        .bind(snapshot.duration_seconds)
        .bind(snapshot.static_duration_seconds)
        .bind(&snapshot.encoded_path)
        .bind(snapshot.observed_at)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => true,
            Err(e) => {
                error!("Error saving route: {e}");
                false
            }
        }
    }
}

pub struct SqliteWeatherRepository {
    pool: SqlitePool,
}

impl SqliteWeatherRepository {
    pub async fn connect(path: impl AsRef<Path>, max_connections: u32) -> crate::Result<Self> {
        let pool = open_pool(path.as_ref(), max_connections, CREATE_WEATHER).await?;
        Ok(Self { pool })
    }
}

#[async_trait]
impl WeatherRepository for SqliteWeatherRepository {
    #[instrument(skip_all)]
    async fn save_weather(&self, snapshot: WeatherSnapshot) -> bool {
        let result = sqlx::query(
            "INSERT INTO weather (
                weather_type, weather_description, temperature, feels_like,
                pressure, visibility, wind_speed, humidity, timestamp
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&snapshot.condition_type)
        .bind(&snapshot.condition_description)
        .bind(snapshot.temperature)
        .bind(snapshot.feels_like)
        .bind(snapshot.pressure)
        .bind(snapshot.visibility)
        .bind(snapshot.wind_speed)
        .bind(snapshot.humidity)
        .bind(snapshot.observed_at)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => true,
            Err(e) => {
                error!("Error saving weather: {e}");
                false
            }
        }
    }
}
