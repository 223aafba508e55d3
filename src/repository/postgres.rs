//! Client-server storage

use async_trait::async_trait;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use std::time::Duration;
use tracing::{error, instrument};

use super::{TrafficRepository, WeatherRepository};
use crate::models::{RouteSnapshot, WeatherSnapshot};

const CREATE_ROUTES: &str = r#"
CREATE TABLE IF NOT EXISTS routes (
    id BIGSERIAL PRIMARY KEY,
    route_type TEXT NOT NULL,
    origin TEXT NOT NULL,
    destination TEXT NOT NULL,
    distance_meters DOUBLE PRECISION NOT NULL,
    duration_seconds DOUBLE PRECISION NOT NULL,
    static_duration_seconds DOUBLE PRECISION NOT NULL,
    polyline TEXT,
    timestamp TIMESTAMPTZ NOT NULL,
    inserted_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
)"#;

const CREATE_WEATHER: &str = r#"
CREATE TABLE IF NOT EXISTS weather (
    id BIGSERIAL PRIMARY KEY,
    weather_type TEXT NOT NULL,
    weather_description TEXT NOT NULL,
    temperature DOUBLE PRECISION NOT NULL,
    feels_like DOUBLE PRECISION NOT NULL,
    pressure DOUBLE PRECISION NOT NULL,
    visibility BIGINT NOT NULL,
    wind_speed DOUBLE PRECISION NOT NULL,
    humidity DOUBLE PRECISION NOT NULL,
    timestamp TIMESTAMPTZ NOT NULL,
    inserted_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
)"#;

async fn open_pool(database_url: &str, max_connections: u32, schema: &str) -> crate::Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(max_connections)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url)
        .await?;

    sqlx::query(schema).execute(&pool).await?;
    Ok(pool)
}

pub struct PostgresTrafficRepository {
    pool: PgPool,
}

impl PostgresTrafficRepository {
    pub async fn connect(database_url: &str, max_connections: u32) -> crate::Result<Self> {
        let pool = open_pool(database_url, max_connections, CREATE_ROUTES).await?;
        Ok(Self { pool })
    }
}

#[async_trait]
impl TrafficRepository for PostgresTrafficRepository {
    #[instrument(skip_all, fields(route_kind = %snapshot.route_kind))]
    async fn save_route(&self, snapshot: RouteSnapshot) -> bool {
        let result = sqlx::query(
            "INSERT INTO routes (
                route_type, origin, destination, distance_meters,
                duration_seconds, static_duration_seconds, polyline, timestamp
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
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

pub struct PostgresWeatherRepository {
    pool: PgPool,
}

impl PostgresWeatherRepository {
    pub async fn connect(database_url: &str, max_connections: u32) -> crate::Result<Self> {
        let pool = open_pool(database_url, max_connections, CREATE_WEATHER).await?;
        Ok(Self { pool })
    }
}

#[async_trait]
impl WeatherRepository for PostgresWeatherRepository {
    #[instrument(skip_all)]
    async fn save_weather(&self, snapshot: WeatherSnapshot) -> bool {
        let result = sqlx::query(
            "INSERT INTO weather (
                weather_type, weather_description, temperature, feels_like,
                pressure, visibility, wind_speed, humidity, timestamp
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)",
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RouteKind;
    use chrono::Utc;

    // nothing listens on port 1, so every acquire fails
    fn unreachable_pool() -> PgPool {
        PgPoolOptions::new()
            .max_connections(1)
            .acquire_timeout(Duration::from_millis(500))
            .connect_lazy("postgres://routewatch@127.0.0.1:1/none")
            .unwrap()
    }

    #[tokio::test]
    async fn test_save_route_failure_returns_false() {
        let repo = PostgresTrafficRepository {
            pool: unreachable_pool(),
        };
        let snapshot = RouteSnapshot {
            route_kind: RouteKind::Primary,
            origin: "ChIJ-home".to_string(),
            destination: "ChIJ-work".to_string(),
            distance_meters: 15320.0,
            duration_seconds: 1830.0,
            static_duration_seconds: 1410.0,
            encoded_path: "abc".to_string(),
            observed_at: Utc::now(),
        };

        assert!(!repo.save_route(snapshot).await);
    }

    #[tokio::test]
    async fn test_save_weather_failure_returns_false() {
        let repo = PostgresWeatherRepository {
            pool: unreachable_pool(),
        };
        let snapshot = WeatherSnapshot {
            condition_type: "Clouds".to_string(),
            condition_description: "overcast clouds".to_string(),
            temperature: 18.5,
            feels_like: 17.9,
            pressure: 1013.0,
            visibility: 10000,
            wind_speed: 3.1,
            humidity: 60.0,
            observed_at: Utc::now(),
        };

        assert!(!repo.save_weather(snapshot).await);
    }

    #[tokio::test]
    async fn test_connect_to_unreachable_server_fails() {
        let result =
            PostgresTrafficRepository::connect("postgres://routewatch@127.0.0.1:1/none", 1).await;
        assert!(result.is_err());
    }
}
