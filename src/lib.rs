//! `RouteWatch` - hourly traffic and weather snapshot collector
//!
//! This library polls a routing provider and a weather provider on a fixed
//! interval and appends normalized snapshots to a relational store.

pub mod app;
pub mod clients;
pub mod config;
pub mod error;
pub mod gateway;
pub mod logging;
pub mod models;
pub mod repository;
pub mod scheduler;
pub mod use_cases;

// Re-export core types for public API
pub use config::RouteWatchConfig;
pub use error::RouteWatchError;
pub use gateway::{TrafficGateway, WeatherGateway};
pub use models::{RouteKind, RouteSnapshot, WeatherSnapshot};
pub use repository::{TrafficRepository, WeatherRepository};
pub use scheduler::{JobId, Scheduler};
pub use use_cases::{CollectTrafficData, CollectWeatherData};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Core result type used throughout the library
pub type Result<T> = std::result::Result<T, RouteWatchError>;
