//! Snapshot models for the `RouteWatch` collector
//!
//! Snapshots are point-in-time observations built by a gateway at fetch time
//! and moved into a repository at persistence time:
//! - Route: one traffic-aware route alternative between two places
//! - Weather: current conditions at one coordinate pair

pub mod route;
pub mod weather;

// Re-export all public types for convenient access
pub use route::{RouteKind, RouteSnapshot};
pub use weather::WeatherSnapshot;
