//! Collection use cases: one gateway, one repository, fetch then persist

pub mod collect_traffic;
pub mod collect_weather;

pub use collect_traffic::CollectTrafficData;
pub use collect_weather::CollectWeatherData;

#[cfg(test)]
pub(crate) mod testing;
