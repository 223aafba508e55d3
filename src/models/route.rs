//! Route snapshot model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::Display;

/// Position of a route inside one provider answer
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RouteKind {
    /// The provider's preferred route, always the first one returned
    Primary,
    /// Any further route the provider suggested
    Alternative,
}

impl RouteKind {
    /// Kind for the route at `index` in a single fetch result
    #[must_use]
    pub fn for_position(index: usize) -> Self {
        if index == 0 {
            Self::Primary
        } else {
            Self::Alternative
        }
    }

    /// Label stored in the `route_type` column
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Primary => "PRIMARY",
            Self::Alternative => "ALTERNATIVE",
        }
    }
}

impl Display for RouteKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One route alternative observed at `observed_at`
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct RouteSnapshot {
    pub route_kind: RouteKind,
    /// Opaque origin identifier (a provider place id)
    pub origin: String,
    /// Opaque destination identifier (a provider place id)
    pub destination: String,
    pub distance_meters: f64,
    /// Travel time with live traffic, never negative
    pub duration_seconds: f64,
    /// Travel time without traffic, never negative
    pub static_duration_seconds: f64,
    /// Encoded polyline of the route geometry
    pub encoded_path: String,
    /// Capture time shared by every snapshot of the same fetch
    pub observed_at: DateTime<Utc>,
}

impl RouteSnapshot {
    /// Seconds lost to traffic compared to the free-flow estimate
    #[must_use]
    pub fn traffic_delay_seconds(&self) -> f64 {
        (self.duration_seconds - self.static_duration_seconds).max(0.0)
    }
}

impl Display for RouteSnapshot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} {} -> {}: {:.0} m in {:.0} s ({:.0} s free-flow)",
            self.route_kind,
            self.origin,
            self.destination,
            self.distance_meters,
            self.duration_seconds,
            self.static_duration_seconds
        )
    }
}
