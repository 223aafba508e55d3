use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::{debug, instrument};

use super::TrafficGateway;
use crate::RouteWatchError;
use crate::clients::GoogleRoutesClient;
use crate::clients::google_routes::{ComputeRoutesResponse, PROVIDER};
use crate::models::{RouteKind, RouteSnapshot};

/// Traffic gateway backed by the Google Routes API
pub struct GoogleMapsTrafficGateway {
    client: GoogleRoutesClient,
}

impl GoogleMapsTrafficGateway {
    #[must_use]
    pub fn new(client: GoogleRoutesClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl TrafficGateway for GoogleMapsTrafficGateway {
    #[instrument(skip(self))]
    async fn get_route_data(
        &self,
        origin: &str,
        destination: &str,
    ) -> crate::Result<Vec<RouteSnapshot>> {
        let observed_at = Utc::now();
        let response = self.client.compute_routes(origin, destination).await?;
        let routes = routes_from_response(response, origin, destination, observed_at)?;
        debug!("Mapped {} routes", routes.len());
        Ok(routes)
    }
}

/// Map a computeRoutes answer into snapshots sharing one capture time.
///
/// Requests carry no intermediate waypoints, so each route has a single leg.
pub fn routes_from_response(
    response: ComputeRoutesResponse,
    origin: &str,
    destination: &str,
    observed_at: DateTime<Utc>,
) -> crate::Result<Vec<RouteSnapshot>> {
    response
        .routes
        .into_iter()
        .enumerate()
        .map(|(index, route)| {
            let leg = route.legs.into_iter().next().ok_or_else(|| {
                RouteWatchError::payload(PROVIDER, format!("route {index} has no legs"))
            })?;

            let duration_seconds = parse_duration(leg.duration.as_deref(), "duration")?;
            let static_duration_seconds =
                parse_duration(leg.static_duration.as_deref(), "staticDuration")?;

            Ok(RouteSnapshot {
                route_kind: RouteKind::for_position(index),
                origin: origin.to_string(),
                destination: destination.to_string(),
                distance_meters: leg.distance_meters,
                duration_seconds,
                static_duration_seconds,
                encoded_path: leg
                    .polyline
                    .and_then(|p| p.encoded_polyline)
                    .unwrap_or_default(),
                observed_at,
            })
        })
        .collect()
}

/// Parse a protobuf duration string ("812s", "3.5s") into seconds
fn parse_duration(value: Option<&str>, field: &str) -> crate::Result<f64> {
    let raw = value
        .ok_or_else(|| RouteWatchError::payload(PROVIDER, format!("missing {field}")))?;

    let seconds: f64 = raw
        .strip_suffix('s')
        .unwrap_or(raw)
        .trim()
        .parse()
        .map_err(|_| RouteWatchError::payload(PROVIDER, format!("invalid {field} '{raw}'")))?;

    if !seconds.is_finite() || seconds < 0.0 {
        return Err(RouteWatchError::payload(
            PROVIDER,
            format!("{field} must be a non-negative number of seconds, got '{raw}'"),
        ));
    }
    Ok(seconds)
}
