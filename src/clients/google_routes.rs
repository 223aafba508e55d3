//! Google Routes API (`directions/v2:computeRoutes`) client

use chrono::{SecondsFormat, Utc};
use reqwest_middleware::ClientWithMiddleware;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use super::{build_http_client, decode_response};
use crate::RouteWatchError;
use crate::config::GoogleConfig;

pub const PROVIDER: &str = "google-routes";

const FIELD_MASK: &str = "routes.legs.distanceMeters,routes.legs.duration,routes.legs.staticDuration,routes.legs.polyline.encodedPolyline,routes.legs.startLocation.latLng.latitude,routes.legs.startLocation.latLng.longitude";

/// Client for traffic-aware route computation
pub struct GoogleRoutesClient {
    http: ClientWithMiddleware,
    api_key: String,
    base_url: String,
    travel_mode: String,
    departure_offset: chrono::Duration,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ComputeRoutesRequest<'a> {
    origin: Waypoint<'a>,
    destination: Waypoint<'a>,
    travel_mode: &'a str,
    routing_preference: &'static str,
    departure_time: String,
    compute_alternative_routes: bool,
    route_modifiers: RouteModifiers,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Waypoint<'a> {
    place_id: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RouteModifiers {
    avoid_tolls: bool,
    avoid_highways: bool,
}

/// computeRoutes response; a body without `routes` means no route was found
#[derive(Debug, Deserialize, Default)]
pub struct ComputeRoutesResponse {
    #[serde(default)]
    pub routes: Vec<Route>,
}

#[derive(Debug, Deserialize)]
pub struct Route {
    #[serde(default)]
    pub legs: Vec<RouteLeg>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteLeg {
    /// Omitted by the API when zero
    #[serde(default)]
    pub distance_meters: f64,
    /// Duration string such as "1234s"
    pub duration: Option<String>,
    pub static_duration: Option<String>,
    pub polyline: Option<Polyline>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Polyline {
    pub encoded_polyline: Option<String>,
}

impl GoogleRoutesClient {
    pub fn new(config: &GoogleConfig) -> crate::Result<Self> {
        let api_key = config
            .api_key
            .clone()
            .ok_or_else(|| RouteWatchError::config("Missing Google Routes API key"))?;

        Ok(Self {
            http: build_http_client(config.timeout_seconds, config.max_retries)?,
            api_key,
            base_url: config.base_url.clone(),
            travel_mode: config.travel_mode.clone(),
            departure_offset: chrono::Duration::minutes(config.departure_offset_minutes.into()),
        })
    }

    /// Request the current routes between two place ids, alternatives included
    #[instrument(skip(self))]
    pub async fn compute_routes(
        &self,
        origin: &str,
        destination: &str,
    ) -> crate::Result<ComputeRoutesResponse> {
        // Departure slightly in the future so the API returns live-traffic estimates
        let departure_time =
            (Utc::now() + self.departure_offset).to_rfc3339_opts(SecondsFormat::Secs, true);

        let request = ComputeRoutesRequest {
            origin: Waypoint { place_id: origin },
            destination: Waypoint {
                place_id: destination,
            },
            travel_mode: &self.travel_mode,
            routing_preference: "TRAFFIC_AWARE",
            departure_time,
            compute_alternative_routes: true,
            route_modifiers: RouteModifiers {
                avoid_tolls: false,
                avoid_highways: false,
            },
        };
        let body = serde_json::to_vec(&request)
            .map_err(|e| RouteWatchError::provider(PROVIDER, format!("Failed to encode request: {e}")))?;

        debug!("Calling the Routes API");
        let response = self
            .http
            .post(&self.base_url)
            .header("Content-Type", "application/json")
            .header("X-Goog-Api-Key", &self.api_key)
            .header("X-Goog-FieldMask", FIELD_MASK)
            .body(body)
            .send()
            .await
            .map_err(|e| RouteWatchError::provider(PROVIDER, format!("Request failed: {e}")))?;

        decode_response(PROVIDER, response).await
    }
}
