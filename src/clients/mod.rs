//! HTTP clients for the external data providers
//!
//! Clients speak the provider wire formats and return typed payloads. Retry
//! of transient failures happens here and nowhere above.

pub mod google_routes;
pub mod open_weather;

pub use google_routes::GoogleRoutesClient;
pub use open_weather::OpenWeatherClient;

use crate::RouteWatchError;
use reqwest::{Client, Response, StatusCode};
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use reqwest_retry::{RetryTransientMiddleware, policies::ExponentialBackoff};
use serde::de::DeserializeOwned;
use std::time::Duration;

const USER_AGENT: &str = concat!("RouteWatch/", env!("CARGO_PKG_VERSION"));

/// Build an HTTP client with a request timeout and transient-failure retries
pub(crate) fn build_http_client(
    timeout_seconds: u32,
    max_retries: u32,
) -> crate::Result<ClientWithMiddleware> {
    let client = Client::builder()
        .timeout(Duration::from_secs(timeout_seconds.into()))
        .user_agent(USER_AGENT)
        .build()
        .map_err(|e| RouteWatchError::config(format!("Failed to create HTTP client: {e}")))?;

    let mut builder = ClientBuilder::new(client);
    if max_retries > 0 {
        let policy = ExponentialBackoff::builder().build_with_max_retries(max_retries);
        builder = builder.with(RetryTransientMiddleware::new_with_policy(policy));
    }
    Ok(builder.build())
}

/// Turn a provider response into a typed payload, or a provider/payload error
pub(crate) async fn decode_response<T: DeserializeOwned>(
    provider: &str,
    response: Response,
) -> crate::Result<T> {
    let status = response.status();
    let body = response
        .text()
        .await
        .map_err(|e| RouteWatchError::provider(provider, format!("Failed to read body: {e}")))?;

    if !status.is_success() {
        return Err(match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                RouteWatchError::provider(provider, format!("Invalid or missing API key ({status})"))
            }
            StatusCode::TOO_MANY_REQUESTS => {
                RouteWatchError::provider(provider, "Rate limit exceeded")
            }
            _ => RouteWatchError::provider(provider, format!("HTTP {status}: {body}")),
        });
    }

    if body.trim().is_empty() {
        return Err(RouteWatchError::payload(provider, "empty response body"));
    }

    serde_json::from_str(&body).map_err(|e| RouteWatchError::payload(provider, e.to_string()))
}
