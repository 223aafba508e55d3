//! Error types and handling for the `RouteWatch` collector

use thiserror::Error;

/// Main error type for the `RouteWatch` collector
#[derive(Error, Debug)]
pub enum RouteWatchError {
    /// Configuration-related errors
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// Provider communication errors (network failure, non-success status)
    #[error("Provider error ({provider}): {message}")]
    Provider { provider: String, message: String },

    /// Provider answered, but the payload could not be mapped into a snapshot
    #[error("Malformed {provider} payload: {message}")]
    Payload { provider: String, message: String },

    /// Storage setup errors. Save failures never surface as this variant.
    #[error("Storage error: {source}")]
    Storage {
        #[from]
        source: sqlx::Error,
    },

    /// Scheduler errors
    #[error("Scheduler error: {message}")]
    Scheduler { message: String },
}

impl RouteWatchError {
    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a new provider error
    pub fn provider<P: Into<String>, S: Into<String>>(provider: P, message: S) -> Self {
        Self::Provider {
            provider: provider.into(),
            message: message.into(),
        }
    }

    /// Create a new payload error
    pub fn payload<P: Into<String>, S: Into<String>>(provider: P, message: S) -> Self {
        Self::Payload {
            provider: provider.into(),
            message: message.into(),
        }
    }

    /// Create a new scheduler error
    pub fn scheduler<S: Into<String>>(message: S) -> Self {
        Self::Scheduler {
            message: message.into(),
        }
    }

    /// Get a user-friendly error message
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            RouteWatchError::Config { .. } => {
                "Configuration error. Please check your config file and API keys.".to_string()
            }
            RouteWatchError::Provider { provider, .. } => {
                format!("Unable to reach {provider}. Please check your internet connection.")
            }
            RouteWatchError::Payload { provider, .. } => {
                format!("{provider} returned data that could not be understood.")
            }
            RouteWatchError::Storage { .. } => {
                "Storage operation failed. Please check the database settings.".to_string()
            }
            RouteWatchError::Scheduler { message } => message.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let config_err = RouteWatchError::config("missing API key");
        assert!(matches!(config_err, RouteWatchError::Config { .. }));

        let provider_err = RouteWatchError::provider("google-routes", "connection refused");
        assert!(matches!(provider_err, RouteWatchError::Provider { .. }));

        let payload_err = RouteWatchError::payload("openweather", "empty weather list");
        assert!(matches!(payload_err, RouteWatchError::Payload { .. }));
    }

    #[test]
    fn test_display_includes_provider() {
        let err = RouteWatchError::provider("openweather", "status 503");
        assert_eq!(err.to_string(), "Provider error (openweather): status 503");
    }

    #[test]
    fn test_user_messages() {
        let config_err = RouteWatchError::config("test");
        assert!(config_err.user_message().contains("Configuration error"));

        let provider_err = RouteWatchError::provider("google-routes", "test");
        assert!(provider_err.user_message().contains("Unable to reach google-routes"));

        let scheduler_err = RouteWatchError::scheduler("no runtime");
        assert_eq!(scheduler_err.user_message(), "no runtime");
    }

    #[test]
    fn test_sqlx_error_conversion() {
        let err: RouteWatchError = sqlx::Error::PoolTimedOut.into();
        assert!(matches!(err, RouteWatchError::Storage { .. }));
    }
}
