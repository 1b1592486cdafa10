// src/config.rs
use log::warn;
use std::env;
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "http://localhost:8000";
pub const DEFAULT_FORECAST_ENDPOINT: &str = "api/forecast";
pub const DEFAULT_TIMEOUT_SECS: u64 = 300; // 5 minutes

/// Client-side configuration for the remote forecasting service.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub base_url: String,
    pub forecast_endpoint: String,
    pub timeout: Duration,
}

impl Default for ApiConfig {
    fn default() -> Self {
        ApiConfig {
            base_url: DEFAULT_BASE_URL.to_string(),
            forecast_endpoint: DEFAULT_FORECAST_ENDPOINT.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

impl ApiConfig {
    /// Read the configuration from the environment, falling back to defaults.
    pub fn from_env() -> Self {
        let base_url = env::var("FORECAST_BASE_URL").unwrap_or_else(|_| {
            warn!("$FORECAST_BASE_URL not set, defaulting to {}", DEFAULT_BASE_URL);
            DEFAULT_BASE_URL.to_string()
        });

        let forecast_endpoint = env::var("FORECAST_ENDPOINT").unwrap_or_else(|_| {
            warn!(
                "$FORECAST_ENDPOINT not set, defaulting to {}",
                DEFAULT_FORECAST_ENDPOINT
            );
            DEFAULT_FORECAST_ENDPOINT.to_string()
        });

        let timeout_secs = env::var("FORECAST_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or_else(|| {
                warn!(
                    "$FORECAST_TIMEOUT_SECS not set or invalid, defaulting to {}",
                    DEFAULT_TIMEOUT_SECS
                );
                DEFAULT_TIMEOUT_SECS
            });

        ApiConfig {
            base_url,
            forecast_endpoint,
            timeout: Duration::from_secs(timeout_secs),
        }
    }

    pub fn forecast_url(&self) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            self.forecast_endpoint.trim_start_matches('/')
        )
    }
}
