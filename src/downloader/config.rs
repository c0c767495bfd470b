//! Client configuration and constants

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Registry API base URL
pub const EPREL_API_BASE_URL: &str = "https://eprel.ec.europa.eu/api/v1";

/// Base URL serving energy label SVGs
pub const EPREL_LABELS_BASE_URL: &str = "https://eprel.ec.europa.eu/labels";

/// Environment variable holding the API key
pub const API_KEY_ENV: &str = "EPREL_API_KEY";

/// Maximum number of attempts per request (initial attempt included).
pub const MAX_RETRIES: u32 = 3;

/// Base retry delay; attempt `n` (0-based) waits `RETRY_DELAY * 2^n`.
pub const RETRY_DELAY: Duration = Duration::from_secs(2);

/// Registry quota: 5 requests per second.
pub const MAX_REQUESTS_PER_SECOND: u32 = 5;

/// Items per listing page
pub const DEFAULT_PAGE_SIZE: usize = 50;

/// Per-request timeout handed to the HTTP transport
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// TCP connect timeout
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Calculate exponential backoff delay for a 0-based attempt index
///
/// `base * 2^attempt`, with no jitter and no upper cap. Saturates instead of
/// overflowing for absurd attempt counts.
pub fn calculate_backoff(base: Duration, attempt: u32) -> Duration {
    let factor = 2u32.checked_pow(attempt).unwrap_or(u32::MAX);
    base.saturating_mul(factor)
}

/// Settings for a registry client instance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Optional API key sent as `x-api-key`
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    /// JSON API base URL
    pub base_url: String,
    /// Label SVG base URL
    pub labels_base_url: String,
    /// Per-request timeout
    pub timeout: Duration,
    /// Attempts per request
    pub max_retries: u32,
    /// Base delay for exponential backoff
    pub retry_base_delay: Duration,
    /// Pacing budget for this client instance
    pub max_requests_per_second: u32,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: EPREL_API_BASE_URL.to_string(),
            labels_base_url: EPREL_LABELS_BASE_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
            max_retries: MAX_RETRIES,
            retry_base_delay: RETRY_DELAY,
            max_requests_per_second: MAX_REQUESTS_PER_SECOND,
        }
    }
}

impl ClientConfig {
    /// Defaults plus the API key from `EPREL_API_KEY`, if set
    pub fn from_env() -> Self {
        let api_key = std::env::var(API_KEY_ENV)
            .ok()
            .filter(|key| !key.trim().is_empty());
        Self {
            api_key,
            ..Self::default()
        }
    }

    /// Set the API key
    pub fn with_api_key(mut self, api_key: Option<String>) -> Self {
        self.api_key = api_key;
        self
    }

    /// Set the API base URL (trailing slashes are dropped)
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Set the label base URL (trailing slashes are dropped)
    pub fn with_labels_base_url(mut self, labels_base_url: impl Into<String>) -> Self {
        self.labels_base_url = labels_base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Set the per-request timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the number of attempts per request
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Set the base backoff delay
    pub fn with_retry_base_delay(mut self, delay: Duration) -> Self {
        self.retry_base_delay = delay;
        self
    }

    /// Set the request rate budget
    pub fn with_max_requests_per_second(mut self, rps: u32) -> Self {
        self.max_requests_per_second = rps;
        self
    }

    /// Minimum spacing between two outbound calls
    pub fn min_request_interval(&self) -> Duration {
        Duration::from_secs(1) / self.max_requests_per_second.max(1)
    }

    /// Check the settings are usable
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_requests_per_second == 0 {
            return Err(ConfigError::Invalid(
                "max_requests_per_second must be at least 1".to_string(),
            ));
        }
        if self.max_retries == 0 {
            return Err(ConfigError::Invalid(
                "max_retries must be at least 1".to_string(),
            ));
        }
        if self.base_url.is_empty() || self.labels_base_url.is_empty() {
            return Err(ConfigError::Invalid("base URLs cannot be empty".to_string()));
        }
        Ok(())
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// A setting is out of range
    #[error("invalid configuration: {0}")]
    Invalid(String),
}
