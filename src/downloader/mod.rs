//! Client configuration and request pacing
//!
//! # Components
//!
//! - [`config`] - defaults, [`ClientConfig`] and backoff calculation
//! - [`rate_limit`] - minimum-interval [`RateLimiter`]
//!
//! # Example
//!
//! ```
//! use eprel_downloader::downloader::{ClientConfig, RateLimiter};
//! use std::time::Duration;
//!
//! let config = ClientConfig::default().with_max_requests_per_second(10);
//! let limiter = RateLimiter::with_interval(config.min_request_interval());
//! assert_eq!(limiter.min_interval(), Duration::from_millis(100));
//! ```

pub mod config;
pub mod rate_limit;

pub use config::{calculate_backoff, ClientConfig, ConfigError};
pub use rate_limit::RateLimiter;
