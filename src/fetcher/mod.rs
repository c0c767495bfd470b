//! Registry fetchers
//!
//! Layers, leaves first:
//!
//! - [`transport`] - the single-GET seam and its reqwest implementation
//! - [`retry`] - pure classification of attempts and the backoff decision
//! - [`eprel_http`] - rate-limited, retrying HTTP client
//! - [`pagination`] - lazy page cursor/stream
//! - [`eprel`] - the registry client exposing product, listing and label operations

use futures_util::Stream;
use std::pin::Pin;

use crate::registry::CatalogError;

pub mod eprel;
pub mod eprel_http;
pub mod pagination;
pub mod retry;
pub mod transport;

pub use eprel::EprelClient;
pub use eprel_http::EprelHttpClient;
pub use transport::{HttpRequest, HttpResponse, ReqwestTransport, Transport, TransportError};

/// Fetcher errors
#[derive(Debug, thiserror::Error)]
pub enum FetcherError {
    /// Category key is not in the catalog; never retried
    #[error("unknown category '{category}'. Available: {available}")]
    UnknownCategory {
        /// Requested key
        category: String,
        /// Comma-separated known keys
        available: String,
    },

    /// Non-2xx response: a client error, or a 429/5xx that outlived the retry budget
    #[error("request failed with status {status}: {message}")]
    RequestFailed {
        /// Last observed HTTP status
        status: u16,
        /// Classification and response excerpt
        message: String,
    },

    /// Connection, DNS or timeout failure that outlived the retry budget
    #[error("transport failed: {0}")]
    TransportFailed(String),

    /// 2xx response whose body did not have the expected shape
    #[error("parse error: {0}")]
    ParseError(String),

    /// Caller passed an unusable argument
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Client could not be constructed
    #[error("configuration error: {0}")]
    ConfigError(String),
}

impl FetcherError {
    /// Whether the error stems from a transient condition (429, 5xx, network)
    pub fn is_transient(&self) -> bool {
        match self {
            Self::RequestFailed { status, .. } => *status == 429 || *status >= 500,
            Self::TransportFailed(_) => true,
            _ => false,
        }
    }

    /// HTTP status behind the error, if any
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::RequestFailed { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<CatalogError> for FetcherError {
    fn from(err: CatalogError) -> Self {
        match err {
            CatalogError::UnknownCategory {
                category,
                available,
            } => FetcherError::UnknownCategory {
                category,
                available,
            },
            other => FetcherError::ConfigError(other.to_string()),
        }
    }
}

impl From<TransportError> for FetcherError {
    fn from(err: TransportError) -> Self {
        FetcherError::TransportFailed(err.to_string())
    }
}

impl From<crate::downloader::config::ConfigError> for FetcherError {
    fn from(err: crate::downloader::config::ConfigError) -> Self {
        FetcherError::ConfigError(err.to_string())
    }
}

/// Result type for fetcher operations
pub type FetcherResult<T> = Result<T, FetcherError>;

/// Lazy sequence of listing batches, one element per page
pub type PageStream<'a> =
    Pin<Box<dyn Stream<Item = FetcherResult<Vec<crate::ItemId>>> + Send + 'a>>;
