//! # EPREL Downloader Library
//!
//! Client library for pulling product data out of the EU Product Registry for
//! Energy Labelling (EPREL) and writing it as snapshots an open product
//! database can import.
//!
//! ## Features
//!
//! - **Rate Limiting**: every outbound call respects a per-client minimum interval
//!   (5 requests per second by default)
//! - **Retry**: 429, 5xx and network failures are retried with exponential backoff
//! - **Lazy Pagination**: listings are exposed as a stream of page batches that
//!   stops on an empty page, the server-reported total, or a page cap
//! - **Labels**: energy label SVGs download as a best-effort side channel
//!
//! ## Quick Start
//!
//! ```no_run
//! use eprel_downloader::downloader::ClientConfig;
//! use eprel_downloader::fetcher::EprelClient;
//! use futures_util::StreamExt;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = EprelClient::new(ClientConfig::from_env())?;
//!
//! let mut pages = client.fetch_all_products("smartphones", Some(2), 50)?;
//! while let Some(batch) = pages.next().await {
//!     for id in batch? {
//!         println!("{id}");
//!     }
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! - [`registry`] - category key to API path segment catalog
//! - [`downloader`] - configuration and the rate limiter
//! - [`fetcher`] - transport seam, retry policy, pagination and the registry client
//! - [`identifier`] - registration numbers and QR URL parsing
//! - [`output`] - JSON snapshot writer
//! - [`cli`] - command line driver

#![warn(missing_docs)]
#![warn(clippy::all)]

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// CLI command implementations
pub mod cli;

/// Client configuration and request pacing
pub mod downloader;

/// Registry fetchers
pub mod fetcher;

/// Registration number parsing
pub mod identifier;

/// Request and pagination metrics
pub mod metrics;

/// Snapshot writers
pub mod output;

/// Category catalog
pub mod registry;

/// Graceful shutdown coordination shared across modules
pub mod shutdown;

// Re-export commonly used types
pub use identifier::EprelId;

/// Opaque listing item (usually a registration number)
pub type ItemId = serde_json::Value;

/// Product document as returned by the registry; only guaranteed to be valid JSON
pub type ProductRecord = serde_json::Value;

/// One listing page
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Page {
    /// Items on this page
    #[serde(rename = "hits", default)]
    pub items: Vec<ItemId>,
    /// Server-reported total for the whole listing
    #[serde(default)]
    pub total: u64,
}

impl Page {
    /// Number of items on this page
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the page carries no items
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Result of a label download
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LabelDownload {
    /// Label written to this path
    Downloaded(PathBuf),
    /// No label could be obtained; nothing was written
    Unavailable,
}

impl LabelDownload {
    /// Whether a file was written
    pub fn is_downloaded(&self) -> bool {
        matches!(self, LabelDownload::Downloaded(_))
    }

    /// Path of the written file
    pub fn path(&self) -> Option<&Path> {
        match self {
            LabelDownload::Downloaded(path) => Some(path),
            LabelDownload::Unavailable => None,
        }
    }
}
