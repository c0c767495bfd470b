//! CLI error types and conversions

use crate::downloader::ConfigError;
use crate::fetcher::FetcherError;
use crate::identifier::IdentifierError;
use crate::metrics::MetricsError;
use crate::output::OutputError;
use crate::registry::CatalogError;

/// CLI errors
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// Identifier error
    #[error("identifier error: {0}")]
    IdentifierError(#[from] IdentifierError),

    /// Catalog error
    #[error("{0}")]
    CatalogError(#[from] CatalogError),

    /// Fetcher error
    #[error("fetcher error: {0}")]
    FetcherError(#[from] FetcherError),

    /// Output error
    #[error("output error: {0}")]
    OutputError(#[from] OutputError),

    /// Metrics exporter error
    #[error("metrics error: {0}")]
    MetricsError(#[from] MetricsError),

    /// Configuration error
    #[error("configuration error: {0}")]
    ConfigurationError(#[from] ConfigError),

    /// Invalid argument
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// One or more categories could not be downloaded
    #[error("{0} category download(s) failed")]
    CategoriesFailed(usize),
}
