//! Snapshot writers
//!
//! Fetched products are persisted as one JSON document per category and run,
//! wrapped in provenance metadata.

pub mod json;

pub use json::ProductSnapshot;

/// Output writer errors
#[derive(Debug, thiserror::Error)]
pub enum OutputError {
    /// IO error
    #[error("IO error: {0}")]
    IoError(String),

    /// Serialization error
    #[error("serialization error: {0}")]
    SerializationError(String),
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;
