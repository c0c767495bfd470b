//! JSON snapshot of one category fetch

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::info;

use super::{OutputError, OutputResult};
use crate::{ItemId, ProductRecord};

/// Source tag written into every snapshot
pub const SNAPSHOT_SOURCE: &str = "EPREL";

/// Products fetched for one category, with provenance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductSnapshot {
    /// Registry the data came from
    pub source: String,
    /// Category key
    pub category: String,
    /// When the fetch finished
    pub fetch_timestamp: DateTime<Utc>,
    /// Number of entries in `products`
    pub total_products: usize,
    /// Whether `products` holds full documents or id stubs
    pub details_fetched: bool,
    /// Product documents or `{"eprelRegistrationNumber": id}` stubs
    pub products: Vec<ProductRecord>,
}

impl ProductSnapshot {
    /// Snapshot of full product documents
    pub fn with_details(category: impl Into<String>, products: Vec<ProductRecord>) -> Self {
        Self::build(category.into(), products, true, Utc::now())
    }

    /// Snapshot of id stubs for listing-only runs
    pub fn from_ids(category: impl Into<String>, ids: &[ItemId]) -> Self {
        let products = ids
            .iter()
            .map(|id| json!({ "eprelRegistrationNumber": id }))
            .collect();
        Self::build(category.into(), products, false, Utc::now())
    }

    fn build(
        category: String,
        products: Vec<ProductRecord>,
        details_fetched: bool,
        fetch_timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            source: SNAPSHOT_SOURCE.to_string(),
            category,
            fetch_timestamp,
            total_products: products.len(),
            details_fetched,
            products,
        }
    }

    /// Override the fetch timestamp
    pub fn at(mut self, fetch_timestamp: DateTime<Utc>) -> Self {
        self.fetch_timestamp = fetch_timestamp;
        self
    }

    /// `eprel_{category}_{YYYYmmdd_HHMMSS}.json`
    pub fn file_name(&self) -> String {
        format!(
            "eprel_{}_{}.json",
            self.category,
            self.fetch_timestamp.format("%Y%m%d_%H%M%S")
        )
    }

    /// Write the snapshot as pretty JSON into `output_dir`, creating it if needed
    pub fn write_to_dir(&self, output_dir: &Path) -> OutputResult<PathBuf> {
        fs::create_dir_all(output_dir).map_err(|e| {
            OutputError::IoError(format!(
                "failed to create {}: {e}",
                output_dir.display()
            ))
        })?;

        let path = output_dir.join(self.file_name());
        let file = File::create(&path)
            .map_err(|e| OutputError::IoError(format!("failed to create {}: {e}", path.display())))?;
        let mut writer = BufWriter::new(file);

        serde_json::to_writer_pretty(&mut writer, self)
            .map_err(|e| OutputError::SerializationError(e.to_string()))?;
        writer
            .write_all(b"\n")
            .and_then(|()| writer.flush())
            .map_err(|e| OutputError::IoError(format!("failed to write {}: {e}", path.display())))?;

        info!(
            "Saved {} products for '{}' to {}",
            self.total_products,
            self.category,
            path.display()
        );
        Ok(path)
    }
}
