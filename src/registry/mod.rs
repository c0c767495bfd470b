//! Category catalog for the EPREL product registry
//!
//! Maps logical category keys (e.g. `smartphones`) to the path segment the
//! registry API uses for that product group (e.g. `smartphonestablets20231669`).
//! The table is embedded in the binary and loaded once; it is never mutated.

use once_cell::sync::Lazy;
use serde::Deserialize;
use std::collections::BTreeMap;

/// Embedded catalog data
const CATALOG_JSON: &str = include_str!("categories.json");

/// Global catalog instance (loaded once)
static CATALOG: Lazy<Result<CategoryCatalog, CatalogError>> =
    Lazy::new(|| CategoryCatalog::from_json(CATALOG_JSON));

/// Immutable mapping from category key to API path segment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryCatalog {
    entries: BTreeMap<String, String>,
}

/// A single key/path pair
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Category<'a> {
    /// Logical key used on the command line and in output file names
    pub key: &'a str,
    /// Path segment used in API and label URLs
    pub path: &'a str,
}

#[derive(Debug, Deserialize)]
struct RawCatalog {
    #[allow(dead_code)]
    schema_version: String,
    categories: Vec<RawCategory>,
}

#[derive(Debug, Deserialize)]
struct RawCategory {
    key: String,
    path: String,
}

impl CategoryCatalog {
    /// Load the embedded catalog
    ///
    /// This is a singleton operation - the catalog is parsed once and cached.
    pub fn load() -> Result<&'static Self, &'static CatalogError> {
        CATALOG.as_ref()
    }

    /// Owned copy of the cached embedded catalog
    ///
    /// The JSON is parsed at most once per process; later calls clone the
    /// cached table.
    pub fn load_embedded() -> Result<Self, CatalogError> {
        Self::load().cloned().map_err(Clone::clone)
    }

    /// Build a catalog from explicit key/path pairs
    ///
    /// # Errors
    /// Returns [`CatalogError::EmptyEntry`] if a key or path is blank.
    pub fn from_entries<I, K, P>(entries: I) -> Result<Self, CatalogError>
    where
        I: IntoIterator<Item = (K, P)>,
        K: Into<String>,
        P: Into<String>,
    {
        let mut map = BTreeMap::new();
        for (key, path) in entries {
            let key = key.into();
            let path = path.into();
            if key.trim().is_empty() || path.trim().is_empty() {
                return Err(CatalogError::EmptyEntry(key));
            }
            map.insert(key, path);
        }
        Ok(Self { entries: map })
    }

    fn from_json(json: &str) -> Result<Self, CatalogError> {
        let raw: RawCatalog = serde_json::from_str(json)
            .map_err(|e| CatalogError::ParseError(format!("Failed to parse catalog: {e}")))?;

        Self::from_entries(raw.categories.into_iter().map(|c| (c.key, c.path)))
    }

    /// Resolve a category key to its API path segment
    ///
    /// # Errors
    /// Returns [`CatalogError::UnknownCategory`] listing the available keys.
    pub fn resolve(&self, key: &str) -> Result<&str, CatalogError> {
        self.entries
            .get(key)
            .map(String::as_str)
            .ok_or_else(|| CatalogError::UnknownCategory {
                category: key.to_string(),
                available: self.keys().join(", "),
            })
    }

    /// Whether the key is known
    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// All category keys, sorted
    pub fn keys(&self) -> Vec<&str> {
        self.entries.keys().map(String::as_str).collect()
    }

    /// All entries, sorted by key
    pub fn entries(&self) -> impl Iterator<Item = Category<'_>> {
        self.entries.iter().map(|(key, path)| Category {
            key: key.as_str(),
            path: path.as_str(),
        })
    }

    /// Number of categories
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the catalog has no categories
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Catalog errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CatalogError {
    /// Key is not in the catalog
    #[error("unknown category '{category}'. Available: {available}")]
    UnknownCategory {
        /// The key that was requested
        category: String,
        /// Comma-separated list of known keys
        available: String,
    },

    /// Embedded catalog could not be parsed
    #[error("catalog parse error: {0}")]
    ParseError(String),

    /// A key or path segment was blank
    #[error("catalog entry '{0}' has an empty key or path")]
    EmptyEntry(String),
}
