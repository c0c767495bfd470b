//! CLI command for listing the category catalog

use clap::Args;
use serde_json::json;

use super::{CliError, OutputFormat};
use crate::registry::CategoryCatalog;

/// Categories subcommand
#[derive(Debug, Args)]
pub struct CategoriesCommand {
    /// Only list keys containing this text
    pub filter: Option<String>,
}

impl CategoriesCommand {
    /// Execute the categories command
    pub fn execute(&self, format: OutputFormat) -> Result<(), CliError> {
        let catalog = CategoryCatalog::load_embedded()?;
        let rows = self.rows(&catalog);

        match format {
            OutputFormat::Json => {
                let entries: Vec<_> = rows
                    .iter()
                    .map(|(key, path)| json!({ "category": key, "path": path }))
                    .collect();
                let text = serde_json::to_string_pretty(&entries).map_err(|e| {
                    CliError::InvalidArgument(format!("failed to serialize categories: {e}"))
                })?;
                println!("{text}");
            }
            OutputFormat::Human => {
                println!("Found {} categories:\n", rows.len());
                let width = rows.iter().map(|(key, _)| key.len()).max().unwrap_or(0);
                for (key, path) in rows {
                    println!("{key:<width$} | {path}");
                }
            }
        }

        Ok(())
    }

    fn rows<'a>(&self, catalog: &'a CategoryCatalog) -> Vec<(&'a str, &'a str)> {
        let filter = self.filter.as_deref().map(str::to_lowercase);
        catalog
            .entries()
            .filter(|c| filter.as_deref().map_or(true, |f| c.key.contains(f)))
            .map(|c| (c.key, c.path))
            .collect()
    }
}
