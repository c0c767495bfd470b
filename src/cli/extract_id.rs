//! QR URL to registration number

use clap::Args;
use serde_json::json;

use super::{CliError, OutputFormat};
use crate::identifier::EprelId;

/// Extract-id subcommand
#[derive(Debug, Args)]
pub struct ExtractIdCommand {
    /// QR code URL, e.g. https://eprel.ec.europa.eu/qr/123456
    pub url: String,
}

impl ExtractIdCommand {
    /// Print the registration number, or fail if the URL is not an EPREL QR URL
    pub fn execute(&self, format: OutputFormat) -> Result<(), CliError> {
        let id = EprelId::from_qr_url(&self.url).ok_or_else(|| {
            CliError::InvalidArgument(format!("not an EPREL QR URL: {}", self.url))
        })?;

        match format {
            OutputFormat::Json => println!("{}", json!({ "url": self.url, "eprel_id": id.as_str() })),
            OutputFormat::Human => println!("{id}"),
        }
        Ok(())
    }
}
