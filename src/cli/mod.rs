//! CLI command implementations

pub mod categories;
pub mod download;
pub mod error;
pub mod extract_id;

pub use categories::CategoriesCommand;
pub use download::{Cli, Commands, DownloadArgs, OutputFormat};
pub use error::CliError;
pub use extract_id::ExtractIdCommand;
