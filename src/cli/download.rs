//! Download command implementation

use clap::{Parser, Subcommand, ValueEnum};
use futures_util::StreamExt;
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use serde_json::{json, Value};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{error, info, warn};

use super::CliError;
use crate::downloader::config::{
    ClientConfig, DEFAULT_PAGE_SIZE, MAX_REQUESTS_PER_SECOND, MAX_RETRIES,
};
use crate::fetcher::EprelClient;
use crate::output::ProductSnapshot;
use crate::registry::CategoryCatalog;
use crate::shutdown::SharedShutdown;
use crate::ItemId;

/// EPREL downloader CLI
#[derive(Parser, Debug)]
#[command(name = "eprel-downloader")]
#[command(about = "Download product data from the EU energy label registry (EPREL)", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Command to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Output format (json or human)
    #[arg(long, global = true, value_enum, default_value = "human")]
    pub output_format: OutputFormat,

    /// Enable debug logging
    #[arg(short, long, global = true, default_value_t = false)]
    pub verbose: bool,
}

/// CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Download product listings (and optionally details and labels)
    Download(DownloadArgs),

    /// List the known product categories
    Categories(super::CategoriesCommand),

    /// Extract a registration number from an EPREL QR code URL
    ExtractId(super::ExtractIdCommand),
}

/// Output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// JSON output
    Json,
    /// Human-readable output
    Human,
}

/// Download command arguments
#[derive(Parser, Debug)]
pub struct DownloadArgs {
    /// Category key to download (repeatable)
    #[arg(short, long = "category", required = true)]
    pub categories: Vec<String>,

    /// API key sent as `x-api-key`
    #[arg(long, env = "EPREL_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Directory snapshots are written to
    #[arg(short, long, default_value = "data")]
    pub output: PathBuf,

    /// Stop after this many listing pages per category
    #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
    pub max_pages: Option<u64>,

    /// Items requested per listing page
    #[arg(long, default_value_t = DEFAULT_PAGE_SIZE as u64, value_parser = clap::value_parser!(u64).range(1..=1000))]
    pub page_size: u64,

    /// Fetch the full product document for every listed id
    #[arg(long, default_value_t = false)]
    pub fetch_details: bool,

    /// Download energy label SVGs into `<output>/labels/<category>`
    #[arg(long, default_value_t = false)]
    pub labels: bool,

    /// Attempts per request (1-20)
    #[arg(long, default_value_t = MAX_RETRIES, value_parser = clap::value_parser!(u32).range(1..=20))]
    pub max_retries: u32,

    /// Outbound request budget
    #[arg(long, default_value_t = MAX_REQUESTS_PER_SECOND, value_parser = clap::value_parser!(u32).range(1..=100))]
    pub requests_per_second: u32,

    /// Serve Prometheus metrics on this address
    #[arg(long)]
    pub metrics_addr: Option<SocketAddr>,
}

/// What one category run produced
#[derive(Debug, Clone, Serialize)]
pub struct CategoryReport {
    /// Category key
    pub category: String,
    /// Whether the category finished with no listing or fatal error
    pub success: bool,
    /// Listing ids collected
    pub ids_collected: usize,
    /// Products written to the snapshot
    pub products_written: usize,
    /// Labels saved to disk
    pub labels_downloaded: usize,
    /// Stopped early by a listing error or interrupt
    pub partial: bool,
    /// Snapshot file
    pub output_path: Option<PathBuf>,
    /// Failure message
    pub error: Option<String>,
}

impl CategoryReport {
    fn failed(category: &str, error: &CliError) -> Self {
        Self {
            category: category.to_string(),
            success: false,
            ids_collected: 0,
            products_written: 0,
            labels_downloaded: 0,
            partial: false,
            output_path: None,
            error: Some(error.to_string()),
        }
    }
}

/// Render a listing item as a registration number
///
/// Listing hits are usually bare numbers or strings; object hits are read
/// through their `eprelRegistrationNumber` field.
pub fn item_id_string(item: &ItemId) -> Option<String> {
    match item {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Object(map) => map.get("eprelRegistrationNumber").and_then(item_id_string),
        _ => None,
    }
}

impl DownloadArgs {
    /// Client settings derived from the flags
    pub fn client_config(&self) -> ClientConfig {
        ClientConfig::default()
            .with_api_key(self.api_key.clone().filter(|key| !key.trim().is_empty()))
            .with_max_retries(self.max_retries)
            .with_max_requests_per_second(self.requests_per_second)
    }

    /// Check every requested category against the catalog
    pub fn validate_categories(&self, catalog: &CategoryCatalog) -> Result<(), CliError> {
        for category in &self.categories {
            catalog.resolve(category)?;
        }
        Ok(())
    }

    /// Execute the download command
    pub async fn execute(&self, cli: &Cli, shutdown: SharedShutdown) -> Result<(), CliError> {
        let client = EprelClient::new(self.client_config())?;
        self.execute_with_client(&client, cli.output_format, shutdown)
            .await
    }

    /// Run every requested category through `client`
    ///
    /// Categories run one after another. A failed category is reported and
    /// the next one proceeds; the command fails at the end if any did.
    pub async fn execute_with_client(
        &self,
        client: &EprelClient,
        format: OutputFormat,
        shutdown: SharedShutdown,
    ) -> Result<(), CliError> {
        self.validate_categories(client.catalog())?;

        let mut reports = Vec::with_capacity(self.categories.len());
        for category in &self.categories {
            if shutdown.is_shutdown_requested() {
                warn!("Shutdown requested, skipping category '{}'", category);
                break;
            }

            info!("Downloading category '{}'", category);
            let report = match self
                .download_category(client, category, format, &shutdown)
                .await
            {
                Ok(report) => report,
                Err(e) => {
                    error!("Category '{}' failed: {}", category, e);
                    CategoryReport::failed(category, &e)
                }
            };
            reports.push(report);
        }

        match format {
            OutputFormat::Json => output_json(&reports)?,
            OutputFormat::Human => output_human(&reports),
        }

        let failed = reports.iter().filter(|r| !r.success).count();
        if failed > 0 {
            return Err(CliError::CategoriesFailed(failed));
        }
        Ok(())
    }

    async fn download_category(
        &self,
        client: &EprelClient,
        category: &str,
        format: OutputFormat,
        shutdown: &SharedShutdown,
    ) -> Result<CategoryReport, CliError> {
        let max_pages = self.max_pages.map(|p| usize::try_from(p).unwrap_or(usize::MAX));
        let page_size = usize::try_from(self.page_size)
            .map_err(|_| CliError::InvalidArgument(format!("page size {} too large", self.page_size)))?;

        let progress = create_spinner(format, category);
        let mut ids: Vec<ItemId> = Vec::new();
        let mut partial = false;
        let mut listing_error = None;

        let mut pages = client.fetch_all_products(category, max_pages, page_size)?;
        while let Some(batch) = pages.next().await {
            match batch {
                Ok(batch) => {
                    ids.extend(batch);
                    progress.set_message(format!("{category}: {} ids", ids.len()));
                }
                Err(e) => {
                    warn!(
                        "Listing for '{}' stopped after {} ids: {}",
                        category,
                        ids.len(),
                        e
                    );
                    partial = true;
                    listing_error = Some(e);
                    break;
                }
            }
            if shutdown.is_shutdown_requested() {
                warn!("Shutdown requested, keeping {} ids for '{}'", ids.len(), category);
                partial = true;
                break;
            }
        }
        drop(pages);

        // Nothing listed: fail the category without writing an empty snapshot
        if ids.is_empty() {
            if let Some(e) = listing_error.take() {
                progress.finish_and_clear();
                return Err(e.into());
            }
        }
        info!("Collected {} ids for '{}'", ids.len(), category);

        let snapshot = if self.fetch_details {
            let products = fetch_details(client, category, &ids, &progress, shutdown).await;
            ProductSnapshot::with_details(category, products)
        } else {
            ProductSnapshot::from_ids(category, &ids)
        };

        let labels_downloaded = if self.labels {
            let dir = self.output.join("labels").join(category);
            download_labels(client, category, &ids, &dir, &progress, shutdown).await?
        } else {
            0
        };

        progress.finish_and_clear();
        let path = snapshot.write_to_dir(&self.output)?;

        Ok(CategoryReport {
            category: category.to_string(),
            success: listing_error.is_none(),
            ids_collected: ids.len(),
            products_written: snapshot.total_products,
            labels_downloaded,
            partial: partial || shutdown.is_shutdown_requested(),
            output_path: Some(path),
            error: listing_error.map(|e| e.to_string()),
        })
    }
}

async fn fetch_details(
    client: &EprelClient,
    category: &str,
    ids: &[ItemId],
    progress: &ProgressBar,
    shutdown: &SharedShutdown,
) -> Vec<Value> {
    let mut products = Vec::with_capacity(ids.len());
    for (index, item) in ids.iter().enumerate() {
        if shutdown.is_shutdown_requested() {
            warn!(
                "Shutdown requested, keeping {} unfetched ids for '{}' as stubs",
                ids.len() - index,
                category
            );
            products.extend(
                ids[index..]
                    .iter()
                    .map(|id| json!({ "eprelRegistrationNumber": id })),
            );
            break;
        }
        let Some(id) = item_id_string(item) else {
            warn!("Skipping listing item without a registration number: {}", item);
            continue;
        };
        progress.set_message(format!("{category}: details {}/{}", index + 1, ids.len()));
        match client.get_product(category, &id).await {
            Ok(product) => products.push(product),
            Err(e) => warn!("Failed to fetch product {} in '{}': {}", id, category, e),
        }
    }
    products
}

async fn download_labels(
    client: &EprelClient,
    category: &str,
    ids: &[ItemId],
    dir: &Path,
    progress: &ProgressBar,
    shutdown: &SharedShutdown,
) -> Result<usize, CliError> {
    let mut downloaded = 0;
    for (index, item) in ids.iter().enumerate() {
        if shutdown.is_shutdown_requested() {
            warn!("Shutdown requested, stopping label downloads for '{}'", category);
            break;
        }
        let Some(id) = item_id_string(item) else {
            continue;
        };
        progress.set_message(format!("{category}: labels {}/{}", index + 1, ids.len()));
        if client.download_label(category, &id, dir).await?.is_downloaded() {
            downloaded += 1;
        }
    }
    info!("Downloaded {} of {} labels for '{}'", downloaded, ids.len(), category);
    Ok(downloaded)
}

fn create_spinner(format: OutputFormat, category: &str) -> ProgressBar {
    if format == OutputFormat::Json {
        return ProgressBar::hidden();
    }
    let pb = ProgressBar::new_spinner();
    let style = ProgressStyle::default_spinner()
        .template("{spinner:.green} [{elapsed_precise}] {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner());
    pb.set_style(style);
    pb.enable_steady_tick(Duration::from_millis(120));
    pb.set_message(format!("{category}: listing"));
    pb
}

fn output_json(reports: &[CategoryReport]) -> Result<(), CliError> {
    let text = serde_json::to_string(reports)
        .map_err(|e| CliError::InvalidArgument(format!("failed to serialize report: {e}")))?;
    println!("{text}");
    Ok(())
}

fn output_human(reports: &[CategoryReport]) {
    for report in reports {
        if report.success {
            println!("\n{} completed{}", report.category, if report.partial { " (partial)" } else { "" });
            if let Some(path) = &report.output_path {
                println!("Output: {}", path.display());
            }
            println!("Ids collected: {}", report.ids_collected);
            println!("Products written: {}", report.products_written);
            if report.labels_downloaded > 0 {
                println!("Labels downloaded: {}", report.labels_downloaded);
            }
        } else {
            eprintln!("\n{} failed!", report.category);
            if let Some(e) = &report.error {
                eprintln!("Error: {e}");
            }
            if let Some(path) = &report.output_path {
                eprintln!("Kept {} ids in {}", report.ids_collected, path.display());
            }
        }
    }
}
