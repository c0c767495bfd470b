//! EPREL registry client
//!
//! Composes the category catalog, the rate limiter and the retrying HTTP
//! client into the product, listing, pagination and label operations.

use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};

use super::eprel_http::EprelHttpClient;
use super::pagination::{page_stream, PageCursor};
use super::retry::RetryPolicy;
use super::transport::{HttpRequest, ReqwestTransport, Transport};
use super::{FetcherError, FetcherResult, PageStream};
use crate::downloader::config::ClientConfig;
use crate::downloader::rate_limit::RateLimiter;
use crate::registry::CategoryCatalog;
use crate::{metrics, LabelDownload, Page, ProductRecord};

/// Client for one registry endpoint
///
/// Operations are meant to be issued sequentially; the pacing state is owned
/// by this instance, so separate clients never interfere with each other.
pub struct EprelClient {
    http: EprelHttpClient,
    catalog: CategoryCatalog,
    config: ClientConfig,
}

impl EprelClient {
    /// Create a client talking to the network through reqwest
    ///
    /// # Errors
    /// Returns `ConfigError` for invalid settings or an unusable API key.
    pub fn new(config: ClientConfig) -> FetcherResult<Self> {
        config.validate()?;
        let transport = ReqwestTransport::new(&config)
            .map_err(|e| FetcherError::ConfigError(e.to_string()))?;
        Self::with_transport(config, Arc::new(transport))
    }

    /// Create a client on top of an arbitrary transport
    pub fn with_transport(config: ClientConfig, transport: Arc<dyn Transport>) -> FetcherResult<Self> {
        config.validate()?;
        let catalog = CategoryCatalog::load_embedded()?;
        let rate_limiter = Arc::new(RateLimiter::with_interval(config.min_request_interval()));
        let policy = RetryPolicy::new(config.max_retries, config.retry_base_delay);

        Ok(Self {
            http: EprelHttpClient::new(transport, rate_limiter, policy),
            catalog,
            config,
        })
    }

    /// Category catalog in use
    pub fn catalog(&self) -> &CategoryCatalog {
        &self.catalog
    }

    /// Settings the client was built with
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Pacing budget shared by every operation of this client
    pub fn rate_limiter(&self) -> &RateLimiter {
        self.http.rate_limiter()
    }

    fn resolve(&self, category: &str) -> FetcherResult<&str> {
        Ok(self.catalog.resolve(category)?)
    }

    /// Fetch one product document
    ///
    /// Issues `GET {base}/{segment}/{id}`.
    pub async fn get_product(&self, category: &str, id: &str) -> FetcherResult<ProductRecord> {
        let segment = self.resolve(category)?;
        let url = format!("{}/{}/{}", self.config.base_url, segment, id);
        self.http.get_json(&HttpRequest::get(url)).await
    }

    /// Fetch one listing page
    ///
    /// Issues `GET {base}/{segment}?manufacturer=&tradeMark=&from=&size=` with
    /// `from = page * page_size`.
    pub async fn list_products(
        &self,
        category: &str,
        page: usize,
        page_size: usize,
    ) -> FetcherResult<Page> {
        let segment = self.resolve(category)?;
        let from = page.checked_mul(page_size).ok_or_else(|| {
            FetcherError::InvalidRequest(format!("page {page} x size {page_size} overflows"))
        })?;

        let request = HttpRequest::get(format!("{}/{}", self.config.base_url, segment))
            .with_query("manufacturer", "")
            .with_query("tradeMark", "")
            .with_query("from", from)
            .with_query("size", page_size);

        self.http.get_json(&request).await
    }

    /// Lazily walk every listing page of a category
    ///
    /// Each element is one page's batch of item ids. The stream ends on an
    /// empty batch, once `(page + 1) * page_size >= total`, or after
    /// `max_pages` pages, whichever comes first. A failed page ends the
    /// stream after yielding the error.
    ///
    /// # Errors
    /// The category is resolved up front, so `UnknownCategory` is returned
    /// before any request is made. `page_size` must be at least 1.
    pub fn fetch_all_products(
        &self,
        category: &str,
        max_pages: Option<usize>,
        page_size: usize,
    ) -> FetcherResult<PageStream<'_>> {
        self.resolve(category)?;
        if page_size == 0 {
            return Err(FetcherError::InvalidRequest(
                "page_size must be at least 1".to_string(),
            ));
        }

        let cursor = PageCursor::new(category, page_size, max_pages);
        let category = category.to_string();
        Ok(page_stream(cursor, move |page| {
            let category = category.clone();
            async move { self.list_products(&category, page, page_size).await }
        }))
    }

    /// URL of a product's energy label SVG
    ///
    /// `{labels_base}/{segment}/Label_{id}.svg`
    pub fn label_url(&self, category: &str, id: &str) -> FetcherResult<String> {
        let segment = self.resolve(category)?;
        Ok(format!(
            "{}/{}/Label_{}.svg",
            self.config.labels_base_url, segment, id
        ))
    }

    /// Download a product's label into `output_dir/Label_{id}.svg`
    ///
    /// Single attempt, no retry. Any network, status or filesystem failure
    /// yields [`LabelDownload::Unavailable`] and leaves no file behind; only
    /// an unknown category is reported as an error.
    pub async fn download_label(
        &self,
        category: &str,
        id: &str,
        output_dir: &Path,
    ) -> FetcherResult<LabelDownload> {
        let url = self.label_url(category, id)?;

        let response = match self.http.get_once(&HttpRequest::get(url.as_str())).await {
            Ok(response) if response.is_success() => response,
            Ok(response) => {
                warn!(
                    "Label for {}/{} unavailable: HTTP {}",
                    category, id, response.status
                );
                metrics::record_label(false);
                return Ok(LabelDownload::Unavailable);
            }
            Err(e) => {
                warn!("Failed to download label for {}/{}: {}", category, id, e);
                metrics::record_label(false);
                return Ok(LabelDownload::Unavailable);
            }
        };

        let path = output_dir.join(format!("Label_{id}.svg"));
        let written = match tokio::fs::create_dir_all(output_dir).await {
            Ok(()) => tokio::fs::write(&path, &response.body).await,
            Err(e) => Err(e),
        };
        if let Err(e) = written {
            warn!("Failed to write label to {}: {}", path.display(), e);
            let _ = tokio::fs::remove_file(&path).await;
            metrics::record_label(false);
            return Ok(LabelDownload::Unavailable);
        }

        info!("Downloaded label to {}", path.display());
        metrics::record_label(true);
        Ok(LabelDownload::Downloaded(path))
    }
}
