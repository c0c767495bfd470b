//! Request, retry and pagination metrics
//!
//! Recording goes through the `metrics` facade and is a no-op until a
//! recorder is installed. [`init_metrics`] installs a Prometheus exporter.

use metrics::{counter, describe_counter, describe_histogram, histogram, Unit};
use metrics_exporter_prometheus::PrometheusBuilder;
use once_cell::sync::OnceCell;
use std::net::SocketAddr;
use std::time::Duration;
use tracing::{debug, info};

use crate::fetcher::retry::FailureKind;

static METRICS_INITIALIZED: OnceCell<SocketAddr> = OnceCell::new();

/// Install the Prometheus exporter on `addr`
///
/// Idempotent: later calls are ignored once an exporter is running.
pub fn init_metrics(addr: SocketAddr) -> Result<(), MetricsError> {
    if let Some(existing) = METRICS_INITIALIZED.get() {
        debug!("Metrics already initialized on {}, skipping", existing);
        return Ok(());
    }

    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .map_err(|e| MetricsError::Install(e.to_string()))?;

    describe_counter!(
        "eprel_http_requests_total",
        Unit::Count,
        "HTTP requests issued to the registry, by status"
    );
    describe_counter!(
        "eprel_http_retries_total",
        Unit::Count,
        "Retried attempts, by failure class"
    );
    describe_counter!(
        "eprel_pages_fetched_total",
        Unit::Count,
        "Listing pages yielded, by category"
    );
    describe_counter!(
        "eprel_labels_total",
        Unit::Count,
        "Label downloads, by result"
    );
    describe_histogram!(
        "eprel_rate_limit_wait_seconds",
        Unit::Seconds,
        "Time requests were held back by the rate limiter"
    );

    let _ = METRICS_INITIALIZED.set(addr);
    info!("Metrics exporter listening on {}", addr);
    Ok(())
}

/// Count one HTTP exchange; `None` means no status was received
pub fn record_request(status: Option<u16>) {
    let status = status.map_or_else(|| "transport_error".to_string(), |s| s.to_string());
    counter!("eprel_http_requests_total", "status" => status).increment(1);
}

/// Count one retry
pub fn record_retry(kind: FailureKind) {
    counter!("eprel_http_retries_total", "cause" => kind.metric_label()).increment(1);
}

/// Count one yielded listing page
pub fn record_page(category: &str) {
    counter!("eprel_pages_fetched_total", "category" => category.to_string()).increment(1);
}

/// Count one label download attempt
pub fn record_label(downloaded: bool) {
    let result = if downloaded { "downloaded" } else { "unavailable" };
    counter!("eprel_labels_total", "result" => result).increment(1);
}

/// Record time spent waiting on the rate limiter
pub fn record_rate_limit_wait(waited: Duration) {
    histogram!("eprel_rate_limit_wait_seconds").record(waited.as_secs_f64());
}

/// Metrics setup errors
#[derive(Debug, thiserror::Error)]
pub enum MetricsError {
    /// Exporter could not be installed
    #[error("failed to install Prometheus exporter: {0}")]
    Install(String),
}
