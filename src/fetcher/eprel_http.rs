//! Rate-limited, retrying HTTP client
//!
//! Every outbound call goes through the client's [`RateLimiter`]. JSON calls
//! are retried with exponential backoff on 429, 5xx and transport failures;
//! other 4xx responses fail immediately.

use serde::de::DeserializeOwned;
use std::sync::Arc;
use tokio::time::sleep;
use tracing::{debug, warn};

use super::retry::{classify, FailureKind, RetryDecision, RetryPolicy};
use super::transport::{HttpRequest, HttpResponse, Transport, TransportError};
use super::{FetcherError, FetcherResult};
use crate::downloader::rate_limit::RateLimiter;
use crate::metrics;

/// Longest response excerpt carried in an error message
const ERROR_BODY_EXCERPT: usize = 200;

/// HTTP client shared by all registry operations of one [`EprelClient`](super::EprelClient)
pub struct EprelHttpClient {
    transport: Arc<dyn Transport>,
    rate_limiter: Arc<RateLimiter>,
    policy: RetryPolicy,
}

impl EprelHttpClient {
    /// Create a new HTTP client
    ///
    /// # Arguments
    /// * `transport` - Network seam (reqwest in production)
    /// * `rate_limiter` - Pacing budget; share the `Arc` to share the budget
    /// * `policy` - Attempt budget and backoff base
    pub fn new(
        transport: Arc<dyn Transport>,
        rate_limiter: Arc<RateLimiter>,
        policy: RetryPolicy,
    ) -> Self {
        Self {
            transport,
            rate_limiter,
            policy,
        }
    }

    /// Attempts per request
    pub fn max_retries(&self) -> u32 {
        self.policy.max_attempts
    }

    /// Retry policy in effect
    pub fn policy(&self) -> RetryPolicy {
        self.policy
    }

    /// Pacing budget shared by every call through this client
    pub fn rate_limiter(&self) -> &Arc<RateLimiter> {
        &self.rate_limiter
    }

    /// GET and deserialize a JSON body, retrying transient failures
    ///
    /// # Errors
    /// `RequestFailed` for non-retryable statuses or exhausted 429/5xx,
    /// `TransportFailed` for exhausted network failures, `ParseError` when a
    /// 2xx body does not deserialize into `T`.
    pub async fn get_json<T>(&self, request: &HttpRequest) -> FetcherResult<T>
    where
        T: DeserializeOwned,
    {
        let response = self.get_with_retry(request).await?;
        serde_json::from_slice(&response.body).map_err(|e| {
            FetcherError::ParseError(format!(
                "failed to deserialize response from {}: {e}",
                request.url
            ))
        })
    }

    /// GET with rate limiting and retry, returning the raw 2xx response
    pub async fn get_with_retry(&self, request: &HttpRequest) -> FetcherResult<HttpResponse> {
        let max_attempts = self.policy.max_attempts;
        let mut attempt = 0;

        loop {
            self.rate_limiter.acquire().await;
            debug!(
                "GET {} ({} params), attempt {}/{}",
                request.url,
                request.query.len(),
                attempt + 1,
                max_attempts
            );

            let result = self.transport.get(request).await;
            let outcome = classify(&result);
            metrics::record_request(result.as_ref().ok().map(|r| r.status));

            match self.policy.decide(attempt, outcome) {
                RetryDecision::Succeed => {
                    if attempt > 0 {
                        debug!("Request to {} succeeded on attempt {}", request.url, attempt + 1);
                    }
                    return result.map_err(FetcherError::from);
                }
                RetryDecision::Retry(backoff) => {
                    // Retry is only decided for failures
                    let kind = outcome.unwrap_or(FailureKind::NetworkGeneric);
                    warn!(
                        "{} on {} (attempt {}/{}), retrying in {:?}",
                        kind.description(),
                        request.url,
                        attempt + 1,
                        max_attempts,
                        backoff
                    );
                    metrics::record_retry(kind);
                    sleep(backoff).await;
                    attempt += 1;
                }
                RetryDecision::Exhausted(backoff, kind) => {
                    warn!(
                        "{} on {} (attempt {}/{}), giving up after {:?}",
                        kind.description(),
                        request.url,
                        attempt + 1,
                        max_attempts,
                        backoff
                    );
                    sleep(backoff).await;
                    return Err(failure_error(kind, result, attempt + 1));
                }
                RetryDecision::Fail(kind) => {
                    return Err(failure_error(kind, result, attempt + 1));
                }
            }
        }
    }

    /// Single rate-limited GET with no retry and no status interpretation
    pub async fn get_once(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
        self.rate_limiter.acquire().await;
        debug!("GET {} (single attempt)", request.url);
        let result = self.transport.get(request).await;
        metrics::record_request(result.as_ref().ok().map(|r| r.status));
        result
    }
}

fn failure_error(
    kind: FailureKind,
    result: Result<HttpResponse, TransportError>,
    attempts: u32,
) -> FetcherError {
    match result {
        Ok(response) => {
            let mut body = response.text();
            if body.len() > ERROR_BODY_EXCERPT {
                let mut cut = ERROR_BODY_EXCERPT;
                while !body.is_char_boundary(cut) {
                    cut -= 1;
                }
                body.truncate(cut);
            }
            FetcherError::RequestFailed {
                status: response.status,
                message: format!(
                    "{} after {attempts} attempt(s): {}",
                    kind.description(),
                    body.trim()
                ),
            }
        }
        Err(err) => FetcherError::TransportFailed(format!("{err} (after {attempts} attempt(s))")),
    }
}
