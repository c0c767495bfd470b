//! Retry classification and decision
//!
//! The retry loop is split into a pure step, `(attempt, outcome) -> decision`,
//! and the side effects (sleeping, logging) that the HTTP client performs.
//! Keeping the step pure lets the policy be tested without clocks.

use std::time::Duration;

use super::transport::{HttpResponse, TransportError};
use crate::downloader::config::{calculate_backoff, MAX_RETRIES, RETRY_DELAY};

/// Classification of a failed attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// HTTP 429
    RateLimit,
    /// HTTP 5xx
    ServerError(u16),
    /// HTTP 4xx other than 429
    ClientError(u16),
    /// Any other non-2xx status that reached us (1xx, unfollowed 3xx)
    UnexpectedStatus(u16),
    /// Request timed out
    NetworkTimeout,
    /// DNS failure or connection refused
    NetworkOffline,
    /// Other transport failure
    NetworkGeneric,
}

impl FailureKind {
    /// Short description used in retry log lines
    pub fn description(&self) -> &'static str {
        match self {
            Self::RateLimit => "rate limited (429)",
            Self::ServerError(code) => match code {
                500 => "internal server error",
                502 => "bad gateway",
                503 => "service unavailable",
                504 => "gateway timeout",
                _ => "server error",
            },
            Self::ClientError(code) => match code {
                401 | 403 => "authentication failed",
                404 => "resource not found",
                _ => "client error",
            },
            Self::UnexpectedStatus(_) => "unexpected status",
            Self::NetworkTimeout => "network timeout",
            Self::NetworkOffline => "connection failed",
            Self::NetworkGeneric => "network error",
        }
    }

    /// Label used for metrics
    pub fn metric_label(&self) -> &'static str {
        match self {
            Self::RateLimit => "rate_limit",
            Self::ServerError(_) => "server_error",
            Self::ClientError(_) => "client_error",
            Self::UnexpectedStatus(_) => "unexpected_status",
            Self::NetworkTimeout | Self::NetworkOffline | Self::NetworkGeneric => "transport",
        }
    }

    /// Whether the failure is transient and worth another attempt
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::RateLimit
                | Self::ServerError(_)
                | Self::NetworkTimeout
                | Self::NetworkOffline
                | Self::NetworkGeneric
        )
    }

    /// HTTP status behind the failure, if one was received
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::RateLimit => Some(429),
            Self::ServerError(code) | Self::ClientError(code) | Self::UnexpectedStatus(code) => {
                Some(*code)
            }
            _ => None,
        }
    }
}

/// Classify an HTTP status; `None` means success
pub fn classify_status(status: u16) -> Option<FailureKind> {
    match status {
        200..=299 => None,
        429 => Some(FailureKind::RateLimit),
        400..=499 => Some(FailureKind::ClientError(status)),
        s if s >= 500 => Some(FailureKind::ServerError(s)),
        s => Some(FailureKind::UnexpectedStatus(s)),
    }
}

/// Classify the result of one transport call; `None` means success
pub fn classify(result: &Result<HttpResponse, TransportError>) -> Option<FailureKind> {
    match result {
        Ok(response) => classify_status(response.status),
        Err(TransportError::Timeout(_)) => Some(FailureKind::NetworkTimeout),
        Err(TransportError::Connect(_)) => Some(FailureKind::NetworkOffline),
        Err(TransportError::Other(_)) => Some(FailureKind::NetworkGeneric),
    }
}

/// What to do after an attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    /// Hand the response to the caller
    Succeed,
    /// Sleep for the given delay, then try again
    Retry(Duration),
    /// Stop and surface the failure
    Fail(FailureKind),
    /// Budget spent on a transient failure: sleep the final backoff, then fail
    Exhausted(Duration, FailureKind),
}

/// Attempt budget and backoff base
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, initial one included
    pub max_attempts: u32,
    /// Delay before the second attempt; doubles each time after
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: MAX_RETRIES,
            base_delay: RETRY_DELAY,
        }
    }
}

impl RetryPolicy {
    /// Policy with the given attempt budget and base delay
    pub fn new(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay,
        }
    }

    /// Backoff after the 0-based attempt `attempt`
    pub fn backoff(&self, attempt: u32) -> Duration {
        calculate_backoff(self.base_delay, attempt)
    }

    /// Decide the next step after the 0-based attempt `attempt`
    ///
    /// Every transient failure backs off, the last one included, so a
    /// spent budget of three attempts fails after `base * (1 + 2 + 4)`.
    pub fn decide(&self, attempt: u32, outcome: Option<FailureKind>) -> RetryDecision {
        match outcome {
            None => RetryDecision::Succeed,
            Some(kind) if !kind.is_retryable() => RetryDecision::Fail(kind),
            Some(kind) if attempt + 1 < self.max_attempts => {
                RetryDecision::Retry(self.backoff(attempt))
            }
            Some(kind) => RetryDecision::Exhausted(self.backoff(attempt), kind),
        }
    }
}
