//! Per-document fetch with status-aware retry
//!
//! A document that cannot be fetched is never an error: after the retry
//! budget is spent (or on a status that will not improve) the outcome is
//! [`DocumentOutcome::Missing`] and the record keeps its fields absent.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use super::sleep_or_cancel;
use crate::infrastructure::config::EnrichmentSettings;
use crate::infrastructure::http_client::{PageSource, TransportError};

/// Attempt budget and backoff units for detail documents
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    pub attempts: u32,
    /// Multiplied by the attempt number after a 429
    pub rate_limit_backoff: Duration,
    pub server_error_backoff: Duration,
    pub timeout_backoff: Duration,
    pub transport_backoff: Duration,
}

impl RetryPolicy {
    pub fn from_settings(settings: &EnrichmentSettings) -> Self {
        Self {
            attempts: settings.retry_attempts.max(1),
            rate_limit_backoff: Duration::from_millis(settings.rate_limit_backoff_ms),
            server_error_backoff: Duration::from_millis(settings.server_error_backoff_ms),
            timeout_backoff: Duration::from_millis(settings.timeout_backoff_ms),
            transport_backoff: Duration::from_millis(settings.transport_backoff_ms),
        }
    }

    /// Delay before retrying after `failure` on the 1-based `attempt`.
    pub fn backoff(&self, failure: &AttemptFailure, attempt: u32) -> Duration {
        match failure {
            AttemptFailure::RateLimited => self.rate_limit_backoff * attempt,
            AttemptFailure::ServerError(_) => self.server_error_backoff,
            AttemptFailure::Timeout => self.timeout_backoff,
            AttemptFailure::Transport(_) => self.transport_backoff,
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_settings(&EnrichmentSettings::default())
    }
}

/// A failed attempt that is worth retrying
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttemptFailure {
    RateLimited,
    ServerError(u16),
    Timeout,
    Transport(String),
}

impl fmt::Display for AttemptFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RateLimited => write!(f, "HTTP 429"),
            Self::ServerError(status) => write!(f, "HTTP {status}"),
            Self::Timeout => write!(f, "timeout"),
            Self::Transport(message) => write!(f, "{message}"),
        }
    }
}

/// Why a document ended up absent
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MissingReason {
    /// A non-retryable status such as 404
    Status(u16),
    RetriesExhausted { attempts: u32, last: AttemptFailure },
    Cancelled,
}

/// Result of fetching one document
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocumentOutcome {
    Fetched(String),
    Missing(MissingReason),
}

impl DocumentOutcome {
    pub fn body(&self) -> Option<&str> {
        match self {
            Self::Fetched(body) => Some(body),
            Self::Missing(_) => None,
        }
    }

    pub fn is_fetched(&self) -> bool {
        matches!(self, Self::Fetched(_))
    }
}

/// Fetches detail documents through a [`PageSource`] under a [`RetryPolicy`]
#[derive(Clone)]
pub struct DetailFetcher {
    source: Arc<dyn PageSource>,
    policy: RetryPolicy,
}

impl DetailFetcher {
    pub fn new(source: Arc<dyn PageSource>, policy: RetryPolicy) -> Self {
        Self { source, policy }
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Fetch `url`, retrying 429, 5xx and transport failures.
    pub async fn fetch_with_retry(&self, url: &str, cancel: &CancellationToken) -> DocumentOutcome {
        let mut last_failure = AttemptFailure::Transport("no attempt made".to_string());

        for attempt in 1..=self.policy.attempts {
            if cancel.is_cancelled() {
                return DocumentOutcome::Missing(MissingReason::Cancelled);
            }

            let failure = match self.source.fetch_page(url, cancel).await {
                Ok(response) if response.is_success() => return DocumentOutcome::Fetched(response.body),
                Ok(response) if response.status == 429 => AttemptFailure::RateLimited,
                Ok(response) if response.status >= 500 => AttemptFailure::ServerError(response.status),
                Ok(response) => {
                    debug!("{} answered {}, not retrying", url, response.status);
                    return DocumentOutcome::Missing(MissingReason::Status(response.status));
                }
                Err(TransportError::Cancelled { .. }) => {
                    return DocumentOutcome::Missing(MissingReason::Cancelled);
                }
                Err(error) if error.is_timeout() => AttemptFailure::Timeout,
                Err(error) => AttemptFailure::Transport(error.to_string()),
            };

            if attempt < self.policy.attempts {
                let delay = self.policy.backoff(&failure, attempt);
                debug!(
                    "Attempt {}/{} for {} failed ({}), retrying in {:?}",
                    attempt, self.policy.attempts, url, failure, delay
                );
                if !sleep_or_cancel(delay, cancel).await {
                    return DocumentOutcome::Missing(MissingReason::Cancelled);
                }
            }
            last_failure = failure;
        }

        warn!(
            "Giving up on {} after {} attempts (last: {})",
            url, self.policy.attempts, last_failure
        );
        DocumentOutcome::Missing(MissingReason::RetriesExhausted {
            attempts: self.policy.attempts,
            last: last_failure,
        })
    }
}
