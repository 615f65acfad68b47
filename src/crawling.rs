//! Crawling stages: diary pagination, per-document fetch with retry and
//! bounded-concurrency enrichment
//!
//! Each stage returns its output together with a stats struct; the caller
//! merges those into the run timing. No stage shares counters with another.

use std::time::Duration;

use tokio_util::sync::CancellationToken;

pub mod detail_fetcher;
pub mod diary_paginator;
pub mod enrichment;

pub use detail_fetcher::{AttemptFailure, DetailFetcher, DocumentOutcome, MissingReason, RetryPolicy};
pub use diary_paginator::{DiaryPaginator, PaginationStats, StopReason};
pub use enrichment::{EnrichmentCoordinator, EnrichmentStats};

/// Sleep for `duration` unless `cancel` fires first.
///
/// Returns `false` when the sleep was cut short by cancellation.
pub(crate) async fn sleep_or_cancel(duration: Duration, cancel: &CancellationToken) -> bool {
    if duration.is_zero() {
        return !cancel.is_cancelled();
    }
    tokio::select! {
        () = tokio::time::sleep(duration) => true,
        () = cancel.cancelled() => false,
    }
}
