//! Bounded-concurrency enrichment of diary records
//!
//! At most `max_concurrency` films are in flight. Each film's four documents
//! are fetched concurrently and merged into the record once all four have
//! settled. Failures only leave fields absent; the batch always completes.

#![allow(clippy::uninlined_format_args)]

use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::future::join_all;
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use super::detail_fetcher::{DetailFetcher, DocumentOutcome};
use crate::domain::{DiaryRecord, DocumentKind, FilmPath};
use crate::infrastructure::parsing::FieldExtractor;

/// Outcome counts and cumulative per-film timings for one batch
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnrichmentStats {
    /// Films whose profile or crew document was fetched
    pub succeeded: usize,
    pub failed: usize,
    /// Films without a path
    pub skipped: usize,
    /// Films never started because the run was cancelled
    pub cancelled: usize,
    pub fetch_time: Duration,
    pub parse_time: Duration,
}

enum FilmOutcome {
    Skipped,
    NotStarted,
    Enriched {
        success: bool,
        fetch_time: Duration,
        parse_time: Duration,
    },
}

/// Enriches diary records through a [`DetailFetcher`] and a [`FieldExtractor`]
pub struct EnrichmentCoordinator {
    fetcher: DetailFetcher,
    extractor: Arc<dyn FieldExtractor>,
    base_url: String,
    max_concurrency: usize,
}

impl EnrichmentCoordinator {
    pub fn new(
        fetcher: DetailFetcher,
        extractor: Arc<dyn FieldExtractor>,
        base_url: impl Into<String>,
        max_concurrency: usize,
    ) -> Self {
        Self {
            fetcher,
            extractor,
            base_url: base_url.into(),
            max_concurrency: max_concurrency.max(1),
        }
    }

    pub fn max_concurrency(&self) -> usize {
        self.max_concurrency
    }

    /// Enrich every record in place.
    pub async fn enrich_all(&self, records: &mut [DiaryRecord], cancel: &CancellationToken) -> EnrichmentStats {
        let semaphore = Semaphore::new(self.max_concurrency);
        info!(
            "Enriching {} records with up to {} films in flight",
            records.len(),
            self.max_concurrency
        );

        let outcomes = join_all(
            records
                .iter_mut()
                .map(|record| self.enrich_one(record, &semaphore, cancel)),
        )
        .await;

        let mut stats = EnrichmentStats::default();
        for outcome in outcomes {
            match outcome {
                FilmOutcome::Skipped => stats.skipped += 1,
                FilmOutcome::NotStarted => stats.cancelled += 1,
                FilmOutcome::Enriched {
                    success,
                    fetch_time,
                    parse_time,
                } => {
                    if success {
                        stats.succeeded += 1;
                    } else {
                        stats.failed += 1;
                    }
                    stats.fetch_time += fetch_time;
                    stats.parse_time += parse_time;
                }
            }
        }

        info!(
            "Enrichment finished: {} succeeded, {} failed, {} skipped, {} cancelled",
            stats.succeeded, stats.failed, stats.skipped, stats.cancelled
        );
        stats
    }

    async fn enrich_one(
        &self,
        record: &mut DiaryRecord,
        semaphore: &Semaphore,
        cancel: &CancellationToken,
    ) -> FilmOutcome {
        let Some(path) = record.film_path.as_deref().and_then(FilmPath::normalize) else {
            debug!("No film path for '{}', skipping enrichment", record.title());
            return FilmOutcome::Skipped;
        };
        if cancel.is_cancelled() {
            return FilmOutcome::NotStarted;
        }

        let permit = tokio::select! {
            permit = semaphore.acquire() => match permit {
                Ok(permit) => permit,
                Err(_) => return FilmOutcome::NotStarted,
            },
            () = cancel.cancelled() => return FilmOutcome::NotStarted,
        };

        let [profile_url, crew_url, details_url, genres_url] =
            DocumentKind::ALL.map(|kind| path.document_url(&self.base_url, kind));
        let fetch_start = Instant::now();
        let (profile, crew, details, genres) = tokio::join!(
            self.fetcher.fetch_with_retry(&profile_url, cancel),
            self.fetcher.fetch_with_retry(&crew_url, cancel),
            self.fetcher.fetch_with_retry(&details_url, cancel),
            self.fetcher.fetch_with_retry(&genres_url, cancel),
        );
        let fetch_time = fetch_start.elapsed();
        drop(permit);

        let success = profile.is_fetched() || crew.is_fetched();
        let parse_start = Instant::now();
        let documents: [(DocumentKind, &DocumentOutcome); 4] = [
            (DocumentKind::Profile, &profile),
            (DocumentKind::Crew, &crew),
            (DocumentKind::Details, &details),
            (DocumentKind::Genres, &genres),
        ];
        for (kind, outcome) in documents {
            if let Some(body) = outcome.body() {
                record.enrichment.absorb(self.extractor.extract(kind, body));
            }
        }

        debug!(
            "Enriched {} (success: {}, fetch {:?})",
            path.as_str(),
            success,
            fetch_time
        );
        FilmOutcome::Enriched {
            success,
            fetch_time,
            parse_time: parse_start.elapsed(),
        }
    }
}
