//! Request orchestration: pagination, enrichment, aggregation, report
//!
//! Single-year requests paginate one year. All-years requests walk back
//! from the current year to the configured lower bound and enrich the
//! combined record set once.

#![allow(clippy::uninlined_format_args)]

use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use chrono::Datelike;
use tokio_util::sync::CancellationToken;
use tracing::{Instrument, info, info_span, warn};
use uuid::Uuid;

use super::report::{RunTiming, ScrapeReport, StageDurations};
use crate::crawling::{DetailFetcher, DiaryPaginator, EnrichmentCoordinator, PaginationStats, RetryPolicy};
use crate::domain::{DiaryRecord, ScrapeRequest, YearSelector};
use crate::infrastructure::config::{AllYearsPolicy, AppConfig, CrawlingSettings};
use crate::infrastructure::http_client::{HttpClient, HttpClientConfig, PageSource};
use crate::infrastructure::parsing::{LetterboxdDiaryParser, LetterboxdFilmParser, ParsingConfig};
use crate::stats::AggregationEngine;

const NO_FILMS_FOR_YEAR: &str = "No films found. Please check your username and year.";
const NO_FILMS_FOR_ANY_YEAR: &str = "No films found for any year.";

/// Records collected by pagination, before enrichment
struct Collected {
    records: Vec<DiaryRecord>,
    pagination: PaginationStats,
    year_label: String,
}

/// A request that found no diary entries at all
struct NoFilms {
    pagination: PaginationStats,
    year_label: String,
    reason: &'static str,
}

/// Runs one request end to end
pub struct ScrapeService {
    paginator: DiaryPaginator,
    enricher: EnrichmentCoordinator,
    engine: AggregationEngine,
    crawling: CrawlingSettings,
    current_year: i32,
}

impl ScrapeService {
    pub fn new(
        paginator: DiaryPaginator,
        enricher: EnrichmentCoordinator,
        engine: AggregationEngine,
        crawling: CrawlingSettings,
    ) -> Self {
        Self {
            paginator,
            enricher,
            engine,
            crawling,
            current_year: chrono::Local::now().year(),
        }
    }

    /// Build the production service: reqwest transport plus the Letterboxd parsers.
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let client_config = HttpClientConfig::from_settings(&config.http, config.enrichment.max_concurrency);
        let client = HttpClient::new(client_config)?;
        Self::with_source(config, Arc::new(client))
    }

    /// Build the service on top of any [`PageSource`].
    pub fn with_source(config: &AppConfig, source: Arc<dyn PageSource>) -> Result<Self> {
        let parsing = ParsingConfig::default();
        let diary_parser =
            LetterboxdDiaryParser::with_config(&parsing.diary).context("Failed to build diary parser")?;
        let film_parser = LetterboxdFilmParser::with_config(&parsing.film).context("Failed to build film parser")?;

        let paginator = DiaryPaginator::new(
            source.clone(),
            Arc::new(diary_parser),
            config.http.base_url.clone(),
            config.crawling.clone(),
        );
        let enricher = EnrichmentCoordinator::new(
            DetailFetcher::new(source, RetryPolicy::from_settings(&config.enrichment)),
            Arc::new(film_parser),
            config.http.base_url.clone(),
            config.enrichment.max_concurrency,
        );

        Ok(Self::new(
            paginator,
            enricher,
            AggregationEngine::new(config.stats.clone()),
            config.crawling.clone(),
        ))
    }

    /// Treat `year` as the current calendar year for all-years runs.
    pub fn with_current_year(mut self, year: i32) -> Self {
        self.current_year = year;
        self
    }

    /// Run `request` to completion. Failures are reported, not returned.
    pub async fn run(&self, request: &ScrapeRequest, cancel: &CancellationToken) -> ScrapeReport {
        let span = info_span!(
            "scrape",
            run_id = %Uuid::new_v4(),
            username = request.username(),
            year = %request.year,
        );
        self.run_inner(request, cancel).instrument(span).await
    }

    async fn run_inner(&self, request: &ScrapeRequest, cancel: &CancellationToken) -> ScrapeReport {
        let total_start = Instant::now();
        let mut stages = StageDurations::default();
        info!("Starting scrape");

        let scrape_start = Instant::now();
        let collected = match request.year {
            YearSelector::Single(year) => self.collect_single(request.username(), year, cancel).await,
            YearSelector::AllYears => self.collect_all_years(request.username(), cancel).await,
        };
        stages.scraping = scrape_start.elapsed();

        let Collected {
            mut records,
            pagination,
            year_label,
        } = match collected {
            Ok(collected) => collected,
            Err(NoFilms {
                pagination,
                year_label,
                reason,
            }) => {
                warn!("{}", reason);
                let timing = RunTiming::from_stages(total_start.elapsed(), stages, &pagination, None);
                return ScrapeReport::failure(request.username(), year_label, reason, timing);
            }
        };

        let enrich_start = Instant::now();
        let enrichment = self.enricher.enrich_all(&mut records, cancel).await;
        stages.enrichment = enrich_start.elapsed();

        let stats_start = Instant::now();
        let statistics = self.engine.aggregate(&records);
        stages.statistics = stats_start.elapsed();

        let timing = RunTiming::from_stages(
            total_start.elapsed(),
            stages,
            &pagination,
            Some((&enrichment, records.len())),
        );
        info!(
            "Scrape finished in {:.2}s: {} films, {} unique",
            timing.total_time, statistics.total_films, statistics.unique_films
        );
        ScrapeReport::success(request.username(), year_label, timing, statistics, records)
    }

    async fn collect_single(
        &self,
        username: &str,
        year: i32,
        cancel: &CancellationToken,
    ) -> Result<Collected, NoFilms> {
        let (records, pagination) = self.paginator.fetch_all_pages(username, year, cancel).await;
        if records.is_empty() {
            return Err(NoFilms {
                pagination,
                year_label: year.to_string(),
                reason: NO_FILMS_FOR_YEAR,
            });
        }
        Ok(Collected {
            records,
            pagination,
            year_label: year.to_string(),
        })
    }

    async fn collect_all_years(
        &self,
        username: &str,
        cancel: &CancellationToken,
    ) -> Result<Collected, NoFilms> {
        let mut records = Vec::new();
        let mut pagination = PaginationStats::default();
        let mut years_scraped = Vec::new();

        let lower_bound = self.crawling.year_lower_bound;
        for year in (lower_bound..=self.current_year).rev() {
            if cancel.is_cancelled() {
                info!("All-years walk cancelled before {}", year);
                break;
            }

            let (year_records, year_stats) = self.paginator.fetch_all_pages(username, year, cancel).await;
            pagination.absorb(&year_stats);

            if year_records.is_empty() {
                match self.crawling.all_years_policy {
                    AllYearsPolicy::StopAtFirstEmpty => {
                        info!("No diary entries in {}, stopping", year);
                        break;
                    }
                    AllYearsPolicy::ScanToLowerBound => continue,
                }
            }
            records.extend(year_records);
            years_scraped.push(year);
        }

        let (Some(newest), Some(oldest)) = (years_scraped.first(), years_scraped.last()) else {
            return Err(NoFilms {
                pagination,
                year_label: "ALL".to_string(),
                reason: NO_FILMS_FOR_ANY_YEAR,
            });
        };
        info!("Collected {} records across {} years", records.len(), years_scraped.len());
        Ok(Collected {
            records,
            pagination,
            year_label: format!("ALL ({}-{})", oldest, newest),
        })
    }
}
