//! Report returned for one scrape request
//!
//! A successful report flattens the aggregated statistics into the top
//! level next to the request echo, timing and raw per-record data. A failed
//! report carries only the reason and the timing gathered so far.

use std::time::{Duration, Instant};

use serde::Serialize;

use crate::crawling::{EnrichmentStats, PaginationStats};
use crate::domain::DiaryRecord;
use crate::stats::{AggregationEngine, DiaryStatistics};
use crate::stats::summary::round_to;

/// Per-stage counters behind [`RunTiming`]
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TimingBreakdown {
    pub pages_fetched: u32,
    pub pages_fetch_time: f64,
    pub pages_parse_time: f64,
    pub films_scraped: usize,
    pub films_enriched: usize,
    pub enrich_succeeded: usize,
    pub enrich_failed: usize,
    pub enrich_fetch_time: f64,
    pub enrich_parse_time: f64,
}

/// Wall-clock stage durations in seconds, rounded to 2 places
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RunTiming {
    pub total_time: f64,
    pub scraping_pages_time: f64,
    pub enrichment_time: f64,
    pub stats_calculation_time: f64,
    pub breakdown: TimingBreakdown,
}

/// Raw stage durations collected while a request runs
#[derive(Debug, Clone, Copy, Default)]
pub struct StageDurations {
    pub scraping: Duration,
    pub enrichment: Duration,
    pub statistics: Duration,
}

fn seconds(duration: Duration) -> f64 {
    round_to(duration.as_secs_f64(), 2)
}

impl RunTiming {
    /// Merge the stage results into the reported timing.
    ///
    /// `films_enriched` is the number of records handed to enrichment,
    /// whatever their individual outcome.
    pub fn from_stages(
        total: Duration,
        stages: StageDurations,
        pagination: &PaginationStats,
        enrichment: Option<(&EnrichmentStats, usize)>,
    ) -> Self {
        let mut breakdown = TimingBreakdown {
            pages_fetched: pagination.pages_fetched,
            pages_fetch_time: seconds(pagination.fetch_time),
            pages_parse_time: seconds(pagination.parse_time),
            films_scraped: pagination.records_parsed,
            ..TimingBreakdown::default()
        };
        if let Some((stats, films_enriched)) = enrichment {
            breakdown.films_enriched = films_enriched;
            breakdown.enrich_succeeded = stats.succeeded;
            breakdown.enrich_failed = stats.failed;
            breakdown.enrich_fetch_time = seconds(stats.fetch_time);
            breakdown.enrich_parse_time = seconds(stats.parse_time);
        }

        Self {
            total_time: seconds(total),
            scraping_pages_time: seconds(stages.scraping),
            enrichment_time: seconds(stages.enrichment),
            stats_calculation_time: seconds(stages.statistics),
            breakdown,
        }
    }
}

/// Outcome of one request
#[derive(Debug, Clone, Serialize)]
pub struct ScrapeReport {
    pub success: bool,
    pub username: String,
    /// `"2024"`, or `"ALL (2019-2024)"` for all-years runs
    pub year: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub timing: RunTiming,
    #[serde(flatten)]
    pub statistics: Option<DiaryStatistics>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub raw_data: Vec<DiaryRecord>,
}

impl ScrapeReport {
    pub fn success(
        username: impl Into<String>,
        year: impl Into<String>,
        timing: RunTiming,
        statistics: DiaryStatistics,
        raw_data: Vec<DiaryRecord>,
    ) -> Self {
        Self {
            success: true,
            username: username.into(),
            year: year.into(),
            error: None,
            timing,
            statistics: Some(statistics),
            raw_data,
        }
    }

    pub fn failure(
        username: impl Into<String>,
        year: impl Into<String>,
        error: impl Into<String>,
        timing: RunTiming,
    ) -> Self {
        Self {
            success: false,
            username: username.into(),
            year: year.into(),
            error: Some(error.into()),
            timing,
            statistics: None,
            raw_data: Vec::new(),
        }
    }

    /// Aggregate records collected elsewhere, such as a re-imported CSV export.
    pub fn from_records(
        engine: &AggregationEngine,
        username: impl Into<String>,
        year: impl Into<String>,
        records: Vec<DiaryRecord>,
    ) -> Self {
        let start = Instant::now();
        if records.is_empty() {
            return Self::failure(username, year, "No films found in the imported records.", RunTiming::default());
        }
        let statistics = engine.aggregate(&records);
        let elapsed = seconds(start.elapsed());
        let timing = RunTiming {
            total_time: elapsed,
            stats_calculation_time: elapsed,
            ..RunTiming::default()
        };
        Self::success(username, year, timing, statistics, records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crawling::StopReason;

    fn pagination() -> PaginationStats {
        PaginationStats {
            pages_fetched: 3,
            fetch_time: Duration::from_millis(1234),
            parse_time: Duration::from_millis(56),
            records_parsed: 42,
            stop_reason: StopReason::EmptyPage,
        }
    }

    #[test]
    fn timing_is_rounded_to_hundredths() {
        let enrichment = EnrichmentStats {
            succeeded: 40,
            failed: 2,
            fetch_time: Duration::from_millis(98_770),
            ..EnrichmentStats::default()
        };
        let timing = RunTiming::from_stages(
            Duration::from_millis(10_456),
            StageDurations {
                scraping: Duration::from_millis(2_004),
                enrichment: Duration::from_millis(8_001),
                statistics: Duration::from_millis(3),
            },
            &pagination(),
            Some((&enrichment, 42)),
        );

        assert_eq!(timing.total_time, 10.46);
        assert_eq!(timing.scraping_pages_time, 2.0);
        assert_eq!(timing.stats_calculation_time, 0.0);
        assert_eq!(timing.breakdown.pages_fetch_time, 1.23);
        assert_eq!(timing.breakdown.films_scraped, 42);
        assert_eq!(timing.breakdown.enrich_succeeded, 40);
        assert_eq!(timing.breakdown.enrich_fetch_time, 98.77);
    }

    #[test]
    fn failure_report_serializes_without_statistics() {
        let timing = RunTiming::from_stages(Duration::from_secs(1), StageDurations::default(), &pagination(), None);
        let report = ScrapeReport::failure("dave", "2024", "No films found.", timing);
        let json = serde_json::to_value(&report).unwrap();

        assert_eq!(json["success"], false);
        assert_eq!(json["error"], "No films found.");
        assert_eq!(json["timing"]["breakdown"]["pages_fetched"], 3);
        assert!(json.get("total_films").is_none());
        assert!(json.get("raw_data").is_none());
    }

    #[test]
    fn imported_records_are_aggregated() {
        let records = vec![
            DiaryRecord::new("Heat").unwrap().with_rating(4.5),
            DiaryRecord::new("Heat").unwrap().with_rating(4.0),
        ];
        let report = ScrapeReport::from_records(&AggregationEngine::default(), "dave", "CSV", records);

        assert!(report.success);
        assert_eq!(report.raw_data.len(), 2);
        let statistics = report.statistics.unwrap();
        assert_eq!(statistics.total_films, 2);
        assert_eq!(statistics.unique_films, 1);
        assert_eq!(report.timing.breakdown.pages_fetched, 0);

        let empty = ScrapeReport::from_records(&AggregationEngine::default(), "dave", "CSV", Vec::new());
        assert!(!empty.success);
    }
}
