//! Sequential diary pagination for one (user, year)
//!
//! Pages are fetched one at a time with a fixed delay in between. The walk
//! ends on the first empty page, on a configured cap, or on the first fetch
//! failure; pages collected before a failure are kept as the full result.

#![allow(clippy::uninlined_format_args)]

use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::sleep_or_cancel;
use crate::domain::DiaryRecord;
use crate::infrastructure::config::CrawlingSettings;
use crate::infrastructure::http_client::{PageSource, TransportError};
use crate::infrastructure::parsing::DiaryPageParser;

/// Why pagination ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    EmptyPage,
    PageCap,
    RecordCap,
    HttpStatus(u16),
    Transport,
    ParseFailed,
    Cancelled,
}

/// Counters and timings for one pagination run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaginationStats {
    /// Pages fetched successfully, including the terminating empty page
    pub pages_fetched: u32,
    pub fetch_time: Duration,
    pub parse_time: Duration,
    pub records_parsed: usize,
    pub stop_reason: StopReason,
}

impl PaginationStats {
    fn new() -> Self {
        Self {
            pages_fetched: 0,
            fetch_time: Duration::ZERO,
            parse_time: Duration::ZERO,
            records_parsed: 0,
            stop_reason: StopReason::EmptyPage,
        }
    }

    /// Fold another year's run into this one; the later stop reason wins.
    pub fn absorb(&mut self, other: &Self) {
        self.pages_fetched += other.pages_fetched;
        self.fetch_time += other.fetch_time;
        self.parse_time += other.parse_time;
        self.records_parsed += other.records_parsed;
        self.stop_reason = other.stop_reason;
    }
}

impl Default for PaginationStats {
    fn default() -> Self {
        Self::new()
    }
}

/// Walks a user's diary pages for one year
pub struct DiaryPaginator {
    source: Arc<dyn PageSource>,
    parser: Arc<dyn DiaryPageParser>,
    base_url: String,
    settings: CrawlingSettings,
}

impl DiaryPaginator {
    pub fn new(
        source: Arc<dyn PageSource>,
        parser: Arc<dyn DiaryPageParser>,
        base_url: impl Into<String>,
        settings: CrawlingSettings,
    ) -> Self {
        Self {
            source,
            parser,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            settings,
        }
    }

    /// `{base}/{user}/diary/films/for/{year}/`, with `page/{n}/` from page 2 on
    pub fn page_url(&self, user: &str, year: i32, page: u32) -> String {
        let first = format!("{}/{}/diary/films/for/{}/", self.base_url, user, year);
        if page <= 1 { first } else { format!("{first}page/{page}/") }
    }

    /// Fetch every diary page for `year`, in page order.
    pub async fn fetch_all_pages(
        &self,
        user: &str,
        year: i32,
        cancel: &CancellationToken,
    ) -> (Vec<DiaryRecord>, PaginationStats) {
        let mut records = Vec::new();
        let mut stats = PaginationStats::new();
        let mut page = 1;

        let stop_reason = loop {
            if self.settings.max_pages.is_some_and(|cap| stats.pages_fetched >= cap) {
                break StopReason::PageCap;
            }
            if page > 1 && !sleep_or_cancel(self.settings.page_delay(), cancel).await {
                break StopReason::Cancelled;
            }
            if cancel.is_cancelled() {
                break StopReason::Cancelled;
            }

            let url = self.page_url(user, year, page);
            let fetch_start = Instant::now();
            let response = self.source.fetch_page(&url, cancel).await;
            stats.fetch_time += fetch_start.elapsed();

            let body = match response {
                Ok(response) if response.is_success() => response.body,
                Ok(response) => {
                    warn!("Diary page {} returned HTTP {}", url, response.status);
                    break StopReason::HttpStatus(response.status);
                }
                Err(TransportError::Cancelled { .. }) => break StopReason::Cancelled,
                Err(e) => {
                    warn!("Failed to fetch diary page {}: {}", url, e);
                    break StopReason::Transport;
                }
            };
            stats.pages_fetched += 1;

            let parse_start = Instant::now();
            let parsed = self.parser.parse_page(&body);
            stats.parse_time += parse_start.elapsed();

            let page_records = match parsed {
                Ok(page_records) => page_records,
                Err(e) => {
                    warn!("Failed to parse diary page {}: {}", url, e);
                    break StopReason::ParseFailed;
                }
            };
            if page_records.is_empty() {
                debug!("Diary page {} is empty, stopping", page);
                break StopReason::EmptyPage;
            }

            stats.records_parsed += page_records.len();
            records.extend(page_records);
            debug!("Diary page {} for {} brought total to {}", page, year, records.len());

            if let Some(cap) = self.settings.max_records {
                if records.len() >= cap {
                    records.truncate(cap);
                    break StopReason::RecordCap;
                }
            }
            page += 1;
        };
        stats.stop_reason = stop_reason;

        info!(
            "Collected {} diary records for {} in {} from {} pages ({:?})",
            records.len(),
            user,
            year,
            stats.pages_fetched,
            stats.stop_reason
        );
        (records, stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::parsing::LetterboxdDiaryParser;
    use crate::test_utils::{DiaryRow, Scripted, ScriptedPageSource, diary_page_html, empty_diary_page_html};

    const BASE: &str = "https://letterboxd.com/";

    fn row<'a>(name: &'a str, link: &'a str) -> DiaryRow<'a> {
        DiaryRow {
            name,
            link,
            date: "2024/02/10",
            half_stars: Some(8),
        }
    }

    fn settings() -> CrawlingSettings {
        CrawlingSettings {
            page_delay_ms: 0,
            ..CrawlingSettings::default()
        }
    }

    fn paginator(source: &Arc<ScriptedPageSource>, settings: CrawlingSettings) -> DiaryPaginator {
        DiaryPaginator::new(
            source.clone(),
            Arc::new(LetterboxdDiaryParser::new().unwrap()),
            BASE,
            settings,
        )
    }

    fn script_pages(source: &ScriptedPageSource, paginator: &DiaryPaginator, pages: &[String]) {
        for (index, html) in pages.iter().enumerate() {
            let url = paginator.page_url("dave", 2024, index as u32 + 1);
            source.always(&url, Scripted::ok(html.clone()));
        }
    }

    #[test]
    fn builds_page_urls() {
        let source = Arc::new(ScriptedPageSource::new());
        let paginator = paginator(&source, settings());

        assert_eq!(
            paginator.page_url("dave", 2024, 1),
            "https://letterboxd.com/dave/diary/films/for/2024/"
        );
        assert_eq!(
            paginator.page_url("dave", 2024, 3),
            "https://letterboxd.com/dave/diary/films/for/2024/page/3/"
        );
    }

    #[tokio::test]
    async fn stops_at_first_empty_page() {
        let source = Arc::new(ScriptedPageSource::new());
        let paginator = paginator(&source, settings());
        script_pages(
            &source,
            &paginator,
            &[
                diary_page_html(&[row("Heat (1995)", "/film/heat-1995/"), row("Alien (1979)", "/film/alien/")]),
                diary_page_html(&[row("Heat (1995)", "/film/heat-1995/")]),
                empty_diary_page_html(),
            ],
        );

        let (records, stats) = paginator.fetch_all_pages("dave", 2024, &CancellationToken::new()).await;

        let titles: Vec<&str> = records.iter().map(DiaryRecord::title).collect();
        assert_eq!(titles, vec!["Heat", "Alien", "Heat"]);
        assert_eq!(stats.pages_fetched, 3);
        assert_eq!(stats.records_parsed, 3);
        assert_eq!(stats.stop_reason, StopReason::EmptyPage);
    }

    #[tokio::test]
    async fn http_error_keeps_earlier_pages() {
        let source = Arc::new(ScriptedPageSource::new());
        let paginator = paginator(&source, settings());
        script_pages(&source, &paginator, &[diary_page_html(&[row("Heat (1995)", "/film/heat-1995/")])]);

        let (records, stats) = paginator.fetch_all_pages("dave", 2024, &CancellationToken::new()).await;

        assert_eq!(records.len(), 1);
        assert_eq!(stats.stop_reason, StopReason::HttpStatus(404));
        assert_eq!(source.requests().len(), 2);
    }

    #[tokio::test]
    async fn transport_failure_is_not_retried() {
        let source = Arc::new(ScriptedPageSource::new());
        let paginator = paginator(&source, settings());
        let url = paginator.page_url("dave", 2024, 1);
        source.always(&url, Scripted::timeout(&url));

        let (records, stats) = paginator.fetch_all_pages("dave", 2024, &CancellationToken::new()).await;

        assert!(records.is_empty());
        assert_eq!(stats.stop_reason, StopReason::Transport);
        assert_eq!(source.request_count(&url), 1);
    }

    #[tokio::test]
    async fn record_cap_truncates_exactly() {
        let source = Arc::new(ScriptedPageSource::new());
        let paginator = paginator(
            &source,
            CrawlingSettings {
                max_records: Some(3),
                ..settings()
            },
        );
        let page = diary_page_html(&[
            row("A (2001)", "/film/a/"),
            row("B (2002)", "/film/b/"),
        ]);
        script_pages(&source, &paginator, &[page.clone(), page.clone(), page]);

        let (records, stats) = paginator.fetch_all_pages("dave", 2024, &CancellationToken::new()).await;

        assert_eq!(records.len(), 3);
        assert_eq!(stats.stop_reason, StopReason::RecordCap);
        assert_eq!(stats.pages_fetched, 2);
    }

    #[tokio::test]
    async fn page_cap_stops_before_next_fetch() {
        let source = Arc::new(ScriptedPageSource::new());
        let paginator = paginator(
            &source,
            CrawlingSettings {
                max_pages: Some(1),
                ..settings()
            },
        );
        let page = diary_page_html(&[row("A (2001)", "/film/a/")]);
        script_pages(&source, &paginator, &[page.clone(), page]);

        let (records, stats) = paginator.fetch_all_pages("dave", 2024, &CancellationToken::new()).await;

        assert_eq!(records.len(), 1);
        assert_eq!(stats.stop_reason, StopReason::PageCap);
        assert_eq!(source.requests().len(), 1);
    }

    #[tokio::test]
    async fn cancelled_token_fetches_nothing() {
        let source = Arc::new(ScriptedPageSource::new());
        let paginator = paginator(&source, settings());
        let token = CancellationToken::new();
        token.cancel();

        let (records, stats) = paginator.fetch_all_pages("dave", 2024, &token).await;

        assert!(records.is_empty());
        assert_eq!(stats.stop_reason, StopReason::Cancelled);
        assert!(source.requests().is_empty());
    }

    #[test]
    fn absorbing_sums_counters() {
        let mut total = PaginationStats::default();
        total.absorb(&PaginationStats {
            pages_fetched: 2,
            records_parsed: 5,
            stop_reason: StopReason::EmptyPage,
            ..PaginationStats::default()
        });
        total.absorb(&PaginationStats {
            pages_fetched: 1,
            records_parsed: 0,
            stop_reason: StopReason::HttpStatus(404),
            ..PaginationStats::default()
        });

        assert_eq!(total.pages_fetched, 3);
        assert_eq!(total.records_parsed, 5);
        assert_eq!(total.stop_reason, StopReason::HttpStatus(404));
    }
}
