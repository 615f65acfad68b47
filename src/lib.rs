//! Film Diary Stats - Letterboxd diary crawler and statistics engine
//!
//! Walks a user's diary pages for one year (or every year), enriches each
//! logged film from its detail pages under bounded concurrency, and derives
//! rankings, rating variance, timelines and rewatch statistics from the
//! result.

// Module declarations
pub mod application;
pub mod cli;
pub mod crawling;
pub mod domain;
pub mod infrastructure;
pub mod stats;
pub mod test_utils;

pub use application::{ScrapeReport, ScrapeService};
pub use domain::{DiaryRecord, ScrapeRequest, YearSelector};
pub use stats::{AggregationEngine, DiaryStatistics};
