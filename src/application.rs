//! Application layer
//!
//! Orchestrates the crawling stages and the aggregation engine for one
//! request and shapes the result into a [`ScrapeReport`].

pub mod report;
pub mod scrape_service;

pub use report::{RunTiming, ScrapeReport, StageDurations, TimingBreakdown};
pub use scrape_service::ScrapeService;
