//! Configuration infrastructure
//!
//! Contains configuration loading and validation for diary runs.
//!
//! Configuration is layered:
//! 1. Built-in defaults (see [`defaults`])
//! 2. An optional TOML/JSON file
//! 3. `FILM_DIARY_STATS__SECTION__KEY` environment overrides

#![allow(clippy::uninlined_format_args)]
#![allow(missing_docs)]

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::Datelike;
use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use tracing::info;

use super::export::ExportFormat;

/// Prefix for environment overrides
pub const ENV_PREFIX: &str = "FILM_DIARY_STATS";

/// Complete application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub http: HttpSettings,
    pub crawling: CrawlingSettings,
    pub enrichment: EnrichmentSettings,
    pub stats: StatsConfig,
    pub export: ExportSettings,
    pub logging: LoggingConfig,
}

/// Transport settings shared by every fetch
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpSettings {
    /// Origin all diary and film URLs are built on
    pub base_url: String,

    pub user_agent: String,

    /// Per-request timeout in seconds
    pub request_timeout_seconds: u64,

    /// Optional global requests-per-second ceiling
    pub max_requests_per_second: Option<u32>,
}

/// How the all-years mode walks back through diary years
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AllYearsPolicy {
    /// Stop at the first year that yields no records
    StopAtFirstEmpty,
    /// Visit every year down to the lower bound, skipping empty ones
    ScanToLowerBound,
}

/// Diary pagination settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CrawlingSettings {
    /// Delay observed between successful diary page fetches
    pub page_delay_ms: u64,

    /// Hard cap on diary pages per year (None = unbounded)
    pub max_pages: Option<u32>,

    /// Hard cap on diary records per year (None = unbounded)
    pub max_records: Option<usize>,

    pub all_years_policy: AllYearsPolicy,

    /// Oldest year visited in all-years mode
    pub year_lower_bound: i32,
}

/// Detail enrichment settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EnrichmentSettings {
    /// Films enriched simultaneously
    pub max_concurrency: usize,

    /// Attempts per detail document
    pub retry_attempts: u32,

    /// Linear backoff unit after a 429
    pub rate_limit_backoff_ms: u64,

    /// Backoff after a 5xx response
    pub server_error_backoff_ms: u64,

    /// Backoff after a timed out request
    pub timeout_backoff_ms: u64,

    /// Backoff after any other transport failure
    pub transport_backoff_ms: u64,
}

/// Aggregation thresholds and result sizes
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StatsConfig {
    /// Entries per facet ranking and most-watched list
    pub top_n: usize,
    pub rewatch_top_n: usize,
    pub variance_top_n: usize,
    pub actor_index_limit: usize,
    pub overhyped_min_films: usize,
    pub underhyped_min_films: usize,
    pub favorite_decade_min_films: usize,
    /// 1-indexed positions reported as milestones
    pub milestone_positions: Vec<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportSettings {
    pub format: ExportFormat,

    /// Joiner used for list cells in CSV output
    pub list_separator: String,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// Emit JSON lines instead of human-readable output
    pub json_format: bool,

    /// Enable console output (stderr)
    pub console_output: bool,

    /// Enable daily-rolling file output
    pub file_output: bool,

    /// Directory for log files; defaults to the platform data dir
    pub log_dir: Option<PathBuf>,

    /// Module-specific log level filters (e.g., "reqwest": "info")
    pub module_filters: HashMap<String, String>,
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            base_url: defaults::BASE_URL.to_string(),
            user_agent: defaults::USER_AGENT.to_string(),
            request_timeout_seconds: defaults::REQUEST_TIMEOUT_SECONDS,
            max_requests_per_second: None,
        }
    }
}

impl Default for CrawlingSettings {
    fn default() -> Self {
        Self {
            page_delay_ms: defaults::PAGE_DELAY_MS,
            max_pages: None,
            max_records: None,
            all_years_policy: AllYearsPolicy::StopAtFirstEmpty,
            year_lower_bound: defaults::YEAR_LOWER_BOUND,
        }
    }
}

impl Default for EnrichmentSettings {
    fn default() -> Self {
        Self {
            max_concurrency: defaults::MAX_CONCURRENCY,
            retry_attempts: defaults::RETRY_ATTEMPTS,
            rate_limit_backoff_ms: defaults::RATE_LIMIT_BACKOFF_MS,
            server_error_backoff_ms: defaults::SERVER_ERROR_BACKOFF_MS,
            timeout_backoff_ms: defaults::TIMEOUT_BACKOFF_MS,
            transport_backoff_ms: defaults::TRANSPORT_BACKOFF_MS,
        }
    }
}

impl Default for StatsConfig {
    fn default() -> Self {
        Self {
            top_n: defaults::TOP_N,
            rewatch_top_n: defaults::REWATCH_TOP_N,
            variance_top_n: defaults::TOP_N,
            actor_index_limit: defaults::ACTOR_INDEX_LIMIT,
            overhyped_min_films: defaults::OVERHYPED_MIN_FILMS,
            underhyped_min_films: defaults::UNDERHYPED_MIN_FILMS,
            favorite_decade_min_films: defaults::FAVORITE_DECADE_MIN_FILMS,
            milestone_positions: defaults::MILESTONE_POSITIONS.to_vec(),
        }
    }
}

impl Default for ExportSettings {
    fn default() -> Self {
        Self {
            format: ExportFormat::Csv,
            list_separator: defaults::LIST_SEPARATOR.to_string(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: defaults::LOG_LEVEL.to_string(),
            json_format: false,
            console_output: true,
            file_output: false,
            log_dir: None,
            module_filters: {
                let mut filters = HashMap::new();
                filters.insert("reqwest".to_string(), "info".to_string());
                filters.insert("hyper".to_string(), "warn".to_string());
                filters.insert("html5ever".to_string(), "warn".to_string());
                filters.insert("selectors".to_string(), "warn".to_string());
                filters
            },
        }
    }
}

impl HttpSettings {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_seconds)
    }
}

impl CrawlingSettings {
    pub fn page_delay(&self) -> Duration {
        Duration::from_millis(self.page_delay_ms)
    }
}

impl AppConfig {
    /// Load defaults, then `path` (if any), then environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut builder = Config::builder();
        if let Some(path) = path {
            info!("Loading configuration from: {:?}", path);
            builder = builder.add_source(File::from(path));
        }
        builder = builder.add_source(
            Environment::with_prefix(ENV_PREFIX)
                .separator("__")
                .try_parsing(true),
        );

        let config: Self = builder.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Reject settings the pipeline cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if url::Url::parse(&self.http.base_url).is_err() {
            return Err(ConfigError::Message(format!(
                "http.base_url '{}' is not an absolute URL",
                self.http.base_url
            )));
        }
        if self.enrichment.max_concurrency == 0 {
            return Err(ConfigError::Message(
                "enrichment.max_concurrency must be at least 1".into(),
            ));
        }
        if self.enrichment.retry_attempts == 0 {
            return Err(ConfigError::Message(
                "enrichment.retry_attempts must be at least 1".into(),
            ));
        }
        if self.http.request_timeout_seconds == 0 {
            return Err(ConfigError::Message(
                "http.request_timeout_seconds must be at least 1".into(),
            ));
        }
        if self.http.max_requests_per_second == Some(0) {
            return Err(ConfigError::Message(
                "http.max_requests_per_second must be at least 1 when set".into(),
            ));
        }
        let current_year = chrono::Local::now().year();
        if self.crawling.year_lower_bound > current_year {
            return Err(ConfigError::Message(format!(
                "crawling.year_lower_bound ({}) is after the current year ({})",
                self.crawling.year_lower_bound, current_year
            )));
        }
        Ok(())
    }
}

/// Default configuration values
pub mod defaults {
    /// Origin for diary and film pages
    pub const BASE_URL: &str = "https://letterboxd.com";

    pub const USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7)";

    /// Default request timeout in seconds
    pub const REQUEST_TIMEOUT_SECONDS: u64 = 30;

    /// Default delay between diary pages in milliseconds
    pub const PAGE_DELAY_MS: u64 = 500;

    /// Oldest year visited in all-years mode
    pub const YEAR_LOWER_BOUND: i32 = 2000;

    /// Default number of films enriched at once
    pub const MAX_CONCURRENCY: usize = 25;

    /// Default attempts per detail document
    pub const RETRY_ATTEMPTS: u32 = 3;

    pub const RATE_LIMIT_BACKOFF_MS: u64 = 2000;
    pub const SERVER_ERROR_BACKOFF_MS: u64 = 1000;
    pub const TIMEOUT_BACKOFF_MS: u64 = 1000;
    pub const TRANSPORT_BACKOFF_MS: u64 = 500;

    pub const TOP_N: usize = 10;
    pub const REWATCH_TOP_N: usize = 3;
    pub const ACTOR_INDEX_LIMIT: usize = 50;
    pub const OVERHYPED_MIN_FILMS: usize = 1;
    pub const UNDERHYPED_MIN_FILMS: usize = 2;
    pub const FAVORITE_DECADE_MIN_FILMS: usize = 3;
    pub const MILESTONE_POSITIONS: [usize; 5] = [1, 50, 100, 250, 500];

    pub const LIST_SEPARATOR: &str = "; ";

    /// Default log level
    pub const LOG_LEVEL: &str = "info";
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_are_valid() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.enrichment.max_concurrency, 25);
        assert_eq!(config.crawling.page_delay(), Duration::from_millis(500));
        assert_eq!(config.stats.milestone_positions, vec![1, 50, 100, 250, 500]);
    }

    #[test]
    fn zero_concurrency_is_rejected() {
        let mut config = AppConfig::default();
        config.enrichment.max_concurrency = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn relative_base_url_is_rejected() {
        let mut config = AppConfig::default();
        config.http.base_url = "letterboxd.com".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn future_lower_bound_is_rejected() {
        let mut config = AppConfig::default();
        config.crawling.year_lower_bound = chrono::Local::now().year() + 1;
        assert!(config.validate().is_err());
    }

    #[test]
    fn file_values_override_defaults() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            "[enrichment]\nmax_concurrency = 5\n\n[crawling]\nall_years_policy = \"scan_to_lower_bound\"\n"
        )
        .unwrap();

        let config = AppConfig::load(Some(file.path())).unwrap();
        assert_eq!(config.enrichment.max_concurrency, 5);
        assert_eq!(config.crawling.all_years_policy, AllYearsPolicy::ScanToLowerBound);
        assert_eq!(config.enrichment.retry_attempts, defaults::RETRY_ATTEMPTS);
    }
}
