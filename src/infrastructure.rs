//! Infrastructure layer: configuration, logging, HTTP, HTML parsing and export
//!
//! Everything that touches the network, the filesystem or the process
//! environment lives here behind the traits the crawling stages consume.

pub mod config;
pub mod export;
pub mod http_client;
pub mod logging;
pub mod parsing;

pub use config::{AllYearsPolicy, AppConfig, CrawlingSettings, EnrichmentSettings, HttpSettings, StatsConfig};
pub use export::{ExportError, ExportFormat, FileExporter, RecordExporter, read_csv};
pub use http_client::{HttpClient, HttpClientConfig, PageResponse, PageSource, TransportError};
pub use logging::init_logging;
pub use parsing::{
    DiaryPageParser, FieldExtractor, LetterboxdDiaryParser, LetterboxdFilmParser, ParsingConfig, ParsingError,
    ParsingResult,
};
