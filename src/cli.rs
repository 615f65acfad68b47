//! Command line arguments for the `film-diary-stats` binary

use std::path::PathBuf;

use clap::Parser;

use crate::domain::YearSelector;
use crate::infrastructure::config::AppConfig;
use crate::infrastructure::export::ExportFormat;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct CliArgs {
    /// Letterboxd username whose diary is read
    pub username: String,

    /// Diary year, or ALL to walk back through every year [default: current year]
    #[arg(short, long, value_name = "YYYY|ALL")]
    pub year: Option<YearSelector>,

    /// Path to configuration file (TOML or JSON)
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Write the full record set next to this path (extension is replaced)
    #[arg(short, long, value_name = "PATH")]
    pub export: Option<PathBuf>,

    /// Export format [default: from config]
    #[arg(short, long, value_enum)]
    pub format: Option<ExportFormat>,

    /// Films enriched at once [default: from config]
    #[arg(long, value_name = "N")]
    pub max_concurrency: Option<usize>,

    /// Log level (trace, debug, info, warn, error) [default: from config]
    #[arg(short = 'L', long, value_name = "LEVEL")]
    pub log_level: Option<String>,

    /// Recompute statistics from a previously exported CSV instead of scraping
    #[arg(long, value_name = "FILE", conflicts_with = "year")]
    pub from_csv: Option<PathBuf>,

    /// Pretty-print the JSON report
    #[arg(long)]
    pub pretty: bool,
}

impl CliArgs {
    pub fn validate(&self) -> Result<(), String> {
        if self.max_concurrency == Some(0) {
            return Err("--max-concurrency must be greater than 0".to_string());
        }
        if let Some(level) = &self.log_level {
            let valid_levels = ["trace", "debug", "info", "warn", "error"];
            if !valid_levels.contains(&level.to_lowercase().as_str()) {
                return Err(format!(
                    "Invalid log level '{}'. Valid levels are: {}",
                    level,
                    valid_levels.join(", ")
                ));
            }
        }
        Ok(())
    }

    /// Layer the command line overrides on top of the loaded configuration.
    pub fn apply_to(&self, config: &mut AppConfig) {
        if let Some(max_concurrency) = self.max_concurrency {
            config.enrichment.max_concurrency = max_concurrency;
        }
        if let Some(format) = self.format {
            config.export.format = format;
        }
        if let Some(level) = &self.log_level {
            config.logging.level = level.to_lowercase();
        }
    }
}
