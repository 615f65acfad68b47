//! Logging system configuration and initialization
//!
//! Console output goes to stderr so stdout stays free for the JSON report.
//! File output rolls daily under the configured (or platform default) log
//! directory. `RUST_LOG` replaces the configured filter entirely when set.

#![allow(clippy::uninlined_format_args)]

use std::path::PathBuf;

use anyhow::{Context, Result, anyhow};
use chrono::Local;
use once_cell::sync::OnceCell;
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::{non_blocking, rolling};
use tracing_subscriber::fmt::{self, time::FormatTime};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, Registry};

pub use crate::infrastructure::config::LoggingConfig;

const LOG_FILE_PREFIX: &str = "film-diary-stats.log";

// Keeps the non-blocking file writer alive for the whole process
static FILE_GUARD: OnceCell<WorkerGuard> = OnceCell::new();

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

struct LocalTimeFormatter;

impl FormatTime for LocalTimeFormatter {
    fn format_time(&self, w: &mut fmt::format::Writer<'_>) -> std::fmt::Result {
        write!(w, "{}", Local::now().format("%Y-%m-%d %H:%M:%S%.3f"))
    }
}

/// Directory log files are written to when none is configured
pub fn default_log_directory() -> PathBuf {
    dirs::data_local_dir()
        .or_else(|| std::env::current_dir().ok())
        .unwrap_or_default()
        .join("film-diary-stats")
        .join("logs")
}

/// Build the level filter from the config, or from `env_override`
/// (the contents of `RUST_LOG`) when one is given.
pub fn build_filter(config: &LoggingConfig, env_override: Option<&str>) -> Result<EnvFilter> {
    if let Some(directives) = env_override.filter(|value| !value.trim().is_empty()) {
        return EnvFilter::try_new(directives).map_err(|e| anyhow!("Invalid RUST_LOG value: {}", e));
    }

    let mut filter = EnvFilter::try_new(&config.level)
        .map_err(|e| anyhow!("Invalid log level '{}': {}", config.level, e))?;

    let mut modules: Vec<(&String, &String)> = config.module_filters.iter().collect();
    modules.sort();
    for (module, level) in modules {
        let directive = format!("{}={}", module, level)
            .parse()
            .map_err(|e| anyhow!("Invalid module filter {}={}: {}", module, level, e))?;
        filter = filter.add_directive(directive);
    }

    let own = format!("film_diary_stats={}", config.level)
        .parse()
        .map_err(|e| anyhow!("Invalid log level '{}': {}", config.level, e))?;
    Ok(filter.add_directive(own))
}

fn console_layer(json: bool) -> BoxedLayer {
    let layer = fmt::Layer::new()
        .with_writer(std::io::stderr)
        .with_timer(LocalTimeFormatter)
        .with_target(false);
    if json { layer.json().boxed() } else { layer.boxed() }
}

fn file_layer(config: &LoggingConfig) -> Result<(BoxedLayer, PathBuf)> {
    let log_dir = config.log_dir.clone().unwrap_or_else(default_log_directory);
    std::fs::create_dir_all(&log_dir)
        .with_context(|| format!("Failed to create log directory {:?}", log_dir))?;

    let (writer, guard) = non_blocking(rolling::daily(&log_dir, LOG_FILE_PREFIX));
    if FILE_GUARD.set(guard).is_err() {
        return Err(anyhow!("File logging already initialized"));
    }

    let layer = fmt::Layer::new()
        .with_writer(writer)
        .with_timer(LocalTimeFormatter)
        .with_ansi(false)
        .with_target(true);
    let layer = if config.json_format {
        layer.json().with_thread_ids(true).boxed()
    } else {
        layer.boxed()
    };
    Ok((layer, log_dir))
}

/// Install the global subscriber described by `config`.
pub fn init_logging(config: &LoggingConfig) -> Result<()> {
    let env_override = std::env::var("RUST_LOG").ok();
    let filter = build_filter(config, env_override.as_deref())?;

    let mut layers: Vec<BoxedLayer> = Vec::new();
    if config.console_output {
        layers.push(console_layer(config.json_format));
    }
    let log_dir = if config.file_output {
        let (layer, dir) = file_layer(config)?;
        layers.push(layer);
        Some(dir)
    } else {
        None
    };

    tracing_subscriber::registry()
        .with(layers)
        .with(filter)
        .try_init()
        .map_err(|e| anyhow!("Failed to install tracing subscriber: {}", e))?;

    info!("Logging initialized (level: {}, json: {})", config.level, config.json_format);
    if let Some(dir) = log_dir {
        info!("Log directory: {:?}", dir);
    }
    Ok(())
}
