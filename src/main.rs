#![allow(missing_docs)]

use std::process::ExitCode;

use anyhow::{Result, anyhow};
use chrono::Datelike;
use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use film_diary_stats::cli::CliArgs;
use film_diary_stats::infrastructure::{AppConfig, FileExporter, RecordExporter, init_logging, read_csv};
use film_diary_stats::{AggregationEngine, ScrapeReport, ScrapeRequest, ScrapeService, YearSelector};

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<bool> {
    let args = CliArgs::parse();
    args.validate().map_err(|e| anyhow!(e))?;

    let mut config = AppConfig::load(args.config.as_deref())?;
    args.apply_to(&mut config);
    config.validate()?;
    init_logging(&config.logging)?;

    let report = match &args.from_csv {
        Some(path) => {
            let separator = config.export.list_separator.trim().chars().next().unwrap_or(';');
            let records = read_csv(path, separator)?;
            info!("Loaded {} records from {:?}", records.len(), path);
            ScrapeReport::from_records(&AggregationEngine::new(config.stats.clone()), &args.username, "CSV", records)
        }
        None => scrape(&args, &config).await?,
    };

    if let Some(path) = &args.export {
        if report.success {
            let exporter = FileExporter::new(path, config.export.list_separator.clone());
            exporter.export(&report.raw_data, config.export.format)?;
        } else {
            warn!("Nothing to export: {}", report.error.as_deref().unwrap_or("run failed"));
        }
    }

    let json = if args.pretty {
        serde_json::to_string_pretty(&report)?
    } else {
        serde_json::to_string(&report)?
    };
    println!("{json}");
    Ok(report.success)
}

async fn scrape(args: &CliArgs, config: &AppConfig) -> Result<ScrapeReport> {
    let year = args
        .year
        .unwrap_or_else(|| YearSelector::Single(chrono::Local::now().year()));
    let request = ScrapeRequest::new(args.username.as_str(), year)?;
    let service = ScrapeService::from_config(config)?;

    let cancel = CancellationToken::new();
    let watcher = tokio::spawn({
        let cancel = cancel.clone();
        async move {
            match tokio::signal::ctrl_c().await {
                Ok(()) => {
                    warn!("Interrupted, finishing with the records collected so far");
                    cancel.cancel();
                }
                Err(e) => error!("Failed to listen for Ctrl-C: {}", e),
            }
        }
    });

    let report = service.run(&request, &cancel).await;
    watcher.abort();
    Ok(report)
}
