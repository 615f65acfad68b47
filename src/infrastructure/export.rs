//! Export of the full diary record set to CSV and JSON
//!
//! CSV cells hold list fields joined by a separator (`"; "` by default);
//! [`read_csv`] splits them back into lists so re-imported records feed the
//! aggregation engine the same way freshly scraped ones do.

use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use crate::domain::{DiaryRecord, PartialRecord, split_flat_list, weekday_name};

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Target format(s) for an export
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    Csv,
    Json,
    Both,
}

impl ExportFormat {
    fn extensions(self) -> &'static [&'static str] {
        match self {
            Self::Csv => &["csv"],
            Self::Json => &["json"],
            Self::Both => &["csv", "json"],
        }
    }
}

/// Persists a full record set
pub trait RecordExporter {
    /// Write `records` in `format`, returning the files written.
    fn export(&self, records: &[DiaryRecord], format: ExportFormat) -> Result<Vec<PathBuf>, ExportError>;
}

/// Writes `<base>.csv` and/or `<base>.json`
#[derive(Debug, Clone)]
pub struct FileExporter {
    base_path: PathBuf,
    list_separator: String,
}

impl FileExporter {
    pub fn new(base_path: impl Into<PathBuf>, list_separator: impl Into<String>) -> Self {
        Self {
            base_path: base_path.into(),
            list_separator: list_separator.into(),
        }
    }

    fn write_csv(&self, path: &Path, records: &[DiaryRecord]) -> Result<(), ExportError> {
        let mut writer = csv::Writer::from_path(path)?;
        for record in records {
            writer.serialize(CsvRow::from_record(record, &self.list_separator))?;
        }
        writer.flush()?;
        Ok(())
    }

    fn write_json(path: &Path, records: &[DiaryRecord]) -> Result<(), ExportError> {
        let writer = BufWriter::new(File::create(path)?);
        serde_json::to_writer_pretty(writer, records)?;
        Ok(())
    }
}

impl RecordExporter for FileExporter {
    fn export(&self, records: &[DiaryRecord], format: ExportFormat) -> Result<Vec<PathBuf>, ExportError> {
        let mut written = Vec::new();
        for extension in format.extensions() {
            let path = self.base_path.with_extension(extension);
            match *extension {
                "csv" => self.write_csv(&path, records)?,
                _ => Self::write_json(&path, records)?,
            }
            info!("Exported {} records to {:?}", records.len(), path);
            written.push(path);
        }
        Ok(written)
    }
}

/// Flat CSV representation of one diary record
#[derive(Debug, Serialize, Deserialize)]
struct CsvRow {
    movie_name: String,
    release_year: Option<i32>,
    watch_date: Option<NaiveDate>,
    day_of_week: Option<String>,
    rating: Option<f64>,
    film_path: Option<String>,
    actors: String,
    directors: String,
    writers: String,
    editors: String,
    cinematography: String,
    language: Option<String>,
    studio: Option<String>,
    genres: String,
    runtime: Option<u32>,
    avg_rating: Option<f64>,
    poster_url: Option<String>,
}

impl CsvRow {
    fn from_record(record: &DiaryRecord, separator: &str) -> Self {
        let fields = &record.enrichment;
        Self {
            movie_name: record.title().to_string(),
            release_year: record.release_year,
            watch_date: record.watch_date,
            day_of_week: record.day_of_week().map(|day| weekday_name(day).to_string()),
            rating: record.rating,
            film_path: record.film_path.clone(),
            actors: fields.actors.join(separator),
            directors: fields.directors.join(separator),
            writers: fields.writers.join(separator),
            editors: fields.editors.join(separator),
            cinematography: fields.cinematographers.join(separator),
            language: fields.language.clone(),
            studio: fields.studio.clone(),
            genres: fields.genres.join(separator),
            runtime: fields.runtime_minutes,
            avg_rating: fields.avg_rating,
            poster_url: fields.poster_url.clone(),
        }
    }

    fn into_record(self, separator: char) -> Option<DiaryRecord> {
        let mut record = DiaryRecord::new(self.movie_name)?;
        record.release_year = self.release_year;
        record.watch_date = self.watch_date;
        record.rating = self.rating;
        record.film_path = self.film_path;
        record.enrichment.absorb(PartialRecord {
            actors: split_flat_list(&self.actors, separator),
            directors: split_flat_list(&self.directors, separator),
            writers: split_flat_list(&self.writers, separator),
            editors: split_flat_list(&self.editors, separator),
            cinematographers: split_flat_list(&self.cinematography, separator),
            language: self.language.filter(|value| !value.trim().is_empty()),
            studio: self.studio.filter(|value| !value.trim().is_empty()),
            genres: split_flat_list(&self.genres, separator),
            runtime_minutes: self.runtime,
            avg_rating: self.avg_rating,
            poster_url: self.poster_url.filter(|value| !value.trim().is_empty()),
        });
        Some(record)
    }
}

/// Read records previously written by [`FileExporter`].
///
/// List cells are split on `separator`; rows without a title are skipped.
pub fn read_csv(path: &Path, separator: char) -> Result<Vec<DiaryRecord>, ExportError> {
    let mut reader = csv::Reader::from_path(path)?;
    let mut records = Vec::new();
    for (line, row) in reader.deserialize::<CsvRow>().enumerate() {
        match row?.into_record(separator) {
            Some(record) => records.push(record),
            None => warn!("Skipping CSV row {} without a title", line + 1),
        }
    }
    Ok(records)
}
