//! Domain module - Core entities of a film diary run
//!
//! This module contains the diary records produced by the paginator, the
//! enrichment fields attached to them, and the request shape that frames a
//! single run.
//!
//! Modern Rust module organization (Rust 2018+ style):
//! - Each module is its own file in the domain/ directory
//! - Public exports are defined here for convenience

pub mod diary_record;
pub mod film_path;
pub mod partial_record;
pub mod request;

pub use diary_record::{DiaryRecord, EnrichmentFields, MAX_CAST_SIZE, weekday_name};
pub use film_path::{DocumentKind, FilmPath};
pub use partial_record::{PartialRecord, split_flat_list};
pub use request::{RequestError, ScrapeRequest, YearSelector};
