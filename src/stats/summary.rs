//! Runtime, decade, film age and average rating summaries

use std::collections::BTreeMap;

use serde::Serialize;

use super::dedup::RecordSets;
use super::facets::mean;
use crate::domain::DiaryRecord;

const MINUTES_PER_HOUR: f64 = 60.0;
const MINUTES_PER_DAY: f64 = 60.0 * 24.0;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RuntimeFilm {
    pub name: String,
    pub runtime: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RuntimeStats {
    /// Sum over every diary entry, rewatches included
    pub total_minutes: u64,
    pub total_hours: f64,
    pub total_days: f64,
    pub avg_runtime: Option<f64>,
    pub longest_film: Option<RuntimeFilm>,
    pub shortest_film: Option<RuntimeFilm>,
    pub films_with_runtime: usize,
}

/// Watch time totals. `None` when no entry has a runtime.
pub fn runtime_stats(sets: &RecordSets<'_>) -> Option<RuntimeStats> {
    let runtimes: Vec<u32> = sets
        .full
        .iter()
        .filter_map(|record| record.enrichment.runtime_minutes)
        .collect();
    if runtimes.is_empty() {
        return None;
    }

    let total_minutes: u64 = runtimes.iter().map(|&minutes| u64::from(minutes)).sum();
    let films_with_runtime = runtimes.len();
    let avg_runtime = total_minutes as f64 / films_with_runtime as f64;

    let mut longest: Option<(&DiaryRecord, u32)> = None;
    let mut shortest: Option<(&DiaryRecord, u32)> = None;
    for &record in &sets.canonical {
        let Some(runtime) = record.enrichment.runtime_minutes else {
            continue;
        };
        if longest.is_none_or(|(_, best)| runtime > best) {
            longest = Some((record, runtime));
        }
        if shortest.is_none_or(|(_, best)| runtime < best) {
            shortest = Some((record, runtime));
        }
    }
    let as_film = |(record, runtime): (&DiaryRecord, u32)| RuntimeFilm {
        name: record.title().to_string(),
        runtime,
    };

    Some(RuntimeStats {
        total_minutes,
        total_hours: round_to(total_minutes as f64 / MINUTES_PER_HOUR, 1),
        total_days: round_to(total_minutes as f64 / MINUTES_PER_DAY, 2),
        avg_runtime: Some(round_to(avg_runtime, 1)),
        longest_film: longest.map(as_film),
        shortest_film: shortest.map(as_film),
        films_with_runtime,
    })
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DecadeEntry {
    /// Display label such as `"1990s"`
    pub decade: String,
    pub decade_start: i32,
    pub count: usize,
    pub avg_rating: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct DecadeStats {
    pub decades: Vec<DecadeEntry>,
    pub favorite_decade: Option<DecadeEntry>,
}

/// Canonical films grouped by release decade, oldest first.
///
/// The favorite decade is the best-rated one with at least `min_films`
/// films; ties go to the earliest decade.
pub fn decade_stats(canonical: &[&DiaryRecord], min_films: usize) -> DecadeStats {
    let mut grouped: BTreeMap<i32, (usize, Vec<f64>)> = BTreeMap::new();
    for record in canonical {
        let Some(year) = record.release_year else {
            continue;
        };
        let entry = grouped.entry(year.div_euclid(10) * 10).or_default();
        entry.0 += 1;
        if let Some(rating) = record.rating {
            entry.1.push(rating);
        }
    }

    let mut decades = Vec::with_capacity(grouped.len());
    let mut favorite: Option<(usize, f64)> = None;
    for (decade_start, (count, ratings)) in grouped {
        let avg = mean(&ratings);
        if let Some(avg) = avg {
            if count >= min_films && favorite.is_none_or(|(_, best)| avg > best) {
                favorite = Some((decades.len(), avg));
            }
        }
        decades.push(DecadeEntry {
            decade: format!("{decade_start}s"),
            decade_start,
            count,
            avg_rating: avg.map(|value| round_to(value, 2)),
        });
    }

    let favorite_decade = favorite.map(|(slot, _)| decades[slot].clone());
    DecadeStats {
        decades,
        favorite_decade,
    }
}

/// Mean age in years of the films at watch time, over every dated entry.
pub fn average_film_age(full: &[DiaryRecord]) -> Option<f64> {
    let ages: Vec<f64> = full
        .iter()
        .filter_map(DiaryRecord::age_at_watch)
        .map(f64::from)
        .collect();
    mean(&ages).map(|age| round_to(age, 1))
}

/// Mean personal rating over the canonical films.
pub fn average_rating(canonical: &[&DiaryRecord]) -> Option<f64> {
    let ratings: Vec<f64> = canonical.iter().filter_map(|record| record.rating).collect();
    mean(&ratings).map(|avg| round_to(avg, 2))
}

pub(crate) fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}
