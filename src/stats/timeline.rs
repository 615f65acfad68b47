//! Date-based statistics over the full diary: cumulative timeline,
//! milestones and day-of-week habits

use std::collections::BTreeMap;

use chrono::{NaiveDate, Weekday};
use serde::Serialize;

use super::facets::mean;
use crate::domain::{DiaryRecord, weekday_name};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TimelinePoint {
    pub date: NaiveDate,
    pub cumulative_count: usize,
    pub films_on_day: usize,
}

/// Per-day watch counts in ascending date order with a running total.
/// Undated entries are left out.
pub fn cumulative_timeline(full: &[DiaryRecord]) -> Vec<TimelinePoint> {
    let mut per_day: BTreeMap<NaiveDate, usize> = BTreeMap::new();
    for date in full.iter().filter_map(|record| record.watch_date) {
        *per_day.entry(date).or_default() += 1;
    }

    let mut cumulative = 0;
    per_day
        .into_iter()
        .map(|(date, films_on_day)| {
            cumulative += films_on_day;
            TimelinePoint {
                date,
                cumulative_count: cumulative,
                films_on_day,
            }
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Milestone {
    pub milestone: usize,
    pub milestone_label: String,
    pub film_name: String,
    pub watch_date: String,
    pub poster_url: Option<String>,
}

/// Entries at the given 1-indexed positions of the date-sorted diary.
///
/// The sort is stable so same-day entries keep diary order. Positions past
/// the end of the diary are skipped.
pub fn milestones(full: &[DiaryRecord], positions: &[usize]) -> Vec<Milestone> {
    let mut dated: Vec<(&DiaryRecord, NaiveDate)> = full
        .iter()
        .filter_map(|record| record.watch_date.map(|date| (record, date)))
        .collect();
    dated.sort_by_key(|(_, date)| *date);

    positions
        .iter()
        .filter(|&&position| position >= 1)
        .filter_map(|&position| {
            let (record, date) = dated.get(position - 1)?;
            Some(Milestone {
                milestone: position,
                milestone_label: ordinal_label(position),
                film_name: record.title().to_string(),
                watch_date: date.format("%B %d, %Y").to_string(),
                poster_url: record.enrichment.poster_url.clone(),
            })
        })
        .collect()
}

fn ordinal_label(position: usize) -> String {
    let suffix = match (position % 10, position % 100) {
        (_, 11..=13) => "th",
        (1, _) => "st",
        (2, _) => "nd",
        (3, _) => "rd",
        _ => "th",
    };
    format!("{position}{suffix}")
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeekdayStats {
    pub day: String,
    pub count: usize,
    pub avg_rating: Option<f64>,
}

const WEEK: [Weekday; 7] = [
    Weekday::Mon,
    Weekday::Tue,
    Weekday::Wed,
    Weekday::Thu,
    Weekday::Fri,
    Weekday::Sat,
    Weekday::Sun,
];

/// Watch count and mean personal rating for Monday through Sunday.
pub fn day_of_week_stats(full: &[DiaryRecord]) -> Vec<WeekdayStats> {
    WEEK.iter()
        .map(|&weekday| {
            let on_day: Vec<&DiaryRecord> = full
                .iter()
                .filter(|record| record.day_of_week() == Some(weekday))
                .collect();
            let ratings: Vec<f64> = on_day.iter().filter_map(|record| record.rating).collect();
            WeekdayStats {
                day: weekday_name(weekday).to_string(),
                count: on_day.len(),
                avg_rating: mean(&ratings),
            }
        })
        .collect()
}
