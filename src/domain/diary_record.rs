//! Diary records and the enrichment fields attached to them

use chrono::{Datelike, NaiveDate, Weekday};
use serde::Serialize;

use super::partial_record::PartialRecord;

/// Maximum number of cast members kept per film
pub const MAX_CAST_SIZE: usize = 15;

/// One logged watch event from a user's diary.
///
/// Several records may share a title (rewatches); they are never merged at
/// this stage. The title is guaranteed non-empty by [`DiaryRecord::new`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DiaryRecord {
    title: String,
    pub release_year: Option<i32>,
    pub watch_date: Option<NaiveDate>,
    pub rating: Option<f64>,
    pub film_path: Option<String>,
    #[serde(flatten)]
    pub enrichment: EnrichmentFields,
}

impl DiaryRecord {
    /// Create a record for `title`. Returns `None` for a blank title.
    pub fn new(title: impl Into<String>) -> Option<Self> {
        let title = title.into();
        let trimmed = title.trim();
        if trimmed.is_empty() {
            return None;
        }

        Some(Self {
            title: trimmed.to_string(),
            release_year: None,
            watch_date: None,
            rating: None,
            film_path: None,
            enrichment: EnrichmentFields::default(),
        })
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    #[must_use]
    pub fn with_release_year(mut self, year: i32) -> Self {
        self.release_year = Some(year);
        self
    }

    #[must_use]
    pub fn with_watch_date(mut self, date: NaiveDate) -> Self {
        self.watch_date = Some(date);
        self
    }

    #[must_use]
    pub fn with_rating(mut self, rating: f64) -> Self {
        self.rating = Some(rating);
        self
    }

    #[must_use]
    pub fn with_film_path(mut self, path: impl Into<String>) -> Self {
        self.film_path = Some(path.into());
        self
    }

    pub fn day_of_week(&self) -> Option<Weekday> {
        self.watch_date.map(|date| date.weekday())
    }

    /// Age of the film in years at the time it was watched.
    pub fn age_at_watch(&self) -> Option<i32> {
        match (self.release_year, self.watch_date) {
            (Some(release), Some(watched)) => Some(watched.year() - release),
            _ => None,
        }
    }

    /// Personal rating minus the global average, when both are known.
    pub fn rating_variance(&self) -> Option<f64> {
        match (self.rating, self.enrichment.avg_rating) {
            (Some(mine), Some(global)) => Some(mine - global),
            _ => None,
        }
    }
}

/// Fields attached to a record by the enrichment stage.
///
/// Every field starts absent and is only ever upgraded from absent to
/// present; see [`EnrichmentFields::absorb`].
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct EnrichmentFields {
    pub actors: Vec<String>,
    pub directors: Vec<String>,
    pub writers: Vec<String>,
    pub editors: Vec<String>,
    pub cinematographers: Vec<String>,
    pub language: Option<String>,
    pub studio: Option<String>,
    pub genres: Vec<String>,
    pub runtime_minutes: Option<u32>,
    pub avg_rating: Option<f64>,
    pub poster_url: Option<String>,
}

impl EnrichmentFields {
    /// Merge an extracted partial record, filling only absent fields.
    pub fn absorb(&mut self, partial: PartialRecord) {
        fill_list(&mut self.actors, partial.actors);
        self.actors.truncate(MAX_CAST_SIZE);
        fill_list(&mut self.directors, partial.directors);
        fill_list(&mut self.writers, partial.writers);
        fill_list(&mut self.editors, partial.editors);
        fill_list(&mut self.cinematographers, partial.cinematographers);
        fill_list(&mut self.genres, partial.genres);

        fill_scalar(&mut self.language, partial.language);
        fill_scalar(&mut self.studio, partial.studio);
        fill_scalar(&mut self.runtime_minutes, partial.runtime_minutes);
        fill_scalar(&mut self.avg_rating, partial.avg_rating);
        fill_scalar(&mut self.poster_url, partial.poster_url);
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// English name of a weekday, e.g. `"Monday"`
pub fn weekday_name(weekday: Weekday) -> &'static str {
    match weekday {
        Weekday::Mon => "Monday",
        Weekday::Tue => "Tuesday",
        Weekday::Wed => "Wednesday",
        Weekday::Thu => "Thursday",
        Weekday::Fri => "Friday",
        Weekday::Sat => "Saturday",
        Weekday::Sun => "Sunday",
    }
}

fn fill_list(target: &mut Vec<String>, incoming: Vec<String>) {
    if target.is_empty() {
        *target = dedup_ordered(incoming);
    }
}

fn fill_scalar<T>(target: &mut Option<T>, incoming: Option<T>) {
    if target.is_none() {
        *target = incoming;
    }
}

/// Remove blank and repeated names while keeping first-occurrence order.
pub(crate) fn dedup_ordered(items: Vec<String>) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    items
        .into_iter()
        .map(|item| item.trim().to_string())
        .filter(|item| !item.is_empty() && seen.insert(item.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_titles_are_rejected() {
        assert!(DiaryRecord::new("").is_none());
        assert!(DiaryRecord::new("   ").is_none());
        assert_eq!(DiaryRecord::new(" Heat ").unwrap().title(), "Heat");
    }

    #[test]
    fn absorb_only_upgrades_absent_fields() {
        let mut fields = EnrichmentFields::default();
        fields.absorb(PartialRecord {
            studio: Some("Warner Bros.".into()),
            genres: vec!["Crime".into(), "Drama".into(), "Crime".into()],
            ..Default::default()
        });
        fields.absorb(PartialRecord {
            studio: Some("Other".into()),
            genres: vec!["Comedy".into()],
            runtime_minutes: Some(170),
            ..Default::default()
        });

        assert_eq!(fields.studio.as_deref(), Some("Warner Bros."));
        assert_eq!(fields.genres, vec!["Crime", "Drama"]);
        assert_eq!(fields.runtime_minutes, Some(170));
    }

    #[test]
    fn cast_is_deduplicated_and_capped() {
        let mut fields = EnrichmentFields::default();
        let mut cast: Vec<String> = (0..20).map(|i| format!("Actor {i}")).collect();
        cast.insert(1, "Actor 0".into());
        fields.absorb(PartialRecord {
            actors: cast,
            ..Default::default()
        });

        assert_eq!(fields.actors.len(), MAX_CAST_SIZE);
        assert_eq!(fields.actors[0], "Actor 0");
        assert_eq!(fields.actors[1], "Actor 1");
    }

    #[test]
    fn derived_values() {
        let record = DiaryRecord::new("Heat")
            .unwrap()
            .with_release_year(1995)
            .with_watch_date(NaiveDate::from_ymd_opt(2024, 3, 4).unwrap())
            .with_rating(4.5);

        assert_eq!(record.age_at_watch(), Some(29));
        assert_eq!(record.day_of_week(), Some(Weekday::Mon));
        assert_eq!(record.rating_variance(), None);
    }
}
