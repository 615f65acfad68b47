//! Facet aggregation over the canonical record set

use std::collections::{HashMap, HashSet};

use serde::Serialize;

use crate::domain::DiaryRecord;

/// A categorical dimension records are grouped by
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Facet {
    Genres,
    Actors,
    Directors,
    Writers,
    Editors,
    Cinematographers,
    Studios,
    Languages,
}

impl Facet {
    pub const ALL: [Self; 8] = [
        Self::Genres,
        Self::Actors,
        Self::Directors,
        Self::Writers,
        Self::Editors,
        Self::Cinematographers,
        Self::Studios,
        Self::Languages,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Genres => "genres",
            Self::Actors => "actors",
            Self::Directors => "directors",
            Self::Writers => "writers",
            Self::Editors => "editors",
            Self::Cinematographers => "cinematographers",
            Self::Studios => "studios",
            Self::Languages => "languages",
        }
    }

    /// Values this facet takes on `record`, each at most once.
    pub fn values(self, record: &DiaryRecord) -> Vec<&str> {
        let fields = &record.enrichment;
        let raw: Vec<&str> = match self {
            Self::Genres => fields.genres.iter().map(String::as_str).collect(),
            Self::Actors => fields.actors.iter().map(String::as_str).collect(),
            Self::Directors => fields.directors.iter().map(String::as_str).collect(),
            Self::Writers => fields.writers.iter().map(String::as_str).collect(),
            Self::Editors => fields.editors.iter().map(String::as_str).collect(),
            Self::Cinematographers => fields.cinematographers.iter().map(String::as_str).collect(),
            Self::Studios => fields.studio.as_deref().into_iter().collect(),
            Self::Languages => fields.language.as_deref().into_iter().collect(),
        };

        let mut seen = HashSet::new();
        raw.into_iter()
            .map(str::trim)
            .filter(|value| !value.is_empty() && seen.insert(*value))
            .collect()
    }
}

/// One value's tally inside a facet
#[derive(Debug, Clone, PartialEq)]
pub struct FacetItem {
    pub name: String,
    /// Canonical films carrying this value
    pub count: usize,
    ratings: Vec<f64>,
}

impl FacetItem {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            count: 0,
            ratings: Vec::new(),
        }
    }

    pub fn ratings(&self) -> &[f64] {
        &self.ratings
    }

    /// Mean of the contributing personal ratings, absent when none.
    pub fn avg_rating(&self) -> Option<f64> {
        mean(&self.ratings)
    }
}

/// All values of one facet with their counts and ratings.
///
/// Items are kept in first-seen order, which is the tie-break order for
/// every ranking built from this aggregate.
#[derive(Debug, Clone)]
pub struct FacetAggregate {
    pub facet: Facet,
    items: Vec<FacetItem>,
}

impl FacetAggregate {
    pub fn build(facet: Facet, canonical: &[&DiaryRecord]) -> Self {
        let mut items: Vec<FacetItem> = Vec::new();
        let mut index: HashMap<String, usize> = HashMap::new();

        for record in canonical {
            for value in facet.values(record) {
                let slot = *index.entry(value.to_string()).or_insert_with(|| {
                    items.push(FacetItem::new(value));
                    items.len() - 1
                });
                let item = &mut items[slot];
                item.count += 1;
                if let Some(rating) = record.rating {
                    item.ratings.push(rating);
                }
            }
        }

        Self { facet, items }
    }

    pub fn items(&self) -> &[FacetItem] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Most frequent values regardless of rating.
    pub fn top_by_count(&self, n: usize) -> Vec<CountEntry> {
        let mut ordered: Vec<&FacetItem> = self.items.iter().collect();
        ordered.sort_by(|a, b| b.count.cmp(&a.count));
        ordered
            .into_iter()
            .take(n)
            .map(|item| CountEntry {
                name: item.name.clone(),
                count: item.count,
                avg_rating: item.avg_rating(),
            })
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CountEntry {
    pub name: String,
    pub count: usize,
    pub avg_rating: Option<f64>,
}

/// An actor with every canonical film they appear in
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActorEntry {
    pub actor: String,
    pub count: usize,
    pub films: Vec<String>,
}

/// Actors ordered by appearance count (stable), truncated to `limit`.
pub fn actor_index(canonical: &[&DiaryRecord], limit: usize) -> Vec<ActorEntry> {
    let mut entries: Vec<ActorEntry> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for record in canonical {
        for actor in Facet::Actors.values(record) {
            let slot = *index.entry(actor.to_string()).or_insert_with(|| {
                entries.push(ActorEntry {
                    actor: actor.to_string(),
                    count: 0,
                    films: Vec::new(),
                });
                entries.len() - 1
            });
            entries[slot].count += 1;
            entries[slot].films.push(record.title().to_string());
        }
    }

    entries.sort_by(|a, b| b.count.cmp(&a.count));
    entries.truncate(limit);
    entries
}

pub(crate) fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}
