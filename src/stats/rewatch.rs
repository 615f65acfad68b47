//! Rewatch ranking over the full diary

use std::collections::HashMap;

use serde::Serialize;

use super::dedup::RecordSets;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RewatchEntry {
    pub movie: String,
    pub count: usize,
    pub poster_url: Option<String>,
}

/// Titles logged more than once, most rewatched first.
///
/// Equal counts keep first-seen order. The poster comes from the title's
/// canonical record.
pub fn top_rewatched(sets: &RecordSets<'_>, n: usize) -> Vec<RewatchEntry> {
    let mut counts: Vec<(&str, usize)> = Vec::new();
    let mut index: HashMap<&str, usize> = HashMap::new();
    for record in sets.full {
        let slot = *index.entry(record.title()).or_insert_with(|| {
            counts.push((record.title(), 0));
            counts.len() - 1
        });
        counts[slot].1 += 1;
    }

    let posters: HashMap<&str, Option<&String>> = sets
        .canonical
        .iter()
        .map(|record| (record.title(), record.enrichment.poster_url.as_ref()))
        .collect();

    let mut rewatched: Vec<RewatchEntry> = counts
        .into_iter()
        .filter(|(_, count)| *count > 1)
        .map(|(title, count)| RewatchEntry {
            movie: title.to_string(),
            count,
            poster_url: posters.get(title).copied().flatten().cloned(),
        })
        .collect();

    rewatched.sort_by(|a, b| b.count.cmp(&a.count));
    rewatched.truncate(n);
    rewatched
}
