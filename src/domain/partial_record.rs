//! Output of a single field extraction pass over one detail document.

use serde::{Deserialize, Serialize};

/// Fields extracted from one document. Every field may be absent; a
/// document kind only ever fills the fields it is responsible for.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PartialRecord {
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

impl PartialRecord {
    pub fn is_empty(&self) -> bool {
        self.actors.is_empty()
            && self.directors.is_empty()
            && self.writers.is_empty()
            && self.editors.is_empty()
            && self.cinematographers.is_empty()
            && self.language.is_none()
            && self.studio.is_none()
            && self.genres.is_empty()
            && self.runtime_minutes.is_none()
            && self.avg_rating.is_none()
            && self.poster_url.is_none()
    }
}

/// Split a flat, separator-joined list cell (`"A; B;C"`) into its items.
///
/// Blank items are dropped and surrounding whitespace trimmed, so an empty
/// cell normalizes to an empty list.
pub fn split_flat_list(raw: &str, separator: char) -> Vec<String> {
    raw.split(separator)
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(ToString::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_partial_is_empty() {
        assert!(PartialRecord::default().is_empty());

        let partial = PartialRecord {
            studio: Some("A24".into()),
            ..Default::default()
        };
        assert!(!partial.is_empty());
    }

    #[test]
    fn split_flat_list_trims_and_drops_blanks() {
        assert_eq!(
            split_flat_list("Drama; Thriller;;  Horror ", ';'),
            vec!["Drama", "Thriller", "Horror"]
        );
        assert!(split_flat_list("", ';').is_empty());
        assert!(split_flat_list(" ; ", ';').is_empty());
    }
}
