//! Parsing configuration for HTML extraction
//!
//! Centralized CSS selectors for diary pages and film documents. Every
//! field is an ordered list of fallbacks; the first selector that matches
//! wins.

use serde::{Deserialize, Serialize};

/// Main parsing configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ParsingConfig {
    pub diary: DiarySelectors,
    pub film: FilmSelectors,
}

/// CSS selectors for diary list pages
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DiarySelectors {
    /// Elements carrying one diary entry's film attributes
    pub entry: Vec<String>,

    /// Attributes holding `"Title (Year)"`, in order of preference
    pub title_attributes: Vec<String>,

    /// Attributes holding the film path or slug
    pub path_attributes: Vec<String>,

    /// Day link whose href encodes the watch date
    pub date_link: Vec<String>,

    /// Element carrying the personal rating
    pub rating: Vec<String>,
}

impl Default for DiarySelectors {
    fn default() -> Self {
        Self {
            entry: vec!["[data-film-id]".to_string()],
            title_attributes: vec!["data-item-name".to_string(), "data-film-name".to_string()],
            path_attributes: vec![
                "data-item-link".to_string(),
                "data-target-link".to_string(),
                "data-item-slug".to_string(),
            ],
            date_link: vec!["td.td-day a.daydate".to_string(), "a.daydate".to_string()],
            rating: vec![
                "td.td-rating .rating".to_string(),
                "td.col-rating .rating".to_string(),
                ".rating".to_string(),
            ],
        }
    }
}

/// CSS selectors for the four film documents
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FilmSelectors {
    pub cast: Vec<String>,
    pub cast_fallback: Vec<String>,
    pub rating_meta: Vec<String>,
    pub ld_json: Vec<String>,
    pub script: Vec<String>,
    pub poster_container: Vec<String>,
    pub crew_container: Vec<String>,
    pub section_header: Vec<String>,
    pub director_fallback: Vec<String>,
    pub studio_link: Vec<String>,
    /// Elements that may label a details/genres section
    pub label: Vec<String>,
    pub genres_container: Vec<String>,
}

impl Default for FilmSelectors {
    fn default() -> Self {
        Self {
            cast: vec![
                "#tab-cast .cast-list a.text-slug".to_string(),
                ".cast-list.text-sluglist a.text-slug".to_string(),
                ".cast-list a.text-slug".to_string(),
            ],
            cast_fallback: vec!["a[href*=\"/actor/\"]".to_string()],
            rating_meta: vec!["meta[name=\"twitter:data2\"]".to_string()],
            ld_json: vec!["script[type=\"application/ld+json\"]".to_string()],
            script: vec!["script".to_string()],
            poster_container: vec!["div.film-poster".to_string()],
            crew_container: vec!["#tab-crew".to_string()],
            section_header: vec!["h2, h3, h4".to_string()],
            director_fallback: vec!["a[href*=\"/director/\"]".to_string()],
            studio_link: vec!["a[href*=\"/studio/\"]".to_string()],
            label: vec!["dt, h2, h3, h4, strong, span, p".to_string()],
            genres_container: vec!["#tab-genres".to_string()],
        }
    }
}
