//! HTML parsing infrastructure for diary and film pages
//!
//! Two extraction seams live here:
//! - [`DiaryPageParser`] turns one diary list page into diary records
//! - [`FieldExtractor`] turns one film document into a [`PartialRecord`]
//!
//! Both are infallible with respect to page content: missing markup yields
//! empty results, never errors.

pub mod config;
pub mod diary_page_parser;
pub mod error;
pub mod film_page_parser;
pub mod values;

pub use config::{DiarySelectors, FilmSelectors, ParsingConfig};
pub use diary_page_parser::LetterboxdDiaryParser;
pub use error::{ParsingError, ParsingResult};
pub use film_page_parser::LetterboxdFilmParser;

use scraper::{ElementRef, Selector};
use tracing::{debug, warn};

use crate::domain::{DiaryRecord, DocumentKind, PartialRecord};

/// Parses one page of a user's diary
pub trait DiaryPageParser: Send + Sync {
    /// Records on the page in document order. An empty vector means the
    /// page has no entries (end of the diary).
    fn parse_page(&self, html: &str) -> ParsingResult<Vec<DiaryRecord>>;
}

/// Extracts enrichment fields from one film document
pub trait FieldExtractor: Send + Sync {
    fn extract(&self, kind: DocumentKind, html: &str) -> PartialRecord;
}

/// Compile multiple selector strings into Selector objects
///
/// Invalid entries are skipped with a warning; an error is returned only
/// when none of them compile.
pub(crate) fn compile_selectors(field: &str, selector_strings: &[String]) -> ParsingResult<Vec<Selector>> {
    let mut selectors = Vec::new();
    let mut errors = Vec::new();

    for selector_str in selector_strings {
        match Selector::parse(selector_str) {
            Ok(selector) => selectors.push(selector),
            Err(e) => {
                warn!("Failed to compile selector '{}': {}", selector_str, e);
                errors.push(ParsingError::invalid_selector(selector_str, e));
            }
        }
    }

    if selectors.is_empty() {
        return Err(errors.pop().unwrap_or(ParsingError::NoSelectors {
            field: field.to_string(),
        }));
    }
    if !errors.is_empty() {
        debug!("{} selector(s) for '{}' failed to compile", errors.len(), field);
    }

    Ok(selectors)
}

/// Whitespace-normalized text content of an element
pub(crate) fn element_text(element: ElementRef<'_>) -> String {
    element.text().collect::<Vec<_>>().join(" ").split_whitespace().collect::<Vec<_>>().join(" ")
}

/// The next sibling that is an element, skipping text and comments
pub(crate) fn next_element_sibling(element: ElementRef<'_>) -> Option<ElementRef<'_>> {
    element.next_siblings().find_map(ElementRef::wrap)
}

#[cfg(test)]
mod tests {
    use super::*;
    use scraper::Html;

    #[test]
    fn compile_skips_invalid_selectors() {
        let selectors = compile_selectors("test", &["[[".to_string(), "a.ok".to_string()]).unwrap();
        assert_eq!(selectors.len(), 1);
    }

    #[test]
    fn compile_fails_when_nothing_compiles() {
        assert!(compile_selectors("test", &["[[".to_string()]).is_err());
        assert!(matches!(
            compile_selectors("empty", &[]),
            Err(ParsingError::NoSelectors { .. })
        ));
    }

    #[test]
    fn text_and_sibling_helpers() {
        let html = Html::parse_fragment("<div><h3> Studio\n </h3> text <p><a>A24</a>  Films</p></div>");
        let selector = Selector::parse("h3").unwrap();
        let header = html.select(&selector).next().unwrap();

        assert_eq!(element_text(header), "Studio");
        let sibling = next_element_sibling(header).unwrap();
        assert_eq!(sibling.value().name(), "p");
        assert_eq!(element_text(sibling), "A24 Films");
    }
}
