//! Diary list page parser
//!
//! Each diary entry is an element carrying film data attributes
//! (`data-film-id`, `data-item-name`, `data-item-link`) nested in a table
//! row that also holds the day link and the personal rating.

use scraper::{ElementRef, Html, Selector};
use tracing::debug;

use super::config::DiarySelectors;
use super::values::{parse_diary_date, parse_rating_class, parse_rating_text, split_title_and_year};
use super::{DiaryPageParser, ParsingResult, compile_selectors, element_text};
use crate::domain::DiaryRecord;

/// Parser for Letterboxd diary list pages
pub struct LetterboxdDiaryParser {
    entry_selectors: Vec<Selector>,
    date_selectors: Vec<Selector>,
    rating_selectors: Vec<Selector>,
    title_attributes: Vec<String>,
    path_attributes: Vec<String>,
}

impl LetterboxdDiaryParser {
    /// Create a new diary parser with default selectors
    pub fn new() -> ParsingResult<Self> {
        Self::with_config(&DiarySelectors::default())
    }

    /// Create parser with custom selector configuration
    pub fn with_config(selectors: &DiarySelectors) -> ParsingResult<Self> {
        Ok(Self {
            entry_selectors: compile_selectors("diary.entry", &selectors.entry)?,
            date_selectors: compile_selectors("diary.date_link", &selectors.date_link)?,
            rating_selectors: compile_selectors("diary.rating", &selectors.rating)?,
            title_attributes: selectors.title_attributes.clone(),
            path_attributes: selectors.path_attributes.clone(),
        })
    }

    fn extract_record(&self, entry: ElementRef<'_>) -> Option<DiaryRecord> {
        let raw_name = first_attribute(entry, &self.title_attributes)?;
        let (title, release_year) = split_title_and_year(raw_name);
        let mut record = DiaryRecord::new(title)?;
        record.release_year = release_year;
        record.film_path = first_attribute(entry, &self.path_attributes).map(ToString::to_string);

        if let Some(row) = entry
            .ancestors()
            .filter_map(ElementRef::wrap)
            .find(|ancestor| ancestor.value().name() == "tr")
        {
            record.watch_date = first_match(row, &self.date_selectors)
                .and_then(|link| link.value().attr("href"))
                .and_then(parse_diary_date);
            record.rating = first_match(row, &self.rating_selectors).and_then(|rating| {
                parse_rating_class(rating.value().classes())
                    .or_else(|| parse_rating_text(&element_text(rating)))
            });
        }

        Some(record)
    }
}

impl DiaryPageParser for LetterboxdDiaryParser {
    fn parse_page(&self, html: &str) -> ParsingResult<Vec<DiaryRecord>> {
        let document = Html::parse_document(html);

        for selector in &self.entry_selectors {
            let entries: Vec<ElementRef<'_>> = document.select(selector).collect();
            if entries.is_empty() {
                continue;
            }

            let records: Vec<DiaryRecord> = entries
                .into_iter()
                .filter_map(|entry| self.extract_record(entry))
                .collect();
            debug!("Parsed {} diary records", records.len());
            if !records.is_empty() {
                return Ok(records);
            }
        }

        debug!("No diary entries found on page");
        Ok(Vec::new())
    }
}

fn first_attribute<'a>(element: ElementRef<'a>, names: &[String]) -> Option<&'a str> {
    names
        .iter()
        .filter_map(|name| element.value().attr(name))
        .map(str::trim)
        .find(|value| !value.is_empty())
}

fn first_match<'a>(scope: ElementRef<'a>, selectors: &[Selector]) -> Option<ElementRef<'a>> {
    selectors.iter().find_map(|selector| scope.select(selector).next())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn row(name: &str, link: &str, day: &str, rating_class: &str) -> String {
        format!(
            r#"<tr class="diary-entry-row">
                <td class="td-calendar">Jan</td>
                <td class="td-day"><a class="daydate" href="/dave/films/diary/for/{day}/">05</a></td>
                <td class="td-film-details">
                    <div class="react-component" data-film-id="1" data-item-name="{name}" data-item-link="{link}"></div>
                </td>
                <td class="td-released">1995</td>
                <td class="td-rating"><span class="rating {rating_class}">★★★★</span></td>
            </tr>"#
        )
    }

    fn page(rows: &[String]) -> String {
        format!("<html><body><table><tbody>{}</tbody></table></body></html>", rows.join(""))
    }

    #[test]
    fn parses_rows_in_order() {
        let html = page(&[
            row("Heat (1995)", "/film/heat-1995/", "2024/01/05", "rated-8"),
            row("Alien (1979)", "/film/alien/", "2024/01/07", "rated-9"),
        ]);
        let parser = LetterboxdDiaryParser::new().unwrap();
        let records = parser.parse_page(&html).unwrap();

        assert_eq!(records.len(), 2);
        let heat = &records[0];
        assert_eq!(heat.title(), "Heat");
        assert_eq!(heat.release_year, Some(1995));
        assert_eq!(heat.film_path.as_deref(), Some("/film/heat-1995/"));
        assert_eq!(heat.watch_date, NaiveDate::from_ymd_opt(2024, 1, 5));
        assert_eq!(heat.rating, Some(4.0));
        assert_eq!(records[1].rating, Some(4.5));
    }

    #[test]
    fn falls_back_to_star_text() {
        let html = page(&[row("Heat (1995)", "/film/heat-1995/", "2024/01/05", "")]);
        let records = LetterboxdDiaryParser::new().unwrap().parse_page(&html).unwrap();

        assert_eq!(records[0].rating, Some(4.0));
    }

    #[test]
    fn entries_without_a_name_are_skipped() {
        let html = page(&[
            row("", "/film/nothing/", "2024/01/05", "rated-2"),
            row("Heat (1995)", "/film/heat-1995/", "2024/01/06", "rated-2"),
        ]);
        let records = LetterboxdDiaryParser::new().unwrap().parse_page(&html).unwrap();

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].title(), "Heat");
    }

    #[test]
    fn entry_outside_a_row_has_no_date_or_rating() {
        let html = r#"<div data-film-id="9" data-item-name="Solo (2018)" data-item-slug="solo"></div>"#;
        let records = LetterboxdDiaryParser::new().unwrap().parse_page(html).unwrap();

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].film_path.as_deref(), Some("solo"));
        assert!(records[0].watch_date.is_none());
        assert!(records[0].rating.is_none());
    }

    #[test]
    fn empty_page_yields_no_records() {
        let parser = LetterboxdDiaryParser::new().unwrap();
        assert!(parser.parse_page("<html><body><p>No entries</p></body></html>").unwrap().is_empty());
    }
}
