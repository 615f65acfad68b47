//! Small value parsers shared by the diary and film extractors

use chrono::NaiveDate;
use regex::Regex;

use super::error::{ParsingError, ParsingResult};

/// Split a `"Title (Year)"` attribute into title and release year.
///
/// Titles that themselves contain parentheses keep everything before the
/// final `" ("`. A missing or non-numeric year yields `None`.
pub fn split_title_and_year(raw: &str) -> (String, Option<i32>) {
    let raw = raw.trim();
    let Some(open) = raw.rfind(" (") else {
        return (raw.to_string(), None);
    };
    match raw[open + 2..].strip_suffix(')') {
        Some(inner) => (raw[..open].trim().to_string(), inner.trim().parse().ok()),
        None => (raw.to_string(), None),
    }
}

/// Convert a star string (`"★★★½"`) or a plain number (`"3.5"`) to 0.0..=5.0.
pub fn parse_rating_text(text: &str) -> Option<f64> {
    let text = text.trim();
    if let Some(number) = leading_number(text) {
        return Some(number);
    }

    let stars = text.chars().filter(|&c| c == '★').count();
    let half = if text.contains('½') { 0.5 } else { 0.0 };
    if stars > 0 || half > 0.0 {
        return Some(stars as f64 + half);
    }
    None
}

fn leading_number(text: &str) -> Option<f64> {
    let start = text.find(|c: char| c.is_ascii_digit())?;
    let digits: String = text[start..]
        .chars()
        .take_while(|c| c.is_ascii_digit() || *c == '.')
        .collect();
    digits.trim_end_matches('.').parse().ok()
}

/// Read a `rated-N` class (half-star units) as a 0.5..=5.0 rating.
pub fn parse_rating_class<'a>(mut classes: impl Iterator<Item = &'a str>) -> Option<f64> {
    classes.find_map(|class| {
        let units: u32 = class.strip_prefix("rated-")?.parse().ok()?;
        Some(f64::from(units) / 2.0)
    })
}

/// Extract the `/YYYY/MM/DD/` date encoded in a diary day link.
pub fn parse_diary_date(href: &str) -> Option<NaiveDate> {
    let segments: Vec<&str> = href.split('/').filter(|s| !s.is_empty()).collect();
    segments.windows(3).rev().find_map(|window| {
        let [y, m, d] = window else { return None };
        if y.len() != 4 || m.len() != 2 || d.len() != 2 {
            return None;
        }
        NaiveDate::from_ymd_opt(y.parse().ok()?, m.parse().ok()?, d.parse().ok()?)
    })
}

/// Minutes in an ISO-8601 duration such as `PT2H30M` or `PT118M`.
///
/// Durations given only in seconds are floored to whole minutes. Zero,
/// unparseable or overflowing durations yield `None`.
pub fn parse_iso_duration(raw: &str) -> Option<u32> {
    let upper = raw.trim().to_ascii_uppercase();
    let body = upper.strip_prefix("PT").unwrap_or(&upper);

    let component = |unit: char| -> Option<u32> {
        let end = body.find(unit)?;
        let start = body[..end]
            .rfind(|c: char| !c.is_ascii_digit())
            .map_or(0, |i| i + 1);
        body[start..end].parse().ok()
    };

    let mut minutes = component('H')
        .unwrap_or(0)
        .checked_mul(60)?
        .checked_add(component('M').unwrap_or(0))?;
    if minutes == 0 {
        minutes = component('S').unwrap_or(0) / 60;
    }
    (minutes > 0).then_some(minutes)
}

/// Swap low-resolution poster crops for the 500x750 variant.
pub fn upgrade_poster_url(url: &str) -> String {
    url.replace("-0-230-0-345-", "-0-500-0-750-")
        .replace("-0-110-0-165-", "-0-500-0-750-")
}

/// Regular expressions used by the film extractor, compiled once
#[derive(Debug, Clone)]
pub struct FilmPatterns {
    pub runtime_text: Regex,
    pub rating_number: Regex,
    pub poster: Regex,
    pub legacy_poster: Regex,
    pub director_role: Regex,
    pub director_exclusions: Regex,
    pub writer_role: Regex,
    pub editor_role: Regex,
    pub cinematography_role: Regex,
}

impl FilmPatterns {
    pub fn new() -> ParsingResult<Self> {
        Ok(Self {
            runtime_text: compile(r"(\d+)\s*(?:mins?|minutes?)\s*(?:More at|$)")?,
            rating_number: compile(r"(\d+\.?\d*)")?,
            poster: compile(r#"https://a\.ltrbxd\.com/resized/film-poster/[^"'<>\s]+\.jpg"#)?,
            legacy_poster: compile(
                r#"https://a\.ltrbxd\.com/resized/sm/upload/[^"'<>\s]+-0-230-0-345-crop\.jpg[^"'<>\s]*"#,
            )?,
            director_role: compile(r"\bdirectors?\b")?,
            director_exclusions: compile(r"assistant|asst|art|set|decor|production design")?,
            writer_role: compile(r"writer|screenplay|written")?,
            editor_role: compile(r"edit")?,
            cinematography_role: compile(r"cinemat|camera|director of photography|d\.o\.p|\bdp\b")?,
        })
    }
}

fn compile(pattern: &str) -> ParsingResult<Regex> {
    Regex::new(pattern).map_err(|e| ParsingError::invalid_pattern(pattern, e))
}
