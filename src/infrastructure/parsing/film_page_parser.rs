//! Film document extractor
//!
//! One extractor handles all four documents of a film:
//! - profile: cast, global average rating, runtime, poster
//! - crew: directors, writers, editors, cinematographers
//! - details: language, studio
//! - genres: genre list

#![allow(clippy::uninlined_format_args)]

use scraper::{ElementRef, Html, Selector};
use serde_json::Value;
use tracing::trace;

use super::config::FilmSelectors;
use super::values::{FilmPatterns, parse_iso_duration, upgrade_poster_url};
use super::{FieldExtractor, ParsingResult, compile_selectors, element_text, next_element_sibling};
use crate::domain::{DocumentKind, MAX_CAST_SIZE, PartialRecord};

/// Extractor for Letterboxd film pages and tabs
pub struct LetterboxdFilmParser {
    cast: Vec<Selector>,
    cast_fallback: Vec<Selector>,
    rating_meta: Vec<Selector>,
    ld_json: Vec<Selector>,
    script: Vec<Selector>,
    poster_container: Vec<Selector>,
    crew_container: Vec<Selector>,
    section_header: Vec<Selector>,
    director_fallback: Vec<Selector>,
    studio_link: Vec<Selector>,
    label: Vec<Selector>,
    genres_container: Vec<Selector>,
    anchor: Selector,
    slug_anchor: Selector,
    patterns: FilmPatterns,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CrewRole {
    Director,
    Writer,
    Editor,
    Cinematographer,
}

impl LetterboxdFilmParser {
    /// Create a new film extractor with default selectors
    pub fn new() -> ParsingResult<Self> {
        Self::with_config(&FilmSelectors::default())
    }

    /// Create extractor with custom selector configuration
    pub fn with_config(selectors: &FilmSelectors) -> ParsingResult<Self> {
        Ok(Self {
            cast: compile_selectors("film.cast", &selectors.cast)?,
            cast_fallback: compile_selectors("film.cast_fallback", &selectors.cast_fallback)?,
            rating_meta: compile_selectors("film.rating_meta", &selectors.rating_meta)?,
            ld_json: compile_selectors("film.ld_json", &selectors.ld_json)?,
            script: compile_selectors("film.script", &selectors.script)?,
            poster_container: compile_selectors("film.poster_container", &selectors.poster_container)?,
            crew_container: compile_selectors("film.crew_container", &selectors.crew_container)?,
            section_header: compile_selectors("film.section_header", &selectors.section_header)?,
            director_fallback: compile_selectors("film.director_fallback", &selectors.director_fallback)?,
            studio_link: compile_selectors("film.studio_link", &selectors.studio_link)?,
            label: compile_selectors("film.label", &selectors.label)?,
            genres_container: compile_selectors("film.genres_container", &selectors.genres_container)?,
            anchor: single_selector("a")?,
            slug_anchor: single_selector("a.text-slug")?,
            patterns: FilmPatterns::new()?,
        })
    }

    fn extract_profile(&self, document: &Html) -> PartialRecord {
        let mut actors = texts_of_first_match(document.root_element(), &self.cast);
        if actors.is_empty() {
            actors = texts_of_first_match(document.root_element(), &self.cast_fallback);
        }
        let mut actors = dedup(actors);
        actors.truncate(MAX_CAST_SIZE);

        let ld_json = self.ld_json_blocks(document);
        let avg_rating = self.meta_rating(document).or_else(|| {
            ld_json
                .iter()
                .find_map(|block| number_value(block.get("aggregateRating")?.get("ratingValue")?))
        });
        let runtime_minutes = ld_json
            .iter()
            .find_map(|block| block.get("duration")?.as_str().and_then(parse_iso_duration))
            .or_else(|| self.runtime_from_text(document));

        PartialRecord {
            actors,
            avg_rating,
            runtime_minutes,
            poster_url: self.poster_url(document).map(|url| upgrade_poster_url(&url)),
            ..Default::default()
        }
    }

    fn extract_crew(&self, document: &Html) -> PartialRecord {
        let container = first_match(document.root_element(), &self.crew_container)
            .unwrap_or_else(|| document.root_element());
        let mut partial = PartialRecord::default();

        for header in all_matches(container, &self.section_header) {
            let role = element_text(header).to_lowercase();
            let Some(list) = next_element_sibling(header) else {
                continue;
            };
            let Some(role) = self.classify_role(&role) else {
                continue;
            };

            let mut names = self.anchor_texts(list, &self.slug_anchor);
            if names.is_empty() {
                names = self.anchor_texts(list, &self.anchor);
            }
            let target = match role {
                CrewRole::Director => &mut partial.directors,
                CrewRole::Writer => &mut partial.writers,
                CrewRole::Editor => &mut partial.editors,
                CrewRole::Cinematographer => &mut partial.cinematographers,
            };
            target.extend(names);
        }

        if partial.directors.is_empty() {
            partial.directors = texts_of_first_match(document.root_element(), &self.director_fallback);
        }

        partial.directors = dedup(partial.directors);
        partial.writers = dedup(partial.writers);
        partial.editors = dedup(partial.editors);
        partial.cinematographers = dedup(partial.cinematographers);
        partial
    }

    fn extract_details(&self, document: &Html) -> PartialRecord {
        let language = self
            .ld_json_blocks(document)
            .iter()
            .find_map(|block| string_value(block.get("inLanguage").or_else(|| block.get("language"))?))
            .or_else(|| self.labelled_value(document, "language"));

        let studio = first_match(document.root_element(), &self.studio_link)
            .map(element_text)
            .filter(|name| !name.is_empty())
            .or_else(|| {
                all_matches(document.root_element(), &self.section_header)
                    .filter(|header| element_text(*header).to_lowercase().contains("studio"))
                    .find_map(|header| {
                        let sibling = next_element_sibling(header)?;
                        sibling.select(&self.anchor).next().map(element_text)
                    })
            });

        PartialRecord {
            language,
            studio,
            ..Default::default()
        }
    }

    fn extract_genres(&self, document: &Html) -> PartialRecord {
        let labelled = all_matches(document.root_element(), &self.label)
            .find(|label| element_text(*label).to_lowercase().contains("genres"));

        let genres = match labelled {
            Some(label) => next_element_sibling(label)
                .map(|list| self.anchor_texts(list, &self.anchor))
                .unwrap_or_default(),
            None => {
                let scope = first_match(document.root_element(), &self.genres_container)
                    .unwrap_or_else(|| document.root_element());
                let mut genres = Vec::new();
                for element in scope.descendants().filter_map(ElementRef::wrap) {
                    let name = element.value().name();
                    if matches!(name, "h2" | "h3" | "h4") && element_text(element).to_lowercase().contains("theme") {
                        break;
                    }
                    if name == "a" {
                        genres.push(element_text(element));
                    }
                }
                genres
            }
        };

        let genres = genres
            .into_iter()
            .filter(|genre| !genre.eq_ignore_ascii_case("show all"))
            .collect();
        PartialRecord {
            genres: dedup(genres),
            ..Default::default()
        }
    }

    fn classify_role(&self, role: &str) -> Option<CrewRole> {
        let p = &self.patterns;
        if p.cinematography_role.is_match(role) {
            Some(CrewRole::Cinematographer)
        } else if p.director_role.is_match(role) && !p.director_exclusions.is_match(role) {
            Some(CrewRole::Director)
        } else if p.writer_role.is_match(role) {
            Some(CrewRole::Writer)
        } else if p.editor_role.is_match(role) {
            Some(CrewRole::Editor)
        } else {
            None
        }
    }

    fn anchor_texts(&self, scope: ElementRef<'_>, selector: &Selector) -> Vec<String> {
        scope
            .select(selector)
            .map(element_text)
            .filter(|text| !text.is_empty())
            .collect()
    }

    fn meta_rating(&self, document: &Html) -> Option<f64> {
        let meta = first_match(document.root_element(), &self.rating_meta)?;
        let content = meta.value().attr("content")?;
        self.patterns.rating_number.captures(content)?.get(1)?.as_str().parse().ok()
    }

    fn runtime_from_text(&self, document: &Html) -> Option<u32> {
        let text = element_text(document.root_element());
        self.patterns.runtime_text.captures(&text)?.get(1)?.as_str().parse().ok()
    }

    fn poster_url(&self, document: &Html) -> Option<String> {
        for script in all_matches(document.root_element(), &self.script) {
            let text: String = script.text().collect();

            let matches: Vec<&str> = self.patterns.poster.find_iter(&text).map(|m| m.as_str()).collect();
            if let Some(first) = matches.first() {
                let preferred = matches
                    .iter()
                    .find(|url| ["-230-", "-500-", "-1000-"].iter().any(|size| url.contains(size)))
                    .unwrap_or(first);
                return Some((*preferred).to_string());
            }
            if let Some(legacy) = self.patterns.legacy_poster.find(&text) {
                return Some(legacy.as_str().to_string());
            }
        }

        all_matches(document.root_element(), &self.poster_container).find_map(|poster| {
            poster
                .value()
                .attrs()
                .filter(|(name, _)| name.starts_with("data-"))
                .map(|(_, value)| value)
                .find(|value| {
                    value.contains("ltrbxd.com")
                        && (value.contains("film-poster") || (value.contains("sm/upload") && value.contains("-crop")))
                })
                .map(ToString::to_string)
        })
    }

    /// Parsed `ld+json` blocks. Letterboxd wraps them in CDATA comments, so
    /// only the outermost `{...}` span is handed to serde.
    fn ld_json_blocks(&self, document: &Html) -> Vec<Value> {
        all_matches(document.root_element(), &self.ld_json)
            .filter_map(|script| {
                let raw: String = script.text().collect();
                let start = raw.find('{')?;
                let end = raw.rfind('}')?;
                let span = raw.get(start..=end)?;
                match serde_json::from_str::<Value>(span) {
                    Ok(value) => Some(value),
                    Err(e) => {
                        trace!("Skipping malformed ld+json block: {}", e);
                        None
                    }
                }
            })
            .collect()
    }

    /// Text following the first element labelled `label` in document order.
    fn labelled_value(&self, document: &Html, label: &str) -> Option<String> {
        let elements: Vec<ElementRef<'_>> = document.root_element().descendants().filter_map(ElementRef::wrap).collect();
        let position = elements.iter().position(|element| {
            self.label.iter().any(|selector| selector.matches(element))
                && element_text(*element).to_lowercase().contains(label)
        })?;

        elements[position + 1..].iter().find_map(|element| {
            let text = element
                .select(&self.anchor)
                .next()
                .map_or_else(|| element_text(*element), element_text);
            (!text.is_empty() && !text.to_lowercase().contains(label)).then_some(text)
        })
    }
}

impl FieldExtractor for LetterboxdFilmParser {
    fn extract(&self, kind: DocumentKind, html: &str) -> PartialRecord {
        let document = Html::parse_document(html);
        match kind {
            DocumentKind::Profile => self.extract_profile(&document),
            DocumentKind::Crew => self.extract_crew(&document),
            DocumentKind::Details => self.extract_details(&document),
            DocumentKind::Genres => self.extract_genres(&document),
        }
    }
}

fn single_selector(selector: &str) -> ParsingResult<Selector> {
    Selector::parse(selector).map_err(|e| super::ParsingError::invalid_selector(selector, e))
}

fn first_match<'a>(scope: ElementRef<'a>, selectors: &[Selector]) -> Option<ElementRef<'a>> {
    selectors.iter().find_map(|selector| scope.select(selector).next())
}

fn all_matches<'a, 'b>(scope: ElementRef<'a>, selectors: &'b [Selector]) -> impl Iterator<Item = ElementRef<'a>> + 'b
where
    'a: 'b,
{
    selectors.iter().flat_map(move |selector| scope.select(selector))
}

/// Texts of the first selector that matches anything
fn texts_of_first_match(scope: ElementRef<'_>, selectors: &[Selector]) -> Vec<String> {
    selectors
        .iter()
        .map(|selector| {
            scope
                .select(selector)
                .map(element_text)
                .filter(|text| !text.is_empty())
                .collect::<Vec<_>>()
        })
        .find(|texts| !texts.is_empty())
        .unwrap_or_default()
}

fn dedup(items: Vec<String>) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    items.into_iter().filter(|item| seen.insert(item.clone())).collect()
}

fn number_value(value: &Value) -> Option<f64> {
    match value {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => text.trim().parse().ok(),
        _ => None,
    }
}

fn string_value(value: &Value) -> Option<String> {
    match value {
        Value::String(text) if !text.trim().is_empty() => Some(text.trim().to_string()),
        Value::Array(items) => items.iter().find_map(string_value),
        Value::Object(map) => map.get("name").and_then(string_value),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parser() -> LetterboxdFilmParser {
        LetterboxdFilmParser::new().unwrap()
    }

    const PROFILE: &str = r#"<html><head>
        <meta name="twitter:data2" content="3.92 out of 5">
        <script type="application/ld+json">
        /* <![CDATA[ */
        {"@type":"Movie","aggregateRating":{"ratingValue":3.9},"duration":"PT2H50M"}
        /* ]]> */
        </script>
        <script>var poster = "https://a.ltrbxd.com/resized/film-poster/5/1/heat-0-230-0-345-crop.jpg?v=1";</script>
        </head><body>
        <div id="tab-cast"><div class="cast-list text-sluglist">
            <a class="text-slug" href="/actor/al-pacino/">Al Pacino</a>
            <a class="text-slug" href="/actor/robert-de-niro/">Robert De Niro</a>
            <a class="text-slug" href="/actor/al-pacino/">Al Pacino</a>
        </div></div>
        </body></html>"#;

    #[test]
    fn profile_extracts_cast_rating_runtime_and_poster() {
        let partial = parser().extract(DocumentKind::Profile, PROFILE);

        assert_eq!(partial.actors, vec!["Al Pacino", "Robert De Niro"]);
        assert_eq!(partial.avg_rating, Some(3.92));
        assert_eq!(partial.runtime_minutes, Some(170));
        assert_eq!(
            partial.poster_url.as_deref(),
            Some("https://a.ltrbxd.com/resized/film-poster/5/1/heat-0-500-0-750-crop.jpg")
        );
        assert!(partial.directors.is_empty());
    }

    #[test]
    fn profile_falls_back_to_ld_json_rating_and_runtime_text() {
        let html = r#"<html><head>
            <script type="application/ld+json">{"aggregateRating":{"ratingValue":"4.1"}}</script>
            </head><body>
            <a href="/actor/someone/">Someone</a>
            <p class="text-footer">118 mins More at IMDb</p>
            <div class="film-poster" data-poster-url="https://a.ltrbxd.com/resized/film-poster/9/x-0-110-0-165-crop.jpg"></div>
            </body></html>"#;
        let partial = parser().extract(DocumentKind::Profile, html);

        assert_eq!(partial.actors, vec!["Someone"]);
        assert_eq!(partial.avg_rating, Some(4.1));
        assert_eq!(partial.runtime_minutes, Some(118));
        assert_eq!(
            partial.poster_url.as_deref(),
            Some("https://a.ltrbxd.com/resized/film-poster/9/x-0-500-0-750-crop.jpg")
        );
    }

    #[test]
    fn cast_is_capped() {
        let links: String = (0..20)
            .map(|i| format!(r#"<a class="text-slug" href="/actor/a{i}/">Actor {i}</a>"#))
            .collect();
        let html = format!(r#"<div class="cast-list">{links}</div>"#);
        let partial = parser().extract(DocumentKind::Profile, &html);

        assert_eq!(partial.actors.len(), MAX_CAST_SIZE);
    }

    #[test]
    fn crew_roles_are_classified() {
        let html = r#"<div id="tab-crew">
            <h3><span>Director</span></h3>
            <div class="text-sluglist"><p><a class="text-slug" href="/director/michael-mann/">Michael Mann</a></p></div>
            <h3><span>Assistant Director</span></h3>
            <div class="text-sluglist"><p><a class="text-slug" href="/assistant-director/x/">Herb Gains</a></p></div>
            <h3><span>Writer</span></h3>
            <div class="text-sluglist"><p><a class="text-slug" href="/writer/michael-mann/">Michael Mann</a></p></div>
            <h3><span>Editors</span></h3>
            <div class="text-sluglist"><p><a class="text-slug">Dov Hoenig</a><a class="text-slug">Pasquale Buba</a></p></div>
            <h3><span>Director of Photography</span></h3>
            <div class="text-sluglist"><p><a class="text-slug">Dante Spinotti</a></p></div>
        </div>"#;
        let partial = parser().extract(DocumentKind::Crew, html);

        assert_eq!(partial.directors, vec!["Michael Mann"]);
        assert_eq!(partial.writers, vec!["Michael Mann"]);
        assert_eq!(partial.editors, vec!["Dov Hoenig", "Pasquale Buba"]);
        assert_eq!(partial.cinematographers, vec!["Dante Spinotti"]);
    }

    #[test]
    fn crew_falls_back_to_director_links() {
        let html = r#"<p>Directed by <a href="/director/ridley-scott/">Ridley Scott</a></p>"#;
        let partial = parser().extract(DocumentKind::Crew, html);

        assert_eq!(partial.directors, vec!["Ridley Scott"]);
    }

    #[test]
    fn details_extracts_language_and_studio() {
        let html = r#"<div id="tab-details">
            <h3><span>Studio</span></h3>
            <div class="text-sluglist"><p><a href="/studio/warner-bros/" class="text-slug">Warner Bros. Pictures</a></p></div>
            <h3><span>Language</span></h3>
            <div class="text-sluglist"><p><a href="/films/language/english/" class="text-slug">English</a></p></div>
        </div>"#;
        let partial = parser().extract(DocumentKind::Details, html);

        assert_eq!(partial.studio.as_deref(), Some("Warner Bros. Pictures"));
        assert_eq!(partial.language.as_deref(), Some("English"));
    }

    #[test]
    fn details_prefers_ld_json_language() {
        let html = r#"<script type="application/ld+json">{"inLanguage":"French"}</script>
            <h3>Studio</h3><div><a href="/somewhere/">Gaumont</a></div>"#;
        let partial = parser().extract(DocumentKind::Details, html);

        assert_eq!(partial.language.as_deref(), Some("French"));
        assert_eq!(partial.studio.as_deref(), Some("Gaumont"));
    }

    #[test]
    fn genres_from_labelled_list() {
        let html = r#"<div id="tab-genres">
            <h3><span>Genres</span></h3>
            <div class="text-sluglist capitalize"><p>
                <a class="text-slug" href="/films/genre/crime/">Crime</a>
                <a class="text-slug" href="/films/genre/drama/">Drama</a>
                <a class="text-slug" href="/films/genre/crime/">Crime</a>
            </p></div>
            <h3><span>Themes</span></h3>
            <div class="text-sluglist"><p><a href="/films/theme/heists/">Heists</a></p></div>
        </div>"#;
        let partial = parser().extract(DocumentKind::Genres, html);

        assert_eq!(partial.genres, vec!["Crime", "Drama"]);
    }

    #[test]
    fn genres_scan_stops_at_themes() {
        let html = r#"<div id="tab-genres">
            <div><a href="/films/genre/horror/">Horror</a><a href="/films/genre/sci-fi/">Science Fiction</a></div>
            <h4>Themes</h4>
            <div><a href="/films/theme/space/">Space</a><a>Show All</a></div>
        </div>"#;
        let partial = parser().extract(DocumentKind::Genres, html);

        assert_eq!(partial.genres, vec!["Horror", "Science Fiction"]);
    }

    #[test]
    fn empty_documents_extract_nothing() {
        for kind in DocumentKind::ALL {
            assert!(parser().extract(kind, "<html></html>").is_empty(), "{:?}", kind);
        }
    }
}
