//! Canonical film paths and the detail documents hanging off them

use serde::Serialize;
use url::Url;

/// The four detail documents fetched for every film
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentKind {
    /// Main film page: cast, global average, runtime, poster
    Profile,
    /// Crew tab: directors, writers, editors, cinematography
    Crew,
    /// Details tab: language, studio
    Details,
    /// Genres tab
    Genres,
}

impl DocumentKind {
    pub const ALL: [Self; 4] = [Self::Profile, Self::Crew, Self::Details, Self::Genres];

    fn suffix(self) -> &'static str {
        match self {
            Self::Profile => "",
            Self::Crew => "/crew/",
            Self::Details => "/details/",
            Self::Genres => "/genres/",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Profile => "profile",
            Self::Crew => "crew",
            Self::Details => "details",
            Self::Genres => "genres",
        }
    }
}

/// A normalized `/film/<slug>` path used as the enrichment key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilmPath(String);

impl FilmPath {
    /// Normalize a raw path or slug taken from a diary row.
    ///
    /// `"heat-1995"`, `"/heat-1995/"`, `"/film/heat-1995/"` and absolute
    /// film URLs all become `/film/heat-1995`. Blank input yields `None`.
    pub fn normalize(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        let absolute = Url::parse(raw).ok().filter(|url| url.has_host());
        let raw = absolute.as_ref().map_or(raw, Url::path);
        if raw.is_empty() || raw == "/" {
            return None;
        }

        let mut path = if raw.starts_with('/') {
            raw.to_string()
        } else {
            format!("/{raw}")
        };
        if !path.contains("/film/") {
            path = format!("/film{path}");
        }
        let path = path.trim_end_matches('/').to_string();

        Some(Self(path))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Absolute URL of `kind` for this film on `base_url`.
    pub fn document_url(&self, base_url: &str, kind: DocumentKind) -> String {
        format!("{}{}{}", base_url.trim_end_matches('/'), self.0, kind.suffix())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_slugs_and_paths() {
        let expected = "/film/heat-1995";
        assert_eq!(FilmPath::normalize("heat-1995").unwrap().as_str(), expected);
        assert_eq!(FilmPath::normalize("/heat-1995/").unwrap().as_str(), expected);
        assert_eq!(FilmPath::normalize("/film/heat-1995/").unwrap().as_str(), expected);
        assert_eq!(
            FilmPath::normalize("https://letterboxd.com/film/heat-1995/").unwrap().as_str(),
            expected
        );
        assert!(FilmPath::normalize("  ").is_none());
        assert!(FilmPath::normalize("https://letterboxd.com/").is_none());
    }

    #[test]
    fn builds_document_urls() {
        let path = FilmPath::normalize("/film/heat-1995/").unwrap();
        let base = "https://letterboxd.com/";

        assert_eq!(
            path.document_url(base, DocumentKind::Profile),
            "https://letterboxd.com/film/heat-1995"
        );
        assert_eq!(
            path.document_url(base, DocumentKind::Crew),
            "https://letterboxd.com/film/heat-1995/crew/"
        );
        assert_eq!(
            path.document_url(base, DocumentKind::Genres),
            "https://letterboxd.com/film/heat-1995/genres/"
        );
    }
}
