//! Test utilities for film-diary-stats
//!
//! An in-memory [`PageSource`] that replays scripted responses per URL, plus
//! HTML fixture builders shaped like real diary and film pages. Used by the
//! unit tests and by the integration tests under `tests/`.

#![allow(clippy::missing_panics_doc)]

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::infrastructure::http_client::{PageResponse, PageSource, TransportError};

/// One scripted reply
#[derive(Debug, Clone)]
pub enum Scripted {
    Page(PageResponse),
    Fail(TransportError),
    /// Never completes; resolves to `Cancelled` once the token fires
    Hang,
}

impl Scripted {
    pub fn ok(body: impl Into<String>) -> Self {
        Self::Page(PageResponse::new(200, body))
    }

    pub fn status(status: u16) -> Self {
        Self::Page(PageResponse::new(status, ""))
    }

    pub fn timeout(url: &str) -> Self {
        Self::Fail(TransportError::Timeout { url: url.to_string() })
    }
}

#[derive(Default)]
struct Route {
    queue: VecDeque<Scripted>,
    fallback: Option<Scripted>,
}

/// Replays scripted replies; unknown URLs answer 404.
///
/// Queued replies are consumed first, then the route's fallback repeats.
#[derive(Default)]
pub struct ScriptedPageSource {
    routes: Mutex<HashMap<String, Route>>,
    requests: Mutex<Vec<String>>,
    latency: Duration,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl ScriptedPageSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Hold every request open for `latency` before answering.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Answer every request for `url` with `reply`.
    pub fn always(&self, url: &str, reply: Scripted) -> &Self {
        self.routes.lock().unwrap().entry(url.to_string()).or_default().fallback = Some(reply);
        self
    }

    /// Answer the next requests for `url` with `replies`, in order.
    pub fn sequence(&self, url: &str, replies: impl IntoIterator<Item = Scripted>) -> &Self {
        self.routes
            .lock()
            .unwrap()
            .entry(url.to_string())
            .or_default()
            .queue
            .extend(replies);
        self
    }

    /// Every URL requested so far, in request order
    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }

    pub fn request_count(&self, url: &str) -> usize {
        self.requests.lock().unwrap().iter().filter(|requested| *requested == url).count()
    }

    /// Highest number of requests that were open at the same time
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    fn next_reply(&self, url: &str) -> Scripted {
        let mut routes = self.routes.lock().unwrap();
        match routes.get_mut(url) {
            Some(route) => route
                .queue
                .pop_front()
                .or_else(|| route.fallback.clone())
                .unwrap_or_else(|| Scripted::status(404)),
            None => Scripted::status(404),
        }
    }
}

#[async_trait]
impl PageSource for ScriptedPageSource {
    async fn fetch_page(&self, url: &str, cancel: &CancellationToken) -> Result<PageResponse, TransportError> {
        self.requests.lock().unwrap().push(url.to_string());
        let reply = self.next_reply(url);

        let open = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(open, Ordering::SeqCst);

        let cancelled = || TransportError::Cancelled { url: url.to_string() };
        let latency = self.latency;
        let hang = matches!(reply, Scripted::Hang);
        let wait = async move {
            if !latency.is_zero() {
                tokio::time::sleep(latency).await;
            }
            if hang {
                std::future::pending::<()>().await;
            }
        };
        let result = tokio::select! {
            () = wait => match reply {
                Scripted::Page(page) => Ok(page),
                Scripted::Fail(error) => Err(error),
                Scripted::Hang => Err(cancelled()),
            },
            () = cancel.cancelled() => Err(cancelled()),
        };

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        result
    }
}

/// One diary row: `"Title (Year)"`, film link, `YYYY/MM/DD` and rating in half stars
pub struct DiaryRow<'a> {
    pub name: &'a str,
    pub link: &'a str,
    pub date: &'a str,
    pub half_stars: Option<u8>,
}

/// A diary list page containing `rows` in order
pub fn diary_page_html(rows: &[DiaryRow<'_>]) -> String {
    let body: String = rows
        .iter()
        .map(|row| {
            let rating = row
                .half_stars
                .map(|units| format!(r#"<span class="rating rated-{units}"></span>"#))
                .unwrap_or_default();
            format!(
                r#"<tr class="diary-entry-row">
                    <td class="td-day"><a class="daydate" href="/user/films/diary/for/{date}/">1</a></td>
                    <td class="td-film-details"><div data-film-id="1" data-item-name="{name}" data-item-link="{link}"></div></td>
                    <td class="td-rating">{rating}</td>
                </tr>"#,
                date = row.date,
                name = row.name,
                link = row.link,
            )
        })
        .collect();
    format!("<html><body><table><tbody>{body}</tbody></table></body></html>")
}

/// A diary page with no entries
pub fn empty_diary_page_html() -> String {
    "<html><body><p>No diary entries</p></body></html>".to_string()
}

/// A film profile page with cast, global rating and runtime
pub fn profile_html(actors: &[&str], avg_rating: f64, runtime_minutes: u32) -> String {
    let cast: String = actors
        .iter()
        .map(|actor| format!(r#"<a class="text-slug" href="/actor/x/">{actor}</a>"#))
        .collect();
    format!(
        r#"<html><head>
        <meta name="twitter:data2" content="{avg_rating} out of 5">
        <script type="application/ld+json">{{"duration":"PT{runtime_minutes}M"}}</script>
        </head><body><div class="cast-list text-sluglist">{cast}</div></body></html>"#
    )
}

/// A crew tab listing one section per `(role, names)` pair
pub fn crew_html(sections: &[(&str, &[&str])]) -> String {
    let body: String = sections
        .iter()
        .map(|(role, names)| {
            let links: String = names
                .iter()
                .map(|name| format!(r#"<a class="text-slug">{name}</a>"#))
                .collect();
            format!(r#"<h3><span>{role}</span></h3><div class="text-sluglist"><p>{links}</p></div>"#)
        })
        .collect();
    format!(r#"<html><body><div id="tab-crew">{body}</div></body></html>"#)
}

/// A details tab with studio and language
pub fn details_html(studio: &str, language: &str) -> String {
    format!(
        r#"<html><body><div id="tab-details">
        <h3><span>Studio</span></h3>
        <div class="text-sluglist"><p><a href="/studio/x/" class="text-slug">{studio}</a></p></div>
        <h3><span>Language</span></h3>
        <div class="text-sluglist"><p><a href="/films/language/x/" class="text-slug">{language}</a></p></div>
        </div></body></html>"#
    )
}

/// A genres tab
pub fn genres_html(genres: &[&str]) -> String {
    let links: String = genres
        .iter()
        .map(|genre| format!(r#"<a class="text-slug" href="/films/genre/x/">{genre}</a>"#))
        .collect();
    format!(
        r#"<html><body><div id="tab-genres">
        <h3><span>Genres</span></h3><div class="text-sluglist"><p>{links}</p></div>
        </div></body></html>"#
    )
}
