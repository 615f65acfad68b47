//! HTTP client for diary and film pages with rate limiting and cancellation
//!
//! [`PageSource`] is the seam the crawling stages fetch through; the
//! reqwest-backed [`HttpClient`] is the production implementation.

use std::num::NonZeroU32;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use governor::{
    Quota, RateLimiter,
    clock::DefaultClock,
    state::{InMemoryState, direct::NotKeyed},
};
use reqwest::{
    Client,
    header::{ACCEPT, HeaderMap, HeaderValue, USER_AGENT},
};
use thiserror::Error;
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;

use super::config::HttpSettings;

/// Failure to obtain any HTTP response at all
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    #[error("Request timed out: {url}")]
    Timeout { url: String },

    #[error("Connection failed for {url}: {message}")]
    Connection { url: String, message: String },

    #[error("Failed to read response body from {url}: {message}")]
    Body { url: String, message: String },

    #[error("Request cancelled: {url}")]
    Cancelled { url: String },
}

impl TransportError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled { .. })
    }

    fn from_reqwest(url: &str, error: &reqwest::Error) -> Self {
        if error.is_timeout() {
            Self::Timeout { url: url.to_string() }
        } else {
            Self::Connection {
                url: url.to_string(),
                message: error.to_string(),
            }
        }
    }
}

/// Status and body of a completed request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageResponse {
    pub status: u16,
    pub body: String,
}

impl PageResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Anything that can fetch a page by URL
#[async_trait]
pub trait PageSource: Send + Sync {
    /// Fetch `url`. Non-2xx statuses are returned as responses, not errors.
    async fn fetch_page(&self, url: &str, cancel: &CancellationToken) -> Result<PageResponse, TransportError>;
}

/// HTTP client configuration for crawling
#[derive(Debug, Clone, serde::Serialize)]
pub struct HttpClientConfig {
    pub user_agent: String,
    pub timeout_seconds: u64,
    pub max_requests_per_second: Option<u32>,
    /// Cap on concurrent requests and idle pooled connections
    pub max_in_flight: usize,
    pub follow_redirects: bool,
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self::from_settings(&HttpSettings::default(), super::config::defaults::MAX_CONCURRENCY)
    }
}

impl HttpClientConfig {
    /// Size the client for `max_concurrency` films with four documents each.
    pub fn from_settings(settings: &HttpSettings, max_concurrency: usize) -> Self {
        Self {
            user_agent: settings.user_agent.clone(),
            timeout_seconds: settings.request_timeout_seconds,
            max_requests_per_second: settings.max_requests_per_second,
            max_in_flight: max_concurrency.max(1) * 4,
            follow_redirects: true,
        }
    }
}

/// reqwest client with an in-flight cap and optional rate limiting
pub struct HttpClient {
    client: Client,
    rate_limiter: Option<RateLimiter<NotKeyed, InMemoryState, DefaultClock>>,
    in_flight: Semaphore,
    config: HttpClientConfig,
}

impl HttpClient {
    /// Create a new HTTP client with the given configuration
    pub fn new(config: HttpClientConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&config.user_agent).context("Invalid user agent")?,
        );
        headers.insert(ACCEPT, HeaderValue::from_static("text/html,application/xhtml+xml"));

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .default_headers(headers)
            .pool_max_idle_per_host(config.max_in_flight)
            .gzip(true)
            .brotli(true)
            .redirect(if config.follow_redirects {
                reqwest::redirect::Policy::limited(10)
            } else {
                reqwest::redirect::Policy::none()
            })
            .build()
            .context("Failed to create HTTP client")?;

        let rate_limiter = match config.max_requests_per_second {
            Some(rate) => {
                let rate = NonZeroU32::new(rate).context("Rate limit must be greater than 0")?;
                Some(RateLimiter::direct(Quota::per_second(rate)))
            }
            None => None,
        };

        Ok(Self {
            client,
            rate_limiter,
            in_flight: Semaphore::new(config.max_in_flight.max(1)),
            config,
        })
    }

    /// Get the configuration
    pub fn config(&self) -> &HttpClientConfig {
        &self.config
    }

    async fn send(&self, url: &str) -> Result<PageResponse, TransportError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| TransportError::from_reqwest(url, &e))?;
        let status = response.status().as_u16();
        let body = response.text().await.map_err(|e| {
            if e.is_timeout() {
                TransportError::Timeout { url: url.to_string() }
            } else {
                TransportError::Body {
                    url: url.to_string(),
                    message: e.to_string(),
                }
            }
        })?;

        tracing::debug!("Fetched {} ({}, {} chars)", url, status, body.len());
        Ok(PageResponse { status, body })
    }
}

#[async_trait]
impl PageSource for HttpClient {
    async fn fetch_page(&self, url: &str, cancel: &CancellationToken) -> Result<PageResponse, TransportError> {
        let cancelled = || TransportError::Cancelled { url: url.to_string() };
        if cancel.is_cancelled() {
            return Err(cancelled());
        }

        let _permit = tokio::select! {
            permit = self.in_flight.acquire() => permit.map_err(|_| cancelled())?,
            () = cancel.cancelled() => return Err(cancelled()),
        };

        if let Some(limiter) = &self.rate_limiter {
            tokio::select! {
                () = limiter.until_ready() => {},
                () = cancel.cancelled() => return Err(cancelled()),
            }
        }

        tokio::select! {
            result = self.send(url) => result,
            () = cancel.cancelled() => {
                tracing::warn!("HTTP request cancelled for URL: {}", url);
                Err(cancelled())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_client_creation() {
        let client = HttpClient::new(HttpClientConfig::default());
        assert!(client.is_ok());
    }

    #[test]
    fn in_flight_cap_scales_with_concurrency() {
        let config = HttpClientConfig::from_settings(&HttpSettings::default(), 5);
        assert_eq!(config.max_in_flight, 20);
        assert!(config.max_requests_per_second.is_none());
    }

    #[test]
    fn zero_rate_limit_is_rejected() {
        let config = HttpClientConfig {
            max_requests_per_second: Some(0),
            ..HttpClientConfig::default()
        };
        assert!(HttpClient::new(config).is_err());
    }

    #[test]
    fn success_range() {
        assert!(PageResponse::new(200, "").is_success());
        assert!(!PageResponse::new(301, "").is_success());
        assert!(!PageResponse::new(429, "").is_success());
    }

    #[tokio::test]
    async fn stalled_body_is_reported_as_timeout() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let address = listener.local_addr().unwrap();
        std::thread::spawn(move || {
            use std::io::Write;
            if let Ok((mut stream, _)) = listener.accept() {
                let mut request = [0u8; 1024];
                let _ = std::io::Read::read(&mut stream, &mut request);
                let _ = stream.write_all(b"HTTP/1.1 200 OK\r\nContent-Length: 100\r\n\r\npartial");
                let _ = stream.flush();
                std::thread::sleep(Duration::from_secs(3));
            }
        });

        let client = HttpClient::new(HttpClientConfig {
            timeout_seconds: 1,
            ..HttpClientConfig::default()
        })
        .unwrap();
        let url = format!("http://{address}/film/heat-1995");
        let result = client.fetch_page(&url, &CancellationToken::new()).await;

        assert!(matches!(result, Err(TransportError::Timeout { .. })), "got {result:?}");
    }

    #[tokio::test]
    async fn cancelled_token_short_circuits() {
        let client = HttpClient::new(HttpClientConfig::default()).unwrap();
        let token = CancellationToken::new();
        token.cancel();

        let result = client.fetch_page("https://example.invalid/", &token).await;
        assert!(matches!(result, Err(TransportError::Cancelled { .. })));
    }
}
