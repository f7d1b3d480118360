//! HTTP client for crawling the tournament results site.
//!
//! Pages are fetched sequentially through a rate limiter so the crawl never
//! hammers the site, and retryable failures are re-attempted with backoff
//! before a page is given up on.

use std::num::NonZeroU32;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use governor::clock::DefaultClock;
use governor::state::direct::NotKeyed;
use governor::state::InMemoryState;
use governor::{Quota, RateLimiter};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, USER_AGENT};
use reqwest::{Client, StatusCode};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::domain::services::PageFetcher;
use crate::infrastructure::retry::RetryPolicy;

/// Identity presented to the results site. The site serves reduced markup to
/// obvious bots, so the header set matches a desktop browser.
const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/121.0.0.0 Safari/537.36";
const BROWSER_ACCEPT: &str =
    "text/html,application/xhtml+xml,application/xml;q=0.9,image/avif,image/webp,image/apng,*/*;q=0.8";
const BROWSER_ACCEPT_LANGUAGE: &str = "en-US,en;q=0.9";

/// Minimum spacing between page requests.
const PAGE_REQUEST_INTERVAL: Duration = Duration::from_millis(250);

const MAX_REDIRECTS: usize = 10;

#[derive(Error, Debug)]
pub enum FetchError {
    #[error("request to {url} returned status {status}")]
    Status { status: StatusCode, url: String },

    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),
}

impl FetchError {
    /// Server-side throttling and transient transport faults are worth another
    /// attempt; client errors (bad URL, vanished page) are not.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Status { status, .. } => {
                status.is_server_error() || *status == StatusCode::TOO_MANY_REQUESTS
            }
            Self::Transport(_) => true,
        }
    }
}

#[derive(Debug, Clone)]
pub struct HttpClientConfig {
    pub timeout_secs: u64,
    pub max_retries: u32,
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 30,
            max_retries: 3,
        }
    }
}

pub struct HttpClient {
    client: Client,
    rate_limiter: RateLimiter<NotKeyed, InMemoryState, DefaultClock>,
    retry: RetryPolicy,
}

impl HttpClient {
    pub fn new(config: HttpClientConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static(BROWSER_USER_AGENT));
        headers.insert(ACCEPT, HeaderValue::from_static(BROWSER_ACCEPT));
        headers.insert(
            ACCEPT_LANGUAGE,
            HeaderValue::from_static(BROWSER_ACCEPT_LANGUAGE),
        );

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .default_headers(headers)
            .redirect(reqwest::redirect::Policy::limited(MAX_REDIRECTS))
            .build()
            .context("failed to build page-fetch HTTP client")?;

        let quota = Quota::with_period(PAGE_REQUEST_INTERVAL)
            .context("page request interval must be non-zero")?
            .allow_burst(NonZeroU32::MIN);

        Ok(Self {
            client,
            rate_limiter: RateLimiter::direct(quota),
            retry: RetryPolicy::new(config.max_retries),
        })
    }

    /// Fetch a page body, retrying retryable failures up to the configured
    /// budget. Every attempt waits its turn at the rate limiter first.
    pub async fn get_text(&self, url: &str) -> Result<String, FetchError> {
        let mut attempt = 0;
        loop {
            self.rate_limiter.until_ready().await;
            match self.try_get_text(url).await {
                Ok(body) => return Ok(body),
                Err(err) if err.is_retryable() && attempt < self.retry.max_retries() => {
                    attempt += 1;
                    let delay = self.retry.backoff(attempt);
                    warn!(
                        "fetch attempt {} for {} failed ({}); retrying in {:?}",
                        attempt, url, err, delay
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(err) => return Err(err),
            }
        }
    }

    async fn try_get_text(&self, url: &str) -> Result<String, FetchError> {
        info!("Fetching: {}", url);
        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                status,
                url: url.to_string(),
            });
        }

        let body = response.text().await?;
        debug!("Fetched {} ({} bytes)", url, body.len());
        Ok(body)
    }
}

#[async_trait]
impl PageFetcher for HttpClient {
    async fn fetch_page(&self, url: &str) -> Result<String> {
        Ok(self.get_text(url).await?)
    }
}
