//! HTTP client for search-result and event-detail pages.
//!
//! Every attempt, including retries, funnels through the shared
//! [`RateGovernor`] before touching the network, so the retry schedule is
//! linear with the governor's delay as the spacing. 4xx responses fail
//! immediately (retrying a client error wastes budget); 5xx and network
//! failures are retried up to the configured budget and then surfaced as a
//! single [`ScraperError::Fetch`] carrying the last status seen.

use std::sync::Arc;
use std::time::Duration;

use rand::seq::IndexedRandom;
use reqwest::Client;

use evescout_core::ScraperConfig;

use crate::browser::BrowserPool;
use crate::error::ScraperError;
use crate::governor::RateGovernor;
use crate::retry::retry_transient;

/// Fixed pool for user-agent rotation. Entry 0 is the fixed agent when
/// rotation is disabled.
const USER_AGENTS: [&str; 5] = [
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:89.0) Gecko/20100101 Firefox/89.0",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/14.1.1 Safari/605.1.15",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36 Edg/91.0.864.59",
];

/// A successfully fetched page.
#[derive(Debug)]
pub struct FetchedPage {
    pub html: String,
    pub status: u16,
}

pub struct EventbriteClient {
    http: Client,
    governor: Arc<RateGovernor>,
    browser: Option<BrowserPool>,
    max_retries: u32,
    user_agent_rotation: bool,
}

impl EventbriteClient {
    /// Builds a client from pipeline configuration, sharing `governor` with
    /// any sibling clients in the process.
    ///
    /// # Errors
    ///
    /// Returns [`ScraperError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed.
    pub fn new(
        config: &ScraperConfig,
        governor: Arc<RateGovernor>,
    ) -> Result<Self, ScraperError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .build()?;

        // A pooled browser keeps per-call cost at navigation time only; the
        // governor serializes outbound requests anyway, so contention on the
        // single session is not the bottleneck.
        let browser = config
            .use_browser
            .then(|| BrowserPool::new(Duration::from_secs(config.request_timeout_secs)));

        Ok(Self {
            http,
            governor,
            browser,
            max_retries: config.max_retries,
            user_agent_rotation: config.user_agent_rotation,
        })
    }

    /// Fetches one page, retrying transient failures.
    ///
    /// # Errors
    ///
    /// - [`ScraperError::NotFound`]: HTTP 404 (not retried).
    /// - [`ScraperError::UnexpectedStatus`]: other 4xx (not retried).
    /// - [`ScraperError::Fetch`]: 5xx, timeout, or connection failure after
    ///   the retry budget is exhausted; carries the last status seen.
    pub async fn fetch(&self, url: &str) -> Result<FetchedPage, ScraperError> {
        retry_transient(self.max_retries, || self.fetch_once(url))
            .await
            .map_err(|err| self.wrap_exhausted(url, err))
    }

    async fn fetch_once(&self, url: &str) -> Result<FetchedPage, ScraperError> {
        self.governor.acquire().await;

        if let Some(browser) = &self.browser {
            let html = browser.render(url).await?;
            return Ok(FetchedPage { html, status: 200 });
        }

        let response = self
            .http
            .get(url)
            .header(
                reqwest::header::ACCEPT,
                "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8",
            )
            .header(reqwest::header::ACCEPT_LANGUAGE, "en-US,en;q=0.5")
            .header(reqwest::header::USER_AGENT, self.pick_user_agent())
            .send()
            .await?;

        let status = response.status();

        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(ScraperError::NotFound {
                url: url.to_string(),
            });
        }
        if status.is_client_error() {
            return Err(ScraperError::UnexpectedStatus {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }
        if status.is_server_error() {
            return Err(ScraperError::ServerStatus {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        let html = response.text().await?;
        tracing::debug!(url, bytes = html.len(), "page fetched");
        Ok(FetchedPage {
            html,
            status: status.as_u16(),
        })
    }

    /// Folds a retry-exhausted transient error into a single `Fetch` error
    /// carrying the last status; non-retried errors pass through unchanged.
    fn wrap_exhausted(&self, url: &str, err: ScraperError) -> ScraperError {
        let attempts = self.max_retries + 1;
        match err {
            ScraperError::ServerStatus { status, .. } => ScraperError::Fetch {
                url: url.to_string(),
                attempts,
                last_status: Some(status),
                reason: format!("server error {status}"),
            },
            ScraperError::Http(e) => ScraperError::Fetch {
                url: url.to_string(),
                attempts,
                last_status: e.status().map(|s| s.as_u16()),
                reason: e.to_string(),
            },
            ScraperError::Browser { reason } => ScraperError::Fetch {
                url: url.to_string(),
                attempts,
                last_status: None,
                reason,
            },
            other => other,
        }
    }

    fn pick_user_agent(&self) -> &'static str {
        if self.user_agent_rotation {
            USER_AGENTS
                .choose(&mut rand::rng())
                .copied()
                .unwrap_or(USER_AGENTS[0])
        } else {
            USER_AGENTS[0]
        }
    }
}
