use std::time::Duration;

use reqwest::Client;

use crate::error::ScraperError;
use crate::retry::retry_with_backoff;

/// Largest response body accepted from a feed server.
pub const MAX_BODY_BYTES: usize = 10 * 1024 * 1024;

const ACCEPT_FEEDS: &str =
    "application/rss+xml, application/atom+xml, application/xml;q=0.9, text/xml;q=0.9, */*;q=0.5";

/// HTTP client for feed documents.
///
/// Every attempt is bounded by the configured timeout. Transport errors,
/// timeouts, 429 and 5xx responses are retried with exponential back-off up to
/// `max_retries` additional attempts; other non-2xx statuses fail immediately.
pub struct FeedClient {
    client: Client,
    /// Maximum number of retry attempts after the first failure.
    max_retries: u32,
    /// Base delay for exponential back-off: `backoff_base_ms * 2^attempt`.
    backoff_base_ms: u64,
    max_body_bytes: usize,
}

impl FeedClient {
    /// Creates a `FeedClient` with a per-attempt timeout, `User-Agent`, and retry policy.
    ///
    /// # Errors
    ///
    /// Returns [`ScraperError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed (e.g., invalid TLS config).
    pub fn new(
        timeout_secs: u64,
        user_agent: &str,
        max_retries: u32,
        backoff_base_ms: u64,
    ) -> Result<Self, ScraperError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(timeout_secs.min(10)))
            .user_agent(user_agent)
            .build()?;
        Ok(Self {
            client,
            max_retries,
            backoff_base_ms,
            max_body_bytes: MAX_BODY_BYTES,
        })
    }

    /// Builds a client from the fetch settings in [`feedhub_core::AppConfig`].
    ///
    /// # Errors
    ///
    /// Same as [`FeedClient::new`].
    pub fn from_app_config(config: &feedhub_core::AppConfig) -> Result<Self, ScraperError> {
        Self::new(
            config.fetch_timeout_secs,
            &config.fetch_user_agent,
            config.fetch_max_retries,
            config.fetch_retry_backoff_base_ms,
        )
    }

    /// Overrides the response body cap (defaults to [`MAX_BODY_BYTES`]).
    #[must_use]
    pub fn with_max_body_bytes(mut self, limit: usize) -> Self {
        self.max_body_bytes = limit;
        self
    }

    /// Downloads `url` and returns the raw body.
    ///
    /// # Errors
    ///
    /// - [`ScraperError::Timeout`] when the last attempt hit the per-attempt timeout.
    /// - [`ScraperError::UnexpectedStatus`] for non-2xx responses (after retries for 429/5xx).
    /// - [`ScraperError::BodyTooLarge`] when the body exceeds the cap (not retried).
    /// - [`ScraperError::Http`] for network or TLS failures after all retries.
    pub async fn fetch(&self, url: &str) -> Result<Vec<u8>, ScraperError> {
        retry_with_backoff(self.max_retries, self.backoff_base_ms, || self.fetch_once(url)).await
    }

    async fn fetch_once(&self, url: &str) -> Result<Vec<u8>, ScraperError> {
        let mut response = self
            .client
            .get(url)
            .header(reqwest::header::ACCEPT, ACCEPT_FEEDS)
            .send()
            .await
            .map_err(|e| request_error(url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ScraperError::UnexpectedStatus {
                status: status.as_u16(),
                url: url.to_owned(),
            });
        }

        let limit = self.max_body_bytes;
        let too_large = || ScraperError::BodyTooLarge {
            url: url.to_owned(),
            limit,
        };

        if response
            .content_length()
            .is_some_and(|len| len > u64::try_from(limit).unwrap_or(u64::MAX))
        {
            return Err(too_large());
        }

        // Content-Length may be absent or wrong, so the cap is enforced while reading too.
        let mut body = Vec::new();
        while let Some(chunk) = response.chunk().await.map_err(|e| request_error(url, e))? {
            if body.len() + chunk.len() > limit {
                return Err(too_large());
            }
            body.extend_from_slice(&chunk);
        }

        tracing::debug!(url, bytes = body.len(), "fetch: downloaded feed");
        Ok(body)
    }
}

fn request_error(url: &str, err: reqwest::Error) -> ScraperError {
    if err.is_timeout() {
        ScraperError::Timeout {
            url: url.to_owned(),
        }
    } else {
        ScraperError::Http(err)
    }
}
