//! Retry with exponential back-off and jitter for feed fetches.
//!
//! [`retry_with_backoff`] wraps a single fetch attempt and retries transport
//! failures, per-attempt timeouts, HTTP 429 and 5xx. Everything else (4xx,
//! oversized bodies) would fail the same way again and is returned at once.

use std::future::Future;
use std::time::Duration;

use crate::error::ScraperError;

const MAX_DELAY_MS: u64 = 30_000;

/// Returns `true` for errors that are worth retrying after a back-off delay.
pub(crate) fn is_retriable(err: &ScraperError) -> bool {
    match err {
        ScraperError::Timeout { .. } | ScraperError::Http(_) => true,
        ScraperError::UnexpectedStatus { status, .. } => {
            *status == 429 || (500..600).contains(status)
        }
        ScraperError::BodyTooLarge { .. }
        | ScraperError::UndetectedFeedType
        | ScraperError::Feed(_) => false,
    }
}

/// Runs `operation` with up to `max_retries` additional attempts on transient errors.
///
/// The wait before retry `n` is `backoff_base_ms * 2^(n-1)` with ±25 % jitter,
/// capped at 30 s. When every attempt fails the last error is returned, so a
/// run of timeouts still surfaces as [`ScraperError::Timeout`].
pub(crate) async fn retry_with_backoff<T, F, Fut>(
    max_retries: u32,
    backoff_base_ms: u64,
    mut operation: F,
) -> Result<T, ScraperError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, ScraperError>>,
{
    let mut attempt = 0u32;
    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(err) => {
                if !is_retriable(&err) || attempt >= max_retries {
                    return Err(err);
                }
                attempt += 1;
                let computed = backoff_base_ms.saturating_mul(1u64 << (attempt - 1).min(10));
                let capped = computed.min(MAX_DELAY_MS);
                #[allow(
                    clippy::cast_possible_truncation,
                    clippy::cast_sign_loss,
                    clippy::cast_precision_loss
                )]
                let delay_ms = (capped as f64 * (rand::random::<f64>() * 0.5 + 0.75)) as u64;
                tracing::warn!(
                    attempt,
                    max_retries,
                    delay_ms,
                    error = %err,
                    "fetch: transient error, retrying after back-off"
                );
                tokio::time::sleep(Duration::from_millis(delay_ms)).await;
            }
        }
    }
}
