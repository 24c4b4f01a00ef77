//! Error classification and the deduplicating error log.
//!
//! Every failure in a feed's pipeline is classified exactly once. Timeouts
//! and undetectable documents are informational and only logged; duplicates
//! are expected and dropped; everything else is written to the error log,
//! where repeats of the same `(error type, feed)` collapse into one row.

use chrono::{DateTime, Utc};
use feedhub_core::ErrorType;
use feedhub_db::{DbError, ErrorLogRow, NewErrorLog};
use feedhub_scraper::ScraperError;
use uuid::Uuid;

use crate::error::PipelineError;
use crate::store::Store;

/// What to do with a pipeline failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    /// Logged at info level and otherwise ignored.
    Informational,
    /// A post that is already stored.
    Duplicate,
    /// Recorded in the error log.
    Durable {
        error_type: ErrorType,
        status_code: Option<u16>,
    },
}

#[must_use]
pub fn classify(err: &PipelineError) -> Disposition {
    match err {
        PipelineError::Scraper(e) => match e {
            ScraperError::Timeout { .. } | ScraperError::UndetectedFeedType => {
                Disposition::Informational
            }
            ScraperError::UnexpectedStatus { status, .. } => Disposition::Durable {
                error_type: ErrorType::HttpStatus,
                status_code: Some(*status),
            },
            ScraperError::Http(_) | ScraperError::BodyTooLarge { .. } => Disposition::Durable {
                error_type: ErrorType::Fetch,
                status_code: e.status_code(),
            },
            ScraperError::Feed(_) => Disposition::Durable {
                error_type: ErrorType::Parse,
                status_code: None,
            },
        },
        PipelineError::Db(e) if e.is_unique_violation() => Disposition::Duplicate,
        PipelineError::Db(_) => Disposition::Durable {
            error_type: ErrorType::Storage,
            status_code: None,
        },
    }
}

/// Records one occurrence of `error_type` for `feed_id`.
///
/// Creates the log row on first occurrence; afterwards the existing row's
/// counters are bumped atomically and the message and status are replaced.
///
/// # Errors
///
/// Returns the store's [`DbError`] if the upsert fails.
pub async fn record_error<S: Store + ?Sized>(
    store: &S,
    error_type: ErrorType,
    feed_id: Uuid,
    message: &str,
    status_code: Option<u16>,
    occurred_at: DateTime<Utc>,
) -> Result<ErrorLogRow, DbError> {
    store
        .upsert_error_log(&NewErrorLog {
            error_type,
            feed_id,
            message: message.to_owned(),
            status_code,
            occurred_at,
        })
        .await
}

/// Classifies `err`, logs it, and records it if it is durable.
///
/// Never fails: a failure to write the error log is itself only logged.
pub async fn report_error<S: Store + ?Sized>(
    store: &S,
    feed_id: Uuid,
    err: &PipelineError,
) -> Disposition {
    let disposition = classify(err);
    match disposition {
        Disposition::Informational => {
            tracing::info!(feed_id = %feed_id, error = %err, "pipeline: skipping feed this cycle");
        }
        Disposition::Duplicate => {
            tracing::debug!(feed_id = %feed_id, "pipeline: post already stored");
        }
        Disposition::Durable {
            error_type,
            status_code,
        } => {
            tracing::warn!(
                feed_id = %feed_id,
                error_type = %error_type,
                status_code,
                error = %err,
                "pipeline: recording feed error"
            );
            let message = err.to_string();
            if let Err(e) =
                record_error(store, error_type, feed_id, &message, status_code, Utc::now()).await
            {
                tracing::error!(
                    feed_id = %feed_id,
                    error_type = %error_type,
                    error = %e,
                    "pipeline: failed to write error log"
                );
            }
        }
    }
    disposition
}
