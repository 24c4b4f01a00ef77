//! Database operations for the deduplicated `scraper_error_logs` table.

use chrono::{DateTime, Utc};
use feedhub_core::{CoreError, ErrorType};
use sqlx::PgPool;
use uuid::Uuid;

use crate::DbError;

/// A row from the `scraper_error_logs` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ErrorLogRow {
    pub id: i64,
    pub error_type: String,
    pub feed_id: Uuid,
    pub message: String,
    pub status_code: Option<i32>,
    pub retry_attempts: i32,
    pub admin_notified: bool,
    pub resolved: bool,
    pub resolution_notes: Option<String>,
    /// First occurrence; never changes after insert.
    pub occurred_at: DateTime<Utc>,
    pub occurrence_count: i32,
    pub last_occurrence: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ErrorLogRow {
    /// Parses the stored `error_type` tag.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::UnknownErrorType`] for an unrecognised tag.
    pub fn kind(&self) -> Result<ErrorType, CoreError> {
        self.error_type.parse()
    }
}

/// One observed failure to record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewErrorLog {
    pub error_type: ErrorType,
    pub feed_id: Uuid,
    pub message: String,
    pub status_code: Option<u16>,
    pub occurred_at: DateTime<Utc>,
}

/// Records a failure, collapsing repeats of the same `(error_type, feed_id)`.
///
/// The first occurrence inserts a row with `occurrence_count = 1`. Every
/// repeat increments `occurrence_count` and `retry_attempts`, refreshes
/// `last_occurrence`, overwrites `message`/`status_code` with the latest
/// values and reopens the row if it had been resolved. The conflict is
/// resolved in a single statement so concurrent fetch tasks cannot lose
/// increments.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the upsert fails.
pub async fn upsert_error_log(pool: &PgPool, entry: &NewErrorLog) -> Result<ErrorLogRow, DbError> {
    let row = sqlx::query_as::<_, ErrorLogRow>(
        "INSERT INTO scraper_error_logs \
             (error_type, feed_id, message, status_code, retry_attempts, \
              occurred_at, occurrence_count, last_occurrence) \
         VALUES ($1, $2, $3, $4, 0, $5, 1, $5) \
         ON CONFLICT (error_type, feed_id) DO UPDATE SET \
             message          = EXCLUDED.message, \
             status_code      = EXCLUDED.status_code, \
             retry_attempts   = scraper_error_logs.retry_attempts + 1, \
             occurrence_count = scraper_error_logs.occurrence_count + 1, \
             last_occurrence  = EXCLUDED.last_occurrence, \
             resolved         = FALSE, \
             updated_at       = NOW() \
         RETURNING id, error_type, feed_id, message, status_code, retry_attempts, \
                   admin_notified, resolved, resolution_notes, occurred_at, \
                   occurrence_count, last_occurrence, created_at, updated_at",
    )
    .bind(entry.error_type.as_str())
    .bind(entry.feed_id)
    .bind(&entry.message)
    .bind(entry.status_code.map(i32::from))
    .bind(entry.occurred_at)
    .fetch_one(pool)
    .await?;

    Ok(row)
}

/// Fetches the log row for `(error_type, feed_id)`, if any.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_error_log(
    pool: &PgPool,
    error_type: ErrorType,
    feed_id: Uuid,
) -> Result<Option<ErrorLogRow>, DbError> {
    let row = sqlx::query_as::<_, ErrorLogRow>(
        "SELECT id, error_type, feed_id, message, status_code, retry_attempts, \
                admin_notified, resolved, resolution_notes, occurred_at, \
                occurrence_count, last_occurrence, created_at, updated_at \
         FROM scraper_error_logs \
         WHERE error_type = $1 AND feed_id = $2",
    )
    .bind(error_type.as_str())
    .bind(feed_id)
    .fetch_optional(pool)
    .await?;

    Ok(row)
}

/// Returns one page of error logs, most recently seen first.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_error_logs(
    pool: &PgPool,
    unresolved_only: bool,
    limit: i64,
    offset: i64,
) -> Result<Vec<ErrorLogRow>, DbError> {
    let rows = sqlx::query_as::<_, ErrorLogRow>(
        "SELECT id, error_type, feed_id, message, status_code, retry_attempts, \
                admin_notified, resolved, resolution_notes, occurred_at, \
                occurrence_count, last_occurrence, created_at, updated_at \
         FROM scraper_error_logs \
         WHERE ($1 = FALSE OR resolved = FALSE) \
         ORDER BY last_occurrence DESC, id DESC \
         LIMIT $2 OFFSET $3",
    )
    .bind(unresolved_only)
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Marks a log row resolved, attaching optional notes.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if no row has the given id, or
/// [`DbError::Sqlx`] if the update fails.
pub async fn resolve_error_log(
    pool: &PgPool,
    id: i64,
    notes: Option<&str>,
) -> Result<ErrorLogRow, DbError> {
    sqlx::query_as::<_, ErrorLogRow>(
        "UPDATE scraper_error_logs \
         SET resolved = TRUE, resolution_notes = $2, updated_at = NOW() \
         WHERE id = $1 \
         RETURNING id, error_type, feed_id, message, status_code, retry_attempts, \
                   admin_notified, resolved, resolution_notes, occurred_at, \
                   occurrence_count, last_occurrence, created_at, updated_at",
    )
    .bind(id)
    .bind(notes)
    .fetch_optional(pool)
    .await?
    .ok_or(DbError::NotFound)
}

/// Flags the given rows as reported to an administrator.
///
/// Returns the number of rows updated.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the update fails.
pub async fn mark_error_logs_notified(pool: &PgPool, ids: &[i64]) -> Result<u64, DbError> {
    let result = sqlx::query(
        "UPDATE scraper_error_logs \
         SET admin_notified = TRUE, updated_at = NOW() \
         WHERE id = ANY($1) AND admin_notified = FALSE",
    )
    .bind(ids)
    .execute(pool)
    .await?;

    Ok(result.rows_affected())
}
