//! Database operations for the `feeds` table.

use chrono::{DateTime, Utc};
use feedhub_core::{CoreError, FeedType};
use sqlx::PgPool;
use uuid::Uuid;

use crate::DbError;

/// A row from the `feeds` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct FeedRow {
    pub id: Uuid,
    pub url: String,
    pub name: String,
    pub image_url: Option<String>,
    pub feed_type: Option<String>,
    pub description: Option<String>,
    /// `NULL` until the feed's first scheduling pass.
    pub last_fetched_at: Option<DateTime<Utc>>,
    pub version: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl FeedRow {
    /// Parses the stored `feed_type` tag.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::UnknownFeedType`] if the column holds an
    /// unrecognised tag.
    pub fn kind(&self) -> Result<Option<FeedType>, CoreError> {
        self.feed_type
            .as_deref()
            .map(str::parse::<FeedType>)
            .transpose()
    }
}

/// Values for a new feed.
#[derive(Debug, Clone)]
pub struct NewFeed {
    pub url: String,
    pub name: String,
    pub image_url: Option<String>,
    pub feed_type: Option<FeedType>,
    pub description: Option<String>,
}

/// Inserts a feed with a freshly generated id.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the insert fails, including a unique
/// violation when the URL is already registered.
pub async fn create_feed(pool: &PgPool, feed: &NewFeed) -> Result<FeedRow, DbError> {
    let row = sqlx::query_as::<_, FeedRow>(
        "INSERT INTO feeds (id, url, name, image_url, feed_type, description) \
         VALUES ($1, $2, $3, $4, $5, $6) \
         RETURNING id, url, name, image_url, feed_type, description, \
                   last_fetched_at, version, created_at, updated_at",
    )
    .bind(Uuid::new_v4())
    .bind(&feed.url)
    .bind(&feed.name)
    .bind(feed.image_url.as_deref())
    .bind(feed.feed_type.map(FeedType::as_str))
    .bind(feed.description.as_deref())
    .fetch_one(pool)
    .await?;

    Ok(row)
}

/// Fetches a single feed by id.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if no feed has the given id, or
/// [`DbError::Sqlx`] if the query fails.
pub async fn get_feed(pool: &PgPool, id: Uuid) -> Result<FeedRow, DbError> {
    sqlx::query_as::<_, FeedRow>(
        "SELECT id, url, name, image_url, feed_type, description, \
                last_fetched_at, version, created_at, updated_at \
         FROM feeds \
         WHERE id = $1",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or(DbError::NotFound)
}

/// Returns up to `limit` feeds ordered by name.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_feeds(pool: &PgPool, limit: i64) -> Result<Vec<FeedRow>, DbError> {
    let rows = sqlx::query_as::<_, FeedRow>(
        "SELECT id, url, name, image_url, feed_type, description, \
                last_fetched_at, version, created_at, updated_at \
         FROM feeds \
         ORDER BY name, id \
         LIMIT $1",
    )
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Returns the next `batch_size` feeds due for a refresh.
///
/// Never-fetched feeds come first (`NULLS FIRST`), then feeds by ascending
/// `last_fetched_at`, so every feed is eventually selected. `id` breaks ties
/// to keep the order stable.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn select_feeds_due_for_fetch(
    pool: &PgPool,
    batch_size: i64,
) -> Result<Vec<FeedRow>, DbError> {
    let rows = sqlx::query_as::<_, FeedRow>(
        "SELECT id, url, name, image_url, feed_type, description, \
                last_fetched_at, version, created_at, updated_at \
         FROM feeds \
         ORDER BY last_fetched_at ASC NULLS FIRST, id \
         LIMIT $1",
    )
    .bind(batch_size)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Stamps `last_fetched_at = NOW()` and bumps `version`.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if the feed no longer exists, or
/// [`DbError::Sqlx`] if the update fails.
pub async fn mark_feed_fetched(pool: &PgPool, id: Uuid) -> Result<FeedRow, DbError> {
    sqlx::query_as::<_, FeedRow>(
        "UPDATE feeds \
         SET last_fetched_at = NOW(), updated_at = NOW(), version = version + 1 \
         WHERE id = $1 \
         RETURNING id, url, name, image_url, feed_type, description, \
                   last_fetched_at, version, created_at, updated_at",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or(DbError::NotFound)
}

/// Records what a fetch learned about the feed: the detected dialect, and the
/// channel image when the feed has none yet.
///
/// Returns `false` when nothing changed or the feed is gone; `version` and
/// `updated_at` only move when a column does.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the update fails.
pub async fn update_feed_metadata(
    pool: &PgPool,
    id: Uuid,
    feed_type: FeedType,
    image_url: Option<&str>,
) -> Result<bool, DbError> {
    let result = sqlx::query(
        "UPDATE feeds \
         SET feed_type = $2, image_url = COALESCE(image_url, $3), \
             updated_at = NOW(), version = version + 1 \
         WHERE id = $1 \
           AND (feed_type IS DISTINCT FROM $2 OR (image_url IS NULL AND $3::text IS NOT NULL))",
    )
    .bind(id)
    .bind(feed_type.as_str())
    .bind(image_url)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}
