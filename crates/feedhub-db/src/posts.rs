//! Database operations for the `posts` table.

use chrono::{DateTime, Duration, Utc};
use sqlx::{PgExecutor, PgPool};
use uuid::Uuid;

use crate::DbError;

/// A row from the `posts` table.
///
/// Channel fields are copied onto every item so reads need no join.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct PostRow {
    pub id: Uuid,
    pub feed_id: Uuid,
    pub channel_title: String,
    pub channel_link: Option<String>,
    pub channel_description: Option<String>,
    pub channel_language: Option<String>,
    pub item_title: String,
    pub item_link: String,
    pub item_description: Option<String>,
    pub item_published_at: DateTime<Utc>,
    pub item_image_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Values for one post to insert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPost {
    pub feed_id: Uuid,
    pub channel_title: String,
    pub channel_link: Option<String>,
    pub channel_description: Option<String>,
    pub channel_language: Option<String>,
    pub item_title: String,
    pub item_link: String,
    pub item_description: Option<String>,
    pub item_published_at: DateTime<Utc>,
    pub item_image_url: Option<String>,
}

/// Outcome of [`insert_post`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostInsert {
    Created(Uuid),
    /// A post with the same `(feed_id, item_link)` was already stored.
    AlreadyExists,
}

/// Per-feed count of posts created within a time range.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct FeedPostCount {
    pub feed_id: Uuid,
    pub feed_name: String,
    pub post_count: i64,
}

/// Inserts a post unless `(feed_id, item_link)` already exists.
///
/// The conflict is resolved by `ON CONFLICT DO NOTHING`, so concurrent
/// fetches of the same feed cannot store an item twice.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the insert fails for any reason other than
/// the duplicate key.
pub async fn insert_post<'e, E>(executor: E, post: &NewPost) -> Result<PostInsert, DbError>
where
    E: PgExecutor<'e>,
{
    let id = sqlx::query_scalar::<_, Uuid>(
        "INSERT INTO posts (id, feed_id, channel_title, channel_link, channel_description, \
                            channel_language, item_title, item_link, item_description, \
                            item_published_at, item_image_url) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11) \
         ON CONFLICT (feed_id, item_link) DO NOTHING \
         RETURNING id",
    )
    .bind(Uuid::new_v4())
    .bind(post.feed_id)
    .bind(&post.channel_title)
    .bind(post.channel_link.as_deref())
    .bind(post.channel_description.as_deref())
    .bind(post.channel_language.as_deref())
    .bind(&post.item_title)
    .bind(&post.item_link)
    .bind(post.item_description.as_deref())
    .bind(post.item_published_at)
    .bind(post.item_image_url.as_deref())
    .fetch_optional(executor)
    .await?;

    Ok(id.map_or(PostInsert::AlreadyExists, PostInsert::Created))
}

/// Returns the newest `limit` posts of a feed by publish date.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_posts_for_feed(
    pool: &PgPool,
    feed_id: Uuid,
    limit: i64,
) -> Result<Vec<PostRow>, DbError> {
    let rows = sqlx::query_as::<_, PostRow>(
        "SELECT id, feed_id, channel_title, channel_link, channel_description, channel_language, \
                item_title, item_link, item_description, item_published_at, item_image_url, \
                created_at, updated_at \
         FROM posts \
         WHERE feed_id = $1 \
         ORDER BY item_published_at DESC, id \
         LIMIT $2",
    )
    .bind(feed_id)
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Counts the posts stored for a feed.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn count_posts_for_feed(pool: &PgPool, feed_id: Uuid) -> Result<i64, DbError> {
    let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM posts WHERE feed_id = $1")
        .bind(feed_id)
        .fetch_one(pool)
        .await?;

    Ok(count)
}

/// Counts posts per feed with `since < created_at <= until`.
///
/// Accepts any executor so the aggregator can run it inside its transaction.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn post_counts_by_feed_between<'e, E>(
    executor: E,
    since: DateTime<Utc>,
    until: DateTime<Utc>,
) -> Result<Vec<FeedPostCount>, DbError>
where
    E: PgExecutor<'e>,
{
    let rows = sqlx::query_as::<_, FeedPostCount>(
        "SELECT p.feed_id, f.name AS feed_name, COUNT(*) AS post_count \
         FROM posts p \
         JOIN feeds f ON f.id = p.feed_id \
         WHERE p.created_at > $1 AND p.created_at <= $2 \
         GROUP BY p.feed_id, f.name \
         ORDER BY f.name, p.feed_id",
    )
    .bind(since)
    .bind(until)
    .fetch_all(executor)
    .await?;

    Ok(rows)
}

/// Counts posts per feed created in the trailing `window_minutes` before `now`.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn post_counts_by_feed_since(
    pool: &PgPool,
    window_minutes: i64,
    now: DateTime<Utc>,
) -> Result<Vec<FeedPostCount>, DbError> {
    post_counts_by_feed_between(pool, now - Duration::minutes(window_minutes), now).await
}
