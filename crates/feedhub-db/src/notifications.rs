//! Database operations for `notifications` and the aggregation watermark.

use chrono::{DateTime, Duration, Utc};
use sqlx::{PgExecutor, PgPool};
use uuid::Uuid;

use crate::posts::post_counts_by_feed_between;
use crate::DbError;

/// A row from the `notifications` table.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct NotificationRow {
    pub id: i64,
    pub feed_id: Uuid,
    pub feed_name: String,
    pub post_count: i64,
    pub created_at: DateTime<Utc>,
}

/// Inserts one notification digest row and returns its id.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the insert fails.
pub async fn insert_notification<'e, E>(
    executor: E,
    feed_id: Uuid,
    feed_name: &str,
    post_count: i64,
    created_at: DateTime<Utc>,
) -> Result<i64, DbError>
where
    E: PgExecutor<'e>,
{
    let id = sqlx::query_scalar::<_, i64>(
        "INSERT INTO notifications (feed_id, feed_name, post_count, created_at) \
         VALUES ($1, $2, $3, $4) \
         RETURNING id",
    )
    .bind(feed_id)
    .bind(feed_name)
    .bind(post_count)
    .bind(created_at)
    .fetch_one(executor)
    .await?;

    Ok(id)
}

/// Writes one notification per feed that gained posts since the last run.
///
/// The range is read from the database clock, never the caller's:
/// `upper = clock_timestamp() - settle` and posts are counted over
/// `(max(watermark, upper - window), upper]`. `posts.created_at` is stamped
/// when the inserting transaction starts, so a post only becomes countable
/// once `settle` has passed; `settle` must cover the longest an insert can
/// stay uncommitted. The watermark row is locked for the whole transaction
/// and advanced to `upper`, never backwards, so overlapping or concurrent
/// runs never count a post twice.
///
/// Notifications are stamped with the database time of the run.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if any statement fails; nothing is written in
/// that case.
pub async fn aggregate_notifications(
    pool: &PgPool,
    window_minutes: i64,
    settle: std::time::Duration,
) -> Result<Vec<NotificationRow>, DbError> {
    let mut tx = pool.begin().await?;

    let watermark = sqlx::query_scalar::<_, Option<DateTime<Utc>>>(
        "SELECT last_aggregated_at FROM notification_watermark WHERE id = 1 FOR UPDATE",
    )
    .fetch_one(&mut *tx)
    .await?;

    // Read after the lock so a run that waited on another sees the later time.
    let (now, upper) = sqlx::query_as::<_, (DateTime<Utc>, DateTime<Utc>)>(
        "SELECT clock_timestamp(), clock_timestamp() - $1::interval",
    )
    .bind(settle)
    .fetch_one(&mut *tx)
    .await?;

    let window_start = upper - Duration::minutes(window_minutes);
    let since = watermark.map_or(window_start, |mark| mark.max(window_start));

    let mut rows = Vec::new();
    if since < upper {
        let counts = post_counts_by_feed_between(&mut *tx, since, upper).await?;
        for count in counts {
            let id = insert_notification(
                &mut *tx,
                count.feed_id,
                &count.feed_name,
                count.post_count,
                now,
            )
            .await?;
            rows.push(NotificationRow {
                id,
                feed_id: count.feed_id,
                feed_name: count.feed_name,
                post_count: count.post_count,
                created_at: now,
            });
        }
    }

    sqlx::query(
        "UPDATE notification_watermark \
         SET last_aggregated_at = GREATEST(COALESCE(last_aggregated_at, $1), $1) \
         WHERE id = 1",
    )
    .bind(upper)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok(rows)
}

/// Returns notifications for feeds the user follows, created in the trailing
/// `window_minutes` before `now`, newest first.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn notifications_for_user(
    pool: &PgPool,
    user_id: Uuid,
    window_minutes: i64,
    now: DateTime<Utc>,
) -> Result<Vec<NotificationRow>, DbError> {
    let rows = sqlx::query_as::<_, NotificationRow>(
        "SELECT n.id, n.feed_id, n.feed_name, n.post_count, n.created_at \
         FROM notifications n \
         JOIN feed_follows ff ON ff.feed_id = n.feed_id \
         WHERE ff.user_id = $1 AND n.created_at >= $2 \
         ORDER BY n.created_at DESC, n.id DESC",
    )
    .bind(user_id)
    .bind(now - Duration::minutes(window_minutes))
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Deletes notifications strictly older than `cutoff`.
///
/// A row created exactly at `cutoff` is kept. Returns the number deleted.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the delete fails.
pub async fn delete_notifications_created_before(
    pool: &PgPool,
    cutoff: DateTime<Utc>,
) -> Result<u64, DbError> {
    let result = sqlx::query("DELETE FROM notifications WHERE created_at < $1")
        .bind(cutoff)
        .execute(pool)
        .await?;

    Ok(result.rows_affected())
}

/// Deletes notifications older than `window_minutes` before `now`.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the delete fails.
pub async fn delete_notifications_older_than(
    pool: &PgPool,
    window_minutes: i64,
    now: DateTime<Utc>,
) -> Result<u64, DbError> {
    delete_notifications_created_before(pool, now - Duration::minutes(window_minutes)).await
}
