//! Minimal user and follow records backing the per-user notification query.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::DbError;

/// A row from the `users` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct UserRow {
    pub id: Uuid,
    pub username: String,
    pub created_at: DateTime<Utc>,
}

/// Inserts a user with a freshly generated id.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the insert fails (including a duplicate
/// username).
pub async fn create_user(pool: &PgPool, username: &str) -> Result<UserRow, DbError> {
    let row = sqlx::query_as::<_, UserRow>(
        "INSERT INTO users (id, username) VALUES ($1, $2) \
         RETURNING id, username, created_at",
    )
    .bind(Uuid::new_v4())
    .bind(username)
    .fetch_one(pool)
    .await?;

    Ok(row)
}

/// Makes `user_id` follow `feed_id`. Returns `false` if already following.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the insert fails, e.g. for an unknown user
/// or feed.
pub async fn follow_feed(pool: &PgPool, user_id: Uuid, feed_id: Uuid) -> Result<bool, DbError> {
    let result = sqlx::query(
        "INSERT INTO feed_follows (user_id, feed_id) VALUES ($1, $2) \
         ON CONFLICT (user_id, feed_id) DO NOTHING",
    )
    .bind(user_id)
    .bind(feed_id)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}
