//! Storage seam for the ingestion runtime.

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use feedhub_core::FeedType;
use feedhub_db::{
    DbError, ErrorLogRow, FeedRow, NewErrorLog, NewPost, NotificationRow, PostInsert,
};
use sqlx::PgPool;
use uuid::Uuid;

/// Persistence operations the scheduler, pipeline and notification jobs need.
#[async_trait]
pub trait Store: Send + Sync + 'static {
    /// Up to `batch_size` feeds, never-fetched first, then oldest fetch first.
    async fn select_feeds_due_for_fetch(&self, batch_size: i64) -> Result<Vec<FeedRow>, DbError>;

    async fn mark_feed_fetched(&self, feed_id: Uuid) -> Result<FeedRow, DbError>;

    /// Stores the detected dialect and fills a missing image. `true` if the
    /// row changed.
    async fn update_feed_metadata(
        &self,
        feed_id: Uuid,
        feed_type: FeedType,
        image_url: Option<&str>,
    ) -> Result<bool, DbError>;

    /// Reports an existing `(feed, item link)` pair as [`PostInsert::AlreadyExists`].
    async fn insert_post(&self, post: &NewPost) -> Result<PostInsert, DbError>;

    async fn upsert_error_log(&self, entry: &NewErrorLog) -> Result<ErrorLogRow, DbError>;

    /// Counts posts up to the store's own clock less `settle`.
    async fn aggregate_notifications(
        &self,
        window_minutes: i64,
        settle: Duration,
    ) -> Result<Vec<NotificationRow>, DbError>;

    async fn notifications_for_user(
        &self,
        user_id: Uuid,
        window_minutes: i64,
        now: DateTime<Utc>,
    ) -> Result<Vec<NotificationRow>, DbError>;

    async fn delete_notifications_older_than(
        &self,
        window_minutes: i64,
        now: DateTime<Utc>,
    ) -> Result<u64, DbError>;
}

/// [`Store`] backed by Postgres. Every call is bounded by `call_timeout`.
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
    call_timeout: Duration,
}

impl PgStore {
    #[must_use]
    pub fn new(pool: PgPool, call_timeout: Duration) -> Self {
        Self { pool, call_timeout }
    }

    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    async fn bounded<T, F>(&self, operation: &'static str, call: F) -> Result<T, DbError>
    where
        F: Future<Output = Result<T, DbError>> + Send,
    {
        tokio::time::timeout(self.call_timeout, call)
            .await
            .map_err(|_| DbError::Timeout { operation })?
    }
}

#[async_trait]
impl Store for PgStore {
    async fn select_feeds_due_for_fetch(&self, batch_size: i64) -> Result<Vec<FeedRow>, DbError> {
        self.bounded(
            "select_feeds_due_for_fetch",
            feedhub_db::select_feeds_due_for_fetch(&self.pool, batch_size),
        )
        .await
    }

    async fn mark_feed_fetched(&self, feed_id: Uuid) -> Result<FeedRow, DbError> {
        self.bounded(
            "mark_feed_fetched",
            feedhub_db::mark_feed_fetched(&self.pool, feed_id),
        )
        .await
    }

    async fn update_feed_metadata(
        &self,
        feed_id: Uuid,
        feed_type: FeedType,
        image_url: Option<&str>,
    ) -> Result<bool, DbError> {
        self.bounded(
            "update_feed_metadata",
            feedhub_db::update_feed_metadata(&self.pool, feed_id, feed_type, image_url),
        )
        .await
    }

    async fn insert_post(&self, post: &NewPost) -> Result<PostInsert, DbError> {
        self.bounded("insert_post", feedhub_db::insert_post(&self.pool, post))
            .await
    }

    async fn upsert_error_log(&self, entry: &NewErrorLog) -> Result<ErrorLogRow, DbError> {
        self.bounded(
            "upsert_error_log",
            feedhub_db::upsert_error_log(&self.pool, entry),
        )
        .await
    }

    async fn aggregate_notifications(
        &self,
        window_minutes: i64,
        settle: Duration,
    ) -> Result<Vec<NotificationRow>, DbError> {
        self.bounded(
            "aggregate_notifications",
            feedhub_db::aggregate_notifications(&self.pool, window_minutes, settle),
        )
        .await
    }

    async fn notifications_for_user(
        &self,
        user_id: Uuid,
        window_minutes: i64,
        now: DateTime<Utc>,
    ) -> Result<Vec<NotificationRow>, DbError> {
        self.bounded(
            "notifications_for_user",
            feedhub_db::notifications_for_user(&self.pool, user_id, window_minutes, now),
        )
        .await
    }

    async fn delete_notifications_older_than(
        &self,
        window_minutes: i64,
        now: DateTime<Utc>,
    ) -> Result<u64, DbError> {
        self.bounded(
            "delete_notifications_older_than",
            feedhub_db::delete_notifications_older_than(&self.pool, window_minutes, now),
        )
        .await
    }
}
