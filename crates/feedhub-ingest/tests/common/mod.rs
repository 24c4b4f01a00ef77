//! In-memory [`Store`] used by the ingest integration tests.

#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use feedhub_db::{
    DbError, ErrorLogRow, FeedRow, NewErrorLog, NewPost, NotificationRow, PostInsert,
};
use feedhub_core::FeedType;
use feedhub_ingest::Store;
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct StoredPost {
    pub id: Uuid,
    pub post: NewPost,
    pub created_at: DateTime<Utc>,
}

#[derive(Default)]
pub struct State {
    pub feeds: Vec<FeedRow>,
    pub posts: Vec<StoredPost>,
    pub errors: Vec<ErrorLogRow>,
    pub notifications: Vec<NotificationRow>,
    pub follows: Vec<(Uuid, Uuid)>,
    /// Operation names in call order, e.g. `"mark:<feed id>"`.
    pub calls: Vec<String>,
    pub watermark: Option<DateTime<Utc>>,
    next_error_id: i64,
    next_notification_id: i64,
}

#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<State>,
    pub fail_selection: AtomicBool,
    pub panic_on_insert: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().expect("memory store lock poisoned")
    }

    pub fn add_feed(&self, url: &str, last_fetched_at: Option<DateTime<Utc>>) -> FeedRow {
        let now = Utc::now();
        let feed = FeedRow {
            id: Uuid::new_v4(),
            url: url.to_owned(),
            name: format!("Feed {url}"),
            image_url: None,
            feed_type: None,
            description: None,
            last_fetched_at,
            version: 1,
            created_at: now,
            updated_at: now,
        };
        self.state().feeds.push(feed.clone());
        feed
    }

    pub fn follow(&self, user_id: Uuid, feed_id: Uuid) {
        self.state().follows.push((user_id, feed_id));
    }

    pub fn add_notification(&self, feed: &FeedRow, post_count: i64, created_at: DateTime<Utc>) {
        let mut state = self.state();
        state.next_notification_id += 1;
        let id = state.next_notification_id;
        state.notifications.push(NotificationRow {
            id,
            feed_id: feed.id,
            feed_name: feed.name.clone(),
            post_count,
            created_at,
        });
    }

    pub fn post_count(&self, feed_id: Uuid) -> usize {
        self.state()
            .posts
            .iter()
            .filter(|p| p.post.feed_id == feed_id)
            .count()
    }

    pub fn error_rows(&self, feed_id: Uuid) -> Vec<ErrorLogRow> {
        self.state()
            .errors
            .iter()
            .filter(|e| e.feed_id == feed_id)
            .cloned()
            .collect()
    }

    pub fn feed(&self, feed_id: Uuid) -> FeedRow {
        self.state()
            .feeds
            .iter()
            .find(|f| f.id == feed_id)
            .cloned()
            .expect("feed exists")
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn select_feeds_due_for_fetch(&self, batch_size: i64) -> Result<Vec<FeedRow>, DbError> {
        if self.fail_selection.load(Ordering::SeqCst) {
            return Err(DbError::Timeout {
                operation: "select_feeds_due_for_fetch",
            });
        }
        let mut feeds = self.state().feeds.clone();
        // NULLS FIRST, then oldest fetch first.
        feeds.sort_by_key(|f| (f.last_fetched_at.is_some(), f.last_fetched_at, f.id));
        feeds.truncate(usize::try_from(batch_size).unwrap_or(0));
        Ok(feeds)
    }

    async fn mark_feed_fetched(&self, feed_id: Uuid) -> Result<FeedRow, DbError> {
        let mut state = self.state();
        state.calls.push(format!("mark:{feed_id}"));
        let feed = state
            .feeds
            .iter_mut()
            .find(|f| f.id == feed_id)
            .ok_or(DbError::NotFound)?;
        feed.last_fetched_at = Some(Utc::now());
        feed.version += 1;
        Ok(feed.clone())
    }

    async fn update_feed_metadata(
        &self,
        feed_id: Uuid,
        feed_type: FeedType,
        image_url: Option<&str>,
    ) -> Result<bool, DbError> {
        let mut state = self.state();
        state.calls.push(format!("metadata:{feed_id}"));
        let Some(feed) = state.feeds.iter_mut().find(|f| f.id == feed_id) else {
            return Ok(false);
        };
        let tag = feed_type.as_str();
        let fills_image = feed.image_url.is_none() && image_url.is_some();
        if feed.feed_type.as_deref() == Some(tag) && !fills_image {
            return Ok(false);
        }
        feed.feed_type = Some(tag.to_owned());
        if fills_image {
            feed.image_url = image_url.map(str::to_owned);
        }
        feed.version += 1;
        Ok(true)
    }

    async fn insert_post(&self, post: &NewPost) -> Result<PostInsert, DbError> {
        assert!(
            !self.panic_on_insert.load(Ordering::SeqCst),
            "insert_post panicked on purpose"
        );
        let mut state = self.state();
        state.calls.push(format!("insert:{}", post.item_link));
        if state
            .posts
            .iter()
            .any(|p| p.post.feed_id == post.feed_id && p.post.item_link == post.item_link)
        {
            return Ok(PostInsert::AlreadyExists);
        }
        let id = Uuid::new_v4();
        state.posts.push(StoredPost {
            id,
            post: post.clone(),
            created_at: Utc::now(),
        });
        Ok(PostInsert::Created(id))
    }

    async fn upsert_error_log(&self, entry: &NewErrorLog) -> Result<ErrorLogRow, DbError> {
        let mut state = self.state();
        let tag = entry.error_type.as_str();
        if let Some(row) = state
            .errors
            .iter_mut()
            .find(|r| r.error_type == tag && r.feed_id == entry.feed_id)
        {
            row.message.clone_from(&entry.message);
            row.status_code = entry.status_code.map(i32::from);
            row.retry_attempts += 1;
            row.occurrence_count += 1;
            row.last_occurrence = entry.occurred_at;
            row.resolved = false;
            return Ok(row.clone());
        }
        state.next_error_id += 1;
        let row = ErrorLogRow {
            id: state.next_error_id,
            error_type: tag.to_owned(),
            feed_id: entry.feed_id,
            message: entry.message.clone(),
            status_code: entry.status_code.map(i32::from),
            retry_attempts: 0,
            admin_notified: false,
            resolved: false,
            resolution_notes: None,
            occurred_at: entry.occurred_at,
            occurrence_count: 1,
            last_occurrence: entry.occurred_at,
            created_at: entry.occurred_at,
            updated_at: entry.occurred_at,
        };
        state.errors.push(row.clone());
        Ok(row)
    }

    async fn aggregate_notifications(
        &self,
        window_minutes: i64,
        settle: std::time::Duration,
    ) -> Result<Vec<NotificationRow>, DbError> {
        let mut state = self.state();
        let now = Utc::now();
        let upper = now - Duration::from_std(settle).expect("settle fits");
        let window_start = upper - Duration::minutes(window_minutes);
        let since = state
            .watermark
            .map_or(window_start, |mark| mark.max(window_start));
        let mut counts: Vec<(Uuid, i64)> = Vec::new();
        for p in state
            .posts
            .iter()
            .filter(|p| p.created_at > since && p.created_at <= upper)
        {
            match counts.iter_mut().find(|(id, _)| *id == p.post.feed_id) {
                Some((_, n)) => *n += 1,
                None => counts.push((p.post.feed_id, 1)),
            }
        }
        state.watermark = Some(state.watermark.map_or(upper, |mark| mark.max(upper)));
        let mut rows = Vec::new();
        for (feed_id, post_count) in counts {
            let feed_name = state
                .feeds
                .iter()
                .find(|f| f.id == feed_id)
                .map(|f| f.name.clone())
                .unwrap_or_default();
            state.next_notification_id += 1;
            let row = NotificationRow {
                id: state.next_notification_id,
                feed_id,
                feed_name,
                post_count,
                created_at: now,
            };
            state.notifications.push(row.clone());
            rows.push(row);
        }
        Ok(rows)
    }

    async fn notifications_for_user(
        &self,
        user_id: Uuid,
        window_minutes: i64,
        now: DateTime<Utc>,
    ) -> Result<Vec<NotificationRow>, DbError> {
        let state = self.state();
        let since = now - Duration::minutes(window_minutes);
        Ok(state
            .notifications
            .iter()
            .filter(|n| n.created_at >= since)
            .filter(|n| state.follows.contains(&(user_id, n.feed_id)))
            .cloned()
            .collect())
    }

    async fn delete_notifications_older_than(
        &self,
        window_minutes: i64,
        now: DateTime<Utc>,
    ) -> Result<u64, DbError> {
        let mut state = self.state();
        let cutoff = now - Duration::minutes(window_minutes);
        let before = state.notifications.len();
        state.notifications.retain(|n| n.created_at >= cutoff);
        Ok(u64::try_from(before - state.notifications.len()).unwrap_or(u64::MAX))
    }
}
