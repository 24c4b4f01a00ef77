//! Notification aggregation, cleanup and the per-user query.

use std::time::Duration;

use chrono::{DateTime, Utc};
use feedhub_core::refine_interval;
use feedhub_db::{DbError, NotificationRow};
use uuid::Uuid;

use crate::store::Store;

/// Window used when a configured or requested window is out of range.
pub const DEFAULT_WINDOW_MINUTES: i64 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NotificationSettings {
    /// Aggregation window, and the default window for user queries.
    pub window_minutes: i64,
    /// Age after which notifications are deleted; also the largest window a
    /// user may ask for.
    pub retention_minutes: i64,
    /// How long a new post is held back from aggregation so inserts still in
    /// flight can commit. At least the storage call timeout.
    pub settle: Duration,
}

impl NotificationSettings {
    #[must_use]
    pub fn from_app_config(config: &feedhub_core::AppConfig) -> Self {
        Self {
            window_minutes: config.notification_window_minutes,
            retention_minutes: config.notification_retention_minutes,
            settle: config.db_call_timeout(),
        }
    }

    /// The aggregation window, validated against the retention limit.
    #[must_use]
    pub fn effective_window(&self) -> i64 {
        refine_interval(
            self.window_minutes,
            DEFAULT_WINDOW_MINUTES,
            self.retention_minutes,
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserNotifications {
    /// The window actually applied after validation.
    pub window_minutes: i64,
    pub notifications: Vec<NotificationRow>,
}

/// Emits one notification per feed with new posts in the window.
///
/// The window ends `settings.settle` before the store's clock, so a post is
/// counted by the first run after its insert has had time to commit.
///
/// # Errors
///
/// Returns the store's [`DbError`] if aggregation fails; nothing is written then.
pub async fn aggregate<S: Store + ?Sized>(
    store: &S,
    settings: &NotificationSettings,
) -> Result<Vec<NotificationRow>, DbError> {
    let window = settings.effective_window();
    let rows = store.aggregate_notifications(window, settings.settle).await?;
    tracing::info!(
        window_minutes = window,
        settle_ms = u64::try_from(settings.settle.as_millis()).unwrap_or(u64::MAX),
        notifications = rows.len(),
        "notifications: aggregation complete"
    );
    Ok(rows)
}

/// Deletes notifications older than the retention window.
///
/// # Errors
///
/// Returns the store's [`DbError`] if the delete fails.
pub async fn cleanup<S: Store + ?Sized>(
    store: &S,
    settings: &NotificationSettings,
    now: DateTime<Utc>,
) -> Result<u64, DbError> {
    let deleted = store
        .delete_notifications_older_than(settings.retention_minutes, now)
        .await?;
    tracing::info!(
        retention_minutes = settings.retention_minutes,
        deleted,
        "notifications: cleanup complete"
    );
    Ok(deleted)
}

/// Notifications for the feeds `user_id` follows, within the requested window.
///
/// A missing, non-positive or too-large `requested_minutes` falls back to the
/// configured window. Reads only what is already stored.
///
/// # Errors
///
/// Returns the store's [`DbError`] if the query fails.
pub async fn notifications_for_user<S: Store + ?Sized>(
    store: &S,
    settings: &NotificationSettings,
    user_id: Uuid,
    requested_minutes: Option<i64>,
    now: DateTime<Utc>,
) -> Result<UserNotifications, DbError> {
    let default = settings.effective_window();
    let window = requested_minutes.map_or(default, |requested| {
        refine_interval(requested, default, settings.retention_minutes)
    });
    let notifications = store.notifications_for_user(user_id, window, now).await?;
    Ok(UserNotifications {
        window_minutes: window,
        notifications,
    })
}
