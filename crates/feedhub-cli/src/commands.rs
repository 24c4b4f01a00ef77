//! Command handlers for the CLI.
//!
//! Each handler runs after `main` has loaded config and opened the pool, and
//! prints a plain-text summary to stdout.

use std::sync::Arc;

use anyhow::Context;
use chrono::Utc;
use feedhub_core::AppConfig;
use feedhub_db::DbError;
use feedhub_ingest::{FetchScheduler, NotificationSettings, PgStore, SchedulerSettings};
use feedhub_scraper::FeedClient;
use sqlx::PgPool;
use uuid::Uuid;

pub(crate) async fn ping(pool: &PgPool) -> anyhow::Result<()> {
    feedhub_db::health_check(pool).await?;
    println!("database: ok");
    Ok(())
}

pub(crate) async fn migrate(pool: &PgPool) -> anyhow::Result<()> {
    let applied = feedhub_db::run_migrations(pool).await?;
    println!("migrations: {applied} known, schema up to date");
    Ok(())
}

pub(crate) async fn add_feed(pool: &PgPool, feed: &feedhub_db::NewFeed) -> anyhow::Result<()> {
    let row = match feedhub_db::create_feed(pool, feed).await {
        Ok(row) => row,
        Err(e) if e.is_unique_violation() => {
            anyhow::bail!("a feed with url '{}' already exists", feed.url)
        }
        Err(e) => return Err(e.into()),
    };
    println!("feed {} created: {} <{}>", row.id, row.name, row.url);
    Ok(())
}

pub(crate) async fn list_feeds(pool: &PgPool, limit: i64) -> anyhow::Result<()> {
    let feeds = feedhub_db::list_feeds(pool, limit.clamp(1, 1000)).await?;
    if feeds.is_empty() {
        println!("no feeds registered");
        return Ok(());
    }
    for feed in feeds {
        let fetched = feed
            .last_fetched_at
            .map_or_else(|| "never".to_string(), |at| at.to_rfc3339());
        let kind = feed.feed_type.as_deref().unwrap_or("-");
        println!("{}  {:<5}  {:<32}  last fetched {fetched}", feed.id, kind, feed.name);
    }
    Ok(())
}

pub(crate) async fn show_feed(pool: &PgPool, feed_id: Uuid, posts: i64) -> anyhow::Result<()> {
    let feed = match feedhub_db::get_feed(pool, feed_id).await {
        Ok(feed) => feed,
        Err(DbError::NotFound) => anyhow::bail!("feed {feed_id} not found"),
        Err(e) => return Err(e.into()),
    };
    let total = feedhub_db::count_posts_for_feed(pool, feed_id).await?;

    println!("{} ({})", feed.name, feed.url);
    println!("  type:    {}", feed.feed_type.as_deref().unwrap_or("undetected"));
    println!("  version: {}", feed.version);
    println!("  posts:   {total}");

    let latest = feedhub_db::list_posts_for_feed(pool, feed_id, posts.clamp(1, 100)).await?;
    for post in latest {
        println!(
            "  {}  {}  <{}>",
            post.item_published_at.format("%Y-%m-%d %H:%M"),
            post.item_title,
            post.item_link
        );
    }
    Ok(())
}

pub(crate) async fn add_user(pool: &PgPool, username: &str) -> anyhow::Result<()> {
    let user = match feedhub_db::create_user(pool, username).await {
        Ok(user) => user,
        Err(e) if e.is_unique_violation() => anyhow::bail!("username '{username}' is taken"),
        Err(e) => return Err(e.into()),
    };
    println!("user {} created: {}", user.id, user.username);
    Ok(())
}

pub(crate) async fn follow(pool: &PgPool, user_id: Uuid, feed_id: Uuid) -> anyhow::Result<()> {
    let created = feedhub_db::follow_feed(pool, user_id, feed_id)
        .await
        .with_context(|| format!("following feed {feed_id} as user {user_id}"))?;
    if created {
        println!("user {user_id} now follows feed {feed_id}");
    } else {
        println!("user {user_id} already follows feed {feed_id}");
    }
    Ok(())
}

/// Runs one scheduling pass and waits for every fetch it dispatched.
pub(crate) async fn tick(pool: PgPool, config: &AppConfig) -> anyhow::Result<()> {
    let store = Arc::new(PgStore::new(pool, config.db_call_timeout()));
    let client = Arc::new(FeedClient::from_app_config(config)?);
    let scheduler = FetchScheduler::new(store, client, SchedulerSettings::from_app_config(config));

    let report = scheduler.tick().await?;
    scheduler.shutdown().await;

    println!(
        "tick: {} selected, {} fetched, {} already in flight",
        report.selected, report.dispatched, report.skipped_in_flight
    );
    Ok(())
}

pub(crate) async fn aggregate(pool: PgPool, config: &AppConfig) -> anyhow::Result<()> {
    let store = PgStore::new(pool, config.db_call_timeout());
    let settings = NotificationSettings::from_app_config(config);
    let rows = feedhub_ingest::aggregate(&store, &settings).await?;

    if rows.is_empty() {
        println!("aggregate: no new posts in the last {} minutes", settings.effective_window());
    }
    for row in rows {
        println!("aggregate: {} new posts in {}", row.post_count, row.feed_name);
    }
    Ok(())
}

pub(crate) async fn cleanup(pool: PgPool, config: &AppConfig) -> anyhow::Result<()> {
    let store = PgStore::new(pool, config.db_call_timeout());
    let settings = NotificationSettings::from_app_config(config);
    let deleted = feedhub_ingest::cleanup(&store, &settings, Utc::now()).await?;
    println!(
        "cleanup: {deleted} notifications older than {} minutes deleted",
        settings.retention_minutes
    );
    Ok(())
}

pub(crate) async fn list_errors(
    pool: &PgPool,
    unresolved: bool,
    limit: i64,
    offset: i64,
    mark_notified: bool,
) -> anyhow::Result<()> {
    let rows =
        feedhub_db::list_error_logs(pool, unresolved, limit.clamp(1, 1000), offset.max(0)).await?;
    if rows.is_empty() {
        println!("no error logs");
        return Ok(());
    }

    for row in &rows {
        let status = row
            .status_code
            .map_or_else(|| "-".to_string(), |code| code.to_string());
        let state = if row.resolved { "resolved" } else { "open" };
        println!(
            "#{:<6} {:<14} {:<3} x{:<4} {state:<8} feed {}  last {}  {}",
            row.id,
            row.error_type,
            status,
            row.occurrence_count,
            row.feed_id,
            row.last_occurrence.to_rfc3339(),
            row.message
        );
    }

    if mark_notified {
        let ids: Vec<i64> = rows
            .iter()
            .filter(|row| !row.admin_notified)
            .map(|row| row.id)
            .collect();
        let marked = feedhub_db::mark_error_logs_notified(pool, &ids).await?;
        println!("{marked} error logs marked as notified");
    }
    Ok(())
}

pub(crate) async fn resolve_error(pool: &PgPool, id: i64, notes: Option<&str>) -> anyhow::Result<()> {
    match feedhub_db::resolve_error_log(pool, id, notes).await {
        Ok(row) => {
            println!("error log #{} resolved ({} occurrences)", row.id, row.occurrence_count);
            Ok(())
        }
        Err(DbError::NotFound) => anyhow::bail!("error log #{id} not found"),
        Err(e) => Err(e.into()),
    }
}

pub(crate) async fn notifications(
    pool: PgPool,
    config: &AppConfig,
    user_id: Uuid,
    interval: Option<i64>,
) -> anyhow::Result<()> {
    let store = PgStore::new(pool, config.db_call_timeout());
    let settings = NotificationSettings::from_app_config(config);
    let result =
        feedhub_ingest::notifications_for_user(&store, &settings, user_id, interval, Utc::now())
            .await?;

    println!(
        "{} notifications in the last {} minutes",
        result.notifications.len(),
        result.window_minutes
    );
    for row in result.notifications {
        println!(
            "  {}  {:>4} new  {}",
            row.created_at.format("%H:%M:%S"),
            row.post_count,
            row.feed_name
        );
    }
    Ok(())
}
