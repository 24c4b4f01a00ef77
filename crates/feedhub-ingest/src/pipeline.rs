//! The per-feed fetch pipeline.

use feedhub_db::{FeedRow, NewPost, PostInsert};
use feedhub_scraper::{parse_feed, FeedClient, ParsedChannel, ParsedFeed, ParsedItem};
use uuid::Uuid;

use crate::classify::{report_error, Disposition};
use crate::error::PipelineError;
use crate::store::Store;

/// How a feed run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedOutcome {
    /// Every item was processed; individual item failures are counted in the summary.
    Completed,
    /// Stopped early on an informational condition (timeout, not a feed).
    Skipped,
    /// Stopped early on a durable error, which was recorded.
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedRunSummary {
    pub feed_id: Uuid,
    pub outcome: FeedOutcome,
    pub items_seen: usize,
    pub inserted: usize,
    pub duplicates: usize,
    pub skipped_undated: usize,
    pub skipped_no_link: usize,
    pub item_errors: usize,
}

impl FeedRunSummary {
    fn new(feed_id: Uuid) -> Self {
        Self {
            feed_id,
            outcome: FeedOutcome::Completed,
            items_seen: 0,
            inserted: 0,
            duplicates: 0,
            skipped_undated: 0,
            skipped_no_link: 0,
            item_errors: 0,
        }
    }

    fn stop(mut self, disposition: Disposition) -> Self {
        self.outcome = match disposition {
            Disposition::Durable { .. } => FeedOutcome::Failed,
            Disposition::Informational | Disposition::Duplicate => FeedOutcome::Skipped,
        };
        self
    }
}

/// Refreshes one feed: mark fetched, download, decode, store new items.
///
/// The feed is marked fetched before the download starts so a slow or failing
/// feed is not picked again on the very next tick. Failures are classified and
/// recorded here; the function itself never fails.
pub async fn run_feed<S: Store + ?Sized>(
    store: &S,
    client: &FeedClient,
    feed: &FeedRow,
) -> FeedRunSummary {
    let summary = FeedRunSummary::new(feed.id);

    if let Err(e) = store.mark_feed_fetched(feed.id).await {
        let disposition = report_error(store, feed.id, &PipelineError::Db(e)).await;
        return summary.stop(disposition);
    }

    let body = match client.fetch(&feed.url).await {
        Ok(body) => body,
        Err(e) => {
            let disposition = report_error(store, feed.id, &PipelineError::Scraper(e)).await;
            return summary.stop(disposition);
        }
    };

    let parsed = match parse_feed(&body) {
        Ok(parsed) => parsed,
        Err(e) => {
            let disposition = report_error(store, feed.id, &PipelineError::Scraper(e)).await;
            return summary.stop(disposition);
        }
    };

    record_metadata(store, feed, &parsed).await;
    let summary = store_items(store, feed, &parsed.channel, parsed.items, summary).await;
    tracing::debug!(
        feed_id = %feed.id,
        items = summary.items_seen,
        inserted = summary.inserted,
        duplicates = summary.duplicates,
        skipped_undated = summary.skipped_undated,
        skipped_no_link = summary.skipped_no_link,
        item_errors = summary.item_errors,
        "pipeline: feed processed"
    );
    summary
}

/// Saves the detected dialect and a first channel image on the feed row.
///
/// Skips the write when the row already agrees. A failure is recorded but
/// does not stop the run.
async fn record_metadata<S: Store + ?Sized>(store: &S, feed: &FeedRow, parsed: &ParsedFeed) {
    let image_url = parsed.channel.image_url.as_deref();
    let type_changed = feed.feed_type.as_deref() != Some(parsed.feed_type.as_str());
    let fills_image = feed.image_url.is_none() && image_url.is_some();
    if !type_changed && !fills_image {
        return;
    }

    match store
        .update_feed_metadata(feed.id, parsed.feed_type, image_url)
        .await
    {
        Ok(changed) => tracing::debug!(
            feed_id = %feed.id,
            feed_type = %parsed.feed_type,
            changed,
            "pipeline: feed metadata updated"
        ),
        Err(e) => {
            report_error(store, feed.id, &PipelineError::Db(e)).await;
        }
    }
}

async fn store_items<S: Store + ?Sized>(
    store: &S,
    feed: &FeedRow,
    channel: &ParsedChannel,
    items: Vec<ParsedItem>,
    mut summary: FeedRunSummary,
) -> FeedRunSummary {
    for item in items {
        summary.items_seen += 1;

        let Some(link) = item.link else {
            summary.skipped_no_link += 1;
            tracing::debug!(feed_id = %feed.id, title = %item.title, "pipeline: item has no link");
            continue;
        };
        let Some(published_at) = item.published else {
            summary.skipped_undated += 1;
            tracing::debug!(feed_id = %feed.id, link = %link, "pipeline: item has no usable date");
            continue;
        };

        let post = NewPost {
            feed_id: feed.id,
            channel_title: if channel.title.is_empty() {
                feed.name.clone()
            } else {
                channel.title.clone()
            },
            channel_link: channel.link.clone(),
            channel_description: channel.description.clone(),
            channel_language: channel.language.clone(),
            item_title: item.title,
            item_link: link,
            item_description: item.description,
            item_published_at: published_at,
            item_image_url: item.image_url,
        };

        match store.insert_post(&post).await {
            Ok(PostInsert::Created(_)) => summary.inserted += 1,
            Ok(PostInsert::AlreadyExists) => summary.duplicates += 1,
            Err(e) => match report_error(store, feed.id, &PipelineError::Db(e)).await {
                Disposition::Duplicate => summary.duplicates += 1,
                Disposition::Informational | Disposition::Durable { .. } => {
                    summary.item_errors += 1;
                }
            },
        }
    }
    summary
}
