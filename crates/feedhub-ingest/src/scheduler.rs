//! The fetch scheduler.
//!
//! One control loop ticks at a fixed interval. Each tick selects up to
//! `batch_size` due feeds and dispatches one supervised task per feed; the
//! loop never waits for those tasks before the next tick. A feed whose
//! previous task is still running is skipped until it finishes.

use std::sync::Arc;
use std::time::Duration;

use feedhub_db::DbError;
use feedhub_scraper::FeedClient;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use crate::inflight::InFlight;
use crate::pipeline::run_feed;
use crate::store::Store;
use crate::tasks::TaskGroup;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchedulerSettings {
    /// Feeds selected per tick; also the per-tick concurrency bound.
    pub batch_size: u32,
    pub interval: Duration,
}

impl SchedulerSettings {
    #[must_use]
    pub fn from_app_config(config: &feedhub_core::AppConfig) -> Self {
        Self {
            batch_size: config.fetch_workers,
            interval: config.fetch_interval(),
        }
    }
}

/// What one tick did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickReport {
    pub selected: usize,
    pub dispatched: usize,
    pub skipped_in_flight: usize,
}

pub struct FetchScheduler<S: Store> {
    store: Arc<S>,
    client: Arc<FeedClient>,
    settings: SchedulerSettings,
    tasks: TaskGroup,
    in_flight: InFlight,
}

impl<S: Store> FetchScheduler<S> {
    #[must_use]
    pub fn new(store: Arc<S>, client: Arc<FeedClient>, settings: SchedulerSettings) -> Self {
        Self {
            store,
            client,
            settings,
            tasks: TaskGroup::new(),
            in_flight: InFlight::new(),
        }
    }

    /// Runs one scheduling pass and returns once the feed tasks are dispatched.
    ///
    /// # Errors
    ///
    /// Returns the store's [`DbError`] if feed selection fails; nothing is
    /// dispatched in that case.
    pub async fn tick(&self) -> Result<TickReport, DbError> {
        let feeds = self
            .store
            .select_feeds_due_for_fetch(i64::from(self.settings.batch_size))
            .await?;

        let mut report = TickReport {
            selected: feeds.len(),
            ..TickReport::default()
        };

        for feed in feeds {
            let Some(guard) = self.in_flight.try_acquire(feed.id) else {
                tracing::debug!(feed_id = %feed.id, "scheduler: previous fetch still running, skipping");
                report.skipped_in_flight += 1;
                continue;
            };

            let store = Arc::clone(&self.store);
            let client = Arc::clone(&self.client);
            self.tasks.spawn(format!("fetch-feed-{}", feed.id), async move {
                let _guard = guard;
                run_feed(store.as_ref(), &client, &feed).await;
            });
            report.dispatched += 1;
        }

        Ok(report)
    }

    /// Ticks until `cancel` fires, then waits for in-flight fetches.
    ///
    /// A failed feed selection is logged and the loop carries on with the
    /// next tick.
    pub async fn run(&self, cancel: CancellationToken) {
        let mut ticker = tokio::time::interval(self.settings.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        tracing::info!(
            batch_size = self.settings.batch_size,
            interval_secs = self.settings.interval.as_secs(),
            "scheduler: started"
        );

        loop {
            tokio::select! {
                () = cancel.cancelled() => break,
                _ = ticker.tick() => {
                    match self.tick().await {
                        Ok(report) if report.selected > 0 => {
                            tracing::info!(
                                selected = report.selected,
                                dispatched = report.dispatched,
                                skipped_in_flight = report.skipped_in_flight,
                                "scheduler: tick dispatched feeds"
                            );
                        }
                        Ok(_) => tracing::debug!("scheduler: no feeds due"),
                        Err(e) => {
                            tracing::error!(error = %e, "scheduler: failed to select feeds");
                        }
                    }
                }
            }
        }

        tracing::info!(
            in_flight = self.tasks.len(),
            "scheduler: stopping, waiting for in-flight fetches"
        );
        self.shutdown().await;
        tracing::info!("scheduler: stopped");
    }

    /// Stops accepting work and waits for every dispatched fetch to finish.
    pub async fn shutdown(&self) {
        self.tasks.shutdown().await;
    }

    /// Number of feed tasks still running.
    #[must_use]
    pub fn running(&self) -> usize {
        self.tasks.len()
    }

    #[must_use]
    pub fn in_flight(&self) -> &InFlight {
        &self.in_flight
    }
}
