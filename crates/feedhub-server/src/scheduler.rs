//! Cron jobs for notification aggregation and cleanup.
//!
//! Both run on their own cadence, independent of the fetch loop.

use std::sync::Arc;

use chrono::Utc;
use feedhub_ingest::{aggregate, cleanup, NotificationSettings, PgStore};
use tokio_cron_scheduler::{Job, JobScheduler, JobSchedulerError};

/// Builds and starts the job scheduler.
///
/// The returned [`JobScheduler`] must be kept alive for the lifetime of the
/// process; call `shutdown` on it to stop the jobs.
///
/// # Errors
///
/// Returns [`JobSchedulerError`] if the scheduler cannot be initialised,
/// a cron expression is invalid, or the scheduler fails to start.
pub async fn build_scheduler(
    store: Arc<PgStore>,
    settings: NotificationSettings,
    config: &feedhub_core::AppConfig,
) -> Result<JobScheduler, JobSchedulerError> {
    let scheduler = JobScheduler::new().await?;

    register_aggregation_job(&scheduler, Arc::clone(&store), settings, &config.notification_cron)
        .await?;
    register_cleanup_job(&scheduler, store, settings, &config.cleanup_cron).await?;

    scheduler.start().await?;
    Ok(scheduler)
}

async fn register_aggregation_job(
    scheduler: &JobScheduler,
    store: Arc<PgStore>,
    settings: NotificationSettings,
    cron: &str,
) -> Result<(), JobSchedulerError> {
    let job = Job::new_async(cron, move |_uuid, _lock| {
        let store = Arc::clone(&store);

        Box::pin(async move {
            tracing::debug!("scheduler: starting notification aggregation");
            if let Err(e) = aggregate(store.as_ref(), &settings).await {
                tracing::error!(error = %e, "scheduler: notification aggregation failed");
            }
        })
    })?;

    scheduler.add(job).await?;
    tracing::info!(cron, "scheduler: registered notification aggregation job");
    Ok(())
}

async fn register_cleanup_job(
    scheduler: &JobScheduler,
    store: Arc<PgStore>,
    settings: NotificationSettings,
    cron: &str,
) -> Result<(), JobSchedulerError> {
    let job = Job::new_async(cron, move |_uuid, _lock| {
        let store = Arc::clone(&store);

        Box::pin(async move {
            tracing::debug!("scheduler: starting notification cleanup");
            if let Err(e) = cleanup(store.as_ref(), &settings, Utc::now()).await {
                tracing::error!(error = %e, "scheduler: notification cleanup failed");
            }
        })
    })?;

    scheduler.add(job).await?;
    tracing::info!(cron, "scheduler: registered notification cleanup job");
    Ok(())
}
