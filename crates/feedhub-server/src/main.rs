mod api;
mod middleware;
mod scheduler;

use std::sync::Arc;

use feedhub_ingest::{FetchScheduler, NotificationSettings, PgStore, SchedulerSettings};
use feedhub_scraper::FeedClient;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

use crate::api::{build_app, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Arc::new(feedhub_core::load_app_config()?);
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();
    tracing::info!(config = ?config, "server: configuration loaded");

    let pool_config = feedhub_db::PoolConfig::from_app_config(&config);
    let pool = feedhub_db::connect_pool(&config.database_url, pool_config).await?;
    let applied = feedhub_db::run_migrations(&pool).await?;
    tracing::info!(applied, "server: migrations up to date");

    let store = Arc::new(PgStore::new(pool.clone(), config.db_call_timeout()));
    let client = Arc::new(FeedClient::from_app_config(&config)?);
    let notifications = NotificationSettings::from_app_config(&config);

    let fetcher = Arc::new(FetchScheduler::new(
        Arc::clone(&store),
        client,
        SchedulerSettings::from_app_config(&config),
    ));
    let cancel = CancellationToken::new();
    let fetch_loop = {
        let fetcher = Arc::clone(&fetcher);
        let cancel = cancel.clone();
        tokio::spawn(async move { fetcher.run(cancel).await })
    };

    let mut jobs = scheduler::build_scheduler(Arc::clone(&store), notifications, &config).await?;

    let app = build_app(AppState {
        pool,
        store,
        notifications,
    });

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    tracing::info!(addr = %config.bind_addr, "server: listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    cancel.cancel();
    jobs.shutdown().await?;
    fetch_loop.await?;
    tracing::info!("server: shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("received shutdown signal, starting graceful shutdown");
}
