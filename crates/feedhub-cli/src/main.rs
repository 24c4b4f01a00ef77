mod commands;

use clap::{Parser, Subcommand};
use feedhub_core::FeedType;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

#[derive(Debug, Parser)]
#[command(name = "feedhub-cli")]
#[command(about = "Feedhub operator command line interface")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Database maintenance.
    Db {
        #[command(subcommand)]
        command: DbCommands,
    },
    /// Register a feed.
    AddFeed {
        #[arg(long)]
        url: String,
        #[arg(long)]
        name: String,
        /// `rss` or `atom`; detected on fetch when omitted.
        #[arg(long)]
        feed_type: Option<FeedType>,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        image_url: Option<String>,
    },
    /// List feeds, never-fetched first.
    ListFeeds {
        #[arg(long, default_value_t = 50)]
        limit: i64,
    },
    /// Show one feed and its latest posts.
    ShowFeed {
        feed_id: Uuid,
        #[arg(long, default_value_t = 10)]
        posts: i64,
    },
    AddUser {
        username: String,
    },
    Follow {
        #[arg(long)]
        user: Uuid,
        #[arg(long)]
        feed: Uuid,
    },
    /// Run one scheduling pass and wait for every dispatched fetch.
    Tick,
    /// Run notification aggregation once.
    Aggregate,
    /// Delete notifications past the retention window.
    Cleanup,
    /// List scraper error logs.
    Errors {
        #[arg(long)]
        unresolved: bool,
        #[arg(long, default_value_t = 50)]
        limit: i64,
        #[arg(long, default_value_t = 0)]
        offset: i64,
        /// Flag the listed rows as reported.
        #[arg(long)]
        mark_notified: bool,
    },
    ResolveError {
        id: i64,
        #[arg(long)]
        notes: Option<String>,
    },
    /// Show a user's notifications.
    Notifications {
        #[arg(long)]
        user: Uuid,
        /// Window in minutes; out-of-range values fall back to the default.
        #[arg(long)]
        interval: Option<i64>,
    },
}

#[derive(Debug, Subcommand)]
enum DbCommands {
    Ping,
    Migrate,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let Some(command) = cli.command else {
        println!("feedhub-cli: no command given; run with --help for usage");
        return Ok(());
    };

    let config = feedhub_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let pool_config = feedhub_db::PoolConfig::from_app_config(&config);
    let pool = feedhub_db::connect_pool(&config.database_url, pool_config).await?;
    tracing::debug!(?command, "cli: dispatching command");

    match command {
        Commands::Db {
            command: DbCommands::Ping,
        } => commands::ping(&pool).await,
        Commands::Db {
            command: DbCommands::Migrate,
        } => commands::migrate(&pool).await,
        Commands::AddFeed {
            url,
            name,
            feed_type,
            description,
            image_url,
        } => {
            let feed = feedhub_db::NewFeed {
                url,
                name,
                image_url,
                feed_type,
                description,
            };
            commands::add_feed(&pool, &feed).await
        }
        Commands::ListFeeds { limit } => commands::list_feeds(&pool, limit).await,
        Commands::ShowFeed { feed_id, posts } => commands::show_feed(&pool, feed_id, posts).await,
        Commands::AddUser { username } => commands::add_user(&pool, &username).await,
        Commands::Follow { user, feed } => commands::follow(&pool, user, feed).await,
        Commands::Tick => commands::tick(pool, &config).await,
        Commands::Aggregate => commands::aggregate(pool, &config).await,
        Commands::Cleanup => commands::cleanup(pool, &config).await,
        Commands::Errors {
            unresolved,
            limit,
            offset,
            mark_notified,
        } => commands::list_errors(&pool, unresolved, limit, offset, mark_notified).await,
        Commands::ResolveError { id, notes } => {
            commands::resolve_error(&pool, id, notes.as_deref()).await
        }
        Commands::Notifications { user, interval } => {
            commands::notifications(pool, &config, user, interval).await
        }
    }
}

#[cfg(test)]
mod tests;
