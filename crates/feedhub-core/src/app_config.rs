use std::net::SocketAddr;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

#[derive(Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub env: Environment,
    pub bind_addr: SocketAddr,
    pub log_level: String,
    pub db_max_connections: u32,
    pub db_min_connections: u32,
    pub db_acquire_timeout_secs: u64,
    /// Upper bound for any single storage call made by the ingest runtime.
    pub db_call_timeout_secs: u64,
    /// Feeds selected per scheduler tick; also the per-tick concurrency bound.
    pub fetch_workers: u32,
    pub fetch_interval_secs: u64,
    /// Per-attempt HTTP timeout.
    pub fetch_timeout_secs: u64,
    pub fetch_max_retries: u32,
    pub fetch_retry_backoff_base_ms: u64,
    pub fetch_user_agent: String,
    pub notification_window_minutes: i64,
    /// Notifications older than this are purged; also the largest window a
    /// caller may request.
    pub notification_retention_minutes: i64,
    pub notification_cron: String,
    pub cleanup_cron: String,
}

impl AppConfig {
    #[must_use]
    pub fn fetch_interval(&self) -> Duration {
        Duration::from_secs(self.fetch_interval_secs)
    }

    #[must_use]
    pub fn db_call_timeout(&self) -> Duration {
        Duration::from_secs(self.db_call_timeout_secs)
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("env", &self.env)
            .field("bind_addr", &self.bind_addr)
            .field("log_level", &self.log_level)
            .field("database_url", &"[redacted]")
            .field("db_max_connections", &self.db_max_connections)
            .field("db_min_connections", &self.db_min_connections)
            .field("db_acquire_timeout_secs", &self.db_acquire_timeout_secs)
            .field("db_call_timeout_secs", &self.db_call_timeout_secs)
            .field("fetch_workers", &self.fetch_workers)
            .field("fetch_interval_secs", &self.fetch_interval_secs)
            .field("fetch_timeout_secs", &self.fetch_timeout_secs)
            .field("fetch_max_retries", &self.fetch_max_retries)
            .field(
                "fetch_retry_backoff_base_ms",
                &self.fetch_retry_backoff_base_ms,
            )
            .field("fetch_user_agent", &self.fetch_user_agent)
            .field(
                "notification_window_minutes",
                &self.notification_window_minutes,
            )
            .field(
                "notification_retention_minutes",
                &self.notification_retention_minutes,
            )
            .field("notification_cron", &self.notification_cron)
            .field("cleanup_cron", &self.cleanup_cron)
            .finish()
    }
}
