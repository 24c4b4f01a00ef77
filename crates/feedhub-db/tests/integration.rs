//! Offline unit tests for feedhub-db pool configuration and row types.
//! These tests do not require a live database connection.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};

use chrono::Utc;
use feedhub_core::{AppConfig, Environment, ErrorType, FeedType};
use feedhub_db::{ErrorLogRow, FeedRow, PoolConfig};
use uuid::Uuid;

fn app_config() -> AppConfig {
    AppConfig {
        database_url: "postgres://example".to_string(),
        env: Environment::Test,
        bind_addr: SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), 3000),
        log_level: "info".to_string(),
        db_max_connections: 42,
        db_min_connections: 7,
        db_acquire_timeout_secs: 9,
        db_call_timeout_secs: 5,
        fetch_workers: 10,
        fetch_interval_secs: 60,
        fetch_timeout_secs: 10,
        fetch_max_retries: 3,
        fetch_retry_backoff_base_ms: 500,
        fetch_user_agent: "ua".to_string(),
        notification_window_minutes: 10,
        notification_retention_minutes: 1440,
        notification_cron: "0 * * * * *".to_string(),
        cleanup_cron: "0 */5 * * * *".to_string(),
    }
}

fn feed_row(feed_type: Option<&str>) -> FeedRow {
    FeedRow {
        id: Uuid::new_v4(),
        url: "https://example.com/feed.xml".to_string(),
        name: "Example".to_string(),
        image_url: None,
        feed_type: feed_type.map(str::to_string),
        description: None,
        last_fetched_at: None,
        version: 1,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

#[test]
fn pool_config_from_app_config_uses_core_values() {
    let pool_config = PoolConfig::from_app_config(&app_config());
    assert_eq!(pool_config.max_connections, 42);
    assert_eq!(pool_config.min_connections, 7);
    assert_eq!(pool_config.acquire_timeout_secs, 9);
}

#[test]
fn feed_row_kind_parses_stored_tag() {
    assert_eq!(feed_row(Some("atom")).kind().unwrap(), Some(FeedType::Atom));
    assert_eq!(feed_row(None).kind().unwrap(), None);
    assert!(feed_row(Some("json")).kind().is_err());
}

#[test]
fn error_log_row_kind_parses_stored_tag() {
    let now = Utc::now();
    let row = ErrorLogRow {
        id: 1,
        error_type: "http_status".to_string(),
        feed_id: Uuid::new_v4(),
        message: "unexpected HTTP status 503".to_string(),
        status_code: Some(503),
        retry_attempts: 0,
        admin_notified: false,
        resolved: false,
        resolution_notes: None,
        occurred_at: now,
        occurrence_count: 1,
        last_occurrence: now,
        created_at: now,
        updated_at: now,
    };

    assert_eq!(row.kind().unwrap(), ErrorType::HttpStatus);
}
