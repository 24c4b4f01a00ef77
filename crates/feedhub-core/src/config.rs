use crate::app_config::{AppConfig, Environment};
use crate::ConfigError;

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// Decoupled from the process environment so it can be tested with a plain
/// `HashMap` lookup.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::net::SocketAddr;

    let require = |var: &str| -> Result<String, ConfigError> {
        lookup(var).map_err(|_| ConfigError::MissingEnvVar(var.to_string()))
    };

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let parse_addr = |var: &str, default: &str| -> Result<SocketAddr, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<SocketAddr>()
            .map_err(|e| ConfigError::InvalidEnvVar {
                var: var.to_string(),
                reason: e.to_string(),
            })
    };

    let parse_u32 = |var: &str, default: &str| -> Result<u32, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u32>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u64>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let parse_i64 = |var: &str, default: &str| -> Result<i64, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<i64>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let database_url = require("DATABASE_URL")?;

    let env = parse_environment(&or_default("FEEDHUB_ENV", "development"))?;
    let bind_addr = parse_addr("FEEDHUB_BIND_ADDR", "0.0.0.0:3000")?;
    let log_level = or_default("FEEDHUB_LOG_LEVEL", "info");

    let db_max_connections = parse_u32("FEEDHUB_DB_MAX_CONNECTIONS", "10")?;
    let db_min_connections = parse_u32("FEEDHUB_DB_MIN_CONNECTIONS", "1")?;
    let db_acquire_timeout_secs = parse_u64("FEEDHUB_DB_ACQUIRE_TIMEOUT_SECS", "10")?;
    let db_call_timeout_secs = positive(
        "FEEDHUB_DB_CALL_TIMEOUT_SECS",
        parse_u64("FEEDHUB_DB_CALL_TIMEOUT_SECS", "5")?,
    )?;

    if db_min_connections > db_max_connections {
        return Err(ConfigError::InvalidEnvVar {
            var: "FEEDHUB_DB_MIN_CONNECTIONS".to_string(),
            reason: format!(
                "min connections ({db_min_connections}) exceeds max connections ({db_max_connections})"
            ),
        });
    }

    let fetch_workers = positive(
        "FEEDHUB_FETCH_WORKERS",
        parse_u32("FEEDHUB_FETCH_WORKERS", "10")?,
    )?;
    let fetch_interval_secs = positive(
        "FEEDHUB_FETCH_INTERVAL_SECS",
        parse_u64("FEEDHUB_FETCH_INTERVAL_SECS", "60")?,
    )?;
    let fetch_timeout_secs = positive(
        "FEEDHUB_FETCH_TIMEOUT_SECS",
        parse_u64("FEEDHUB_FETCH_TIMEOUT_SECS", "10")?,
    )?;
    let fetch_max_retries = parse_u32("FEEDHUB_FETCH_MAX_RETRIES", "3")?;
    let fetch_retry_backoff_base_ms = parse_u64("FEEDHUB_FETCH_RETRY_BACKOFF_BASE_MS", "500")?;
    let fetch_user_agent = or_default("FEEDHUB_FETCH_USER_AGENT", "feedhub/0.1 (feed-aggregator)");

    let notification_window_minutes = positive(
        "FEEDHUB_NOTIFICATION_WINDOW_MINUTES",
        parse_i64("FEEDHUB_NOTIFICATION_WINDOW_MINUTES", "10")?,
    )?;
    let notification_retention_minutes = positive(
        "FEEDHUB_NOTIFICATION_RETENTION_MINUTES",
        parse_i64("FEEDHUB_NOTIFICATION_RETENTION_MINUTES", "1440")?,
    )?;

    if notification_window_minutes > notification_retention_minutes {
        return Err(ConfigError::InvalidEnvVar {
            var: "FEEDHUB_NOTIFICATION_WINDOW_MINUTES".to_string(),
            reason: format!(
                "window ({notification_window_minutes}) exceeds retention ({notification_retention_minutes})"
            ),
        });
    }

    let notification_cron = or_default("FEEDHUB_NOTIFICATION_CRON", "0 * * * * *");
    let cleanup_cron = or_default("FEEDHUB_CLEANUP_CRON", "0 */5 * * * *");

    Ok(AppConfig {
        database_url,
        env,
        bind_addr,
        log_level,
        db_max_connections,
        db_min_connections,
        db_acquire_timeout_secs,
        db_call_timeout_secs,
        fetch_workers,
        fetch_interval_secs,
        fetch_timeout_secs,
        fetch_max_retries,
        fetch_retry_backoff_base_ms,
        fetch_user_agent,
        notification_window_minutes,
        notification_retention_minutes,
        notification_cron,
        cleanup_cron,
    })
}

/// Reject zero (and, for signed values, negative) settings that would stall
/// a loop or produce an empty window.
fn positive<T>(var: &str, value: T) -> Result<T, ConfigError>
where
    T: PartialOrd + Default + std::fmt::Display,
{
    if value > T::default() {
        Ok(value)
    } else {
        Err(ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: format!("must be greater than zero, got {value}"),
        })
    }
}

/// Parse a string into an `Environment` variant.
///
/// # Errors
///
/// Returns [`ConfigError::InvalidEnvVar`] for unrecognized values.
fn parse_environment(s: &str) -> Result<Environment, ConfigError> {
    match s {
        "development" => Ok(Environment::Development),
        "test" => Ok(Environment::Test),
        "production" => Ok(Environment::Production),
        other => Err(ConfigError::InvalidEnvVar {
            var: "FEEDHUB_ENV".to_string(),
            reason: format!("unknown environment \"{other}\""),
        }),
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
