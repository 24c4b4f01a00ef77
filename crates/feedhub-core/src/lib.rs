//! Domain types, configuration, and pure policies shared by every feedhub crate.

pub mod app_config;
pub mod config;
pub mod interval;
pub mod kinds;
pub mod scoring;

pub use app_config::{AppConfig, Environment};
pub use config::{load_app_config, load_app_config_from_env};
pub use interval::refine_interval;
pub use kinds::{ErrorType, FeedType};
pub use scoring::{score_creators, CreatorStats};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("unknown feed type: {0}")]
    UnknownFeedType(String),

    #[error("unknown error type: {0}")]
    UnknownErrorType(String),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
}
