//! Feed ingestion runtime.
//!
//! Ties the scraper and the database together: the [`FetchScheduler`] picks
//! due feeds on a fixed interval and runs [`run_feed`] for each one inside a
//! supervised [`TaskGroup`]; failures are classified and recorded by
//! [`report_error`]; the notification jobs aggregate and prune digest rows.
//! All storage goes through the [`Store`] trait so the runtime can be driven
//! against Postgres ([`PgStore`]) or an in-memory double in tests.

pub mod classify;
pub mod error;
pub mod inflight;
pub mod notifications;
pub mod pipeline;
pub mod scheduler;
pub mod store;
pub mod tasks;

pub use classify::{classify, record_error, report_error, Disposition};
pub use error::PipelineError;
pub use inflight::{InFlight, InFlightGuard};
pub use notifications::{
    aggregate, cleanup, notifications_for_user, NotificationSettings, UserNotifications,
    DEFAULT_WINDOW_MINUTES,
};
pub use pipeline::{run_feed, FeedOutcome, FeedRunSummary};
pub use scheduler::{FetchScheduler, SchedulerSettings, TickReport};
pub use store::{PgStore, Store};
pub use tasks::TaskGroup;
