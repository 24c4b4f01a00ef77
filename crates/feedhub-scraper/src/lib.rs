//! Feed fetching and decoding.
//!
//! [`FeedClient`] performs the retrying HTTP GET. [`parse_feed`] decodes RSS
//! or Atom into a [`ParsedFeed`] via `feed-rs`, with item dates read by the
//! lenient [`parse_published`].

pub mod client;
pub mod dates;
pub mod detect;
pub mod error;
pub mod parse;
pub(crate) mod retry;
pub mod types;

pub use client::{FeedClient, MAX_BODY_BYTES};
pub use dates::parse_published;
pub use detect::detect_feed_type;
pub use error::ScraperError;
pub use parse::{parse_feed, strip_html};
pub use types::{ParsedChannel, ParsedFeed, ParsedItem};
