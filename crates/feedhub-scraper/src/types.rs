use chrono::{DateTime, Utc};
use feedhub_core::FeedType;

/// A decoded feed document, independent of its source dialect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedFeed {
    pub feed_type: FeedType,
    pub channel: ParsedChannel,
    pub items: Vec<ParsedItem>,
}

/// Channel-level metadata, copied onto every stored post.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedChannel {
    pub title: String,
    pub link: Option<String>,
    pub description: Option<String>,
    pub language: Option<String>,
    pub image_url: Option<String>,
}

/// One syndicated item.
///
/// `published` falls back to the item's updated date; it is `None` when the
/// item has neither or the text matched no known format.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedItem {
    pub title: String,
    pub link: Option<String>,
    pub description: Option<String>,
    pub published: Option<DateTime<Utc>>,
    pub image_url: Option<String>,
}
