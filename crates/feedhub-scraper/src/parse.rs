//! Maps a `feed-rs` document onto [`ParsedFeed`].
//!
//! `feed-rs` handles the dialects, character encodings and entity decoding;
//! this module picks the fields a stored post carries and normalises them.

use chrono::{DateTime, Utc};
use feed_rs::model::{Entry, Feed, Link};
use feed_rs::parser::{self, Parser};

use crate::dates::parse_published;
use crate::detect::{decode_error, feed_kind};
use crate::error::ScraperError;
use crate::types::{ParsedChannel, ParsedFeed, ParsedItem};

/// Detects the dialect of `body` and decodes it.
///
/// # Errors
///
/// - [`ScraperError::UndetectedFeedType`] if the document is neither RSS nor Atom.
/// - [`ScraperError::Feed`] if the document is malformed.
pub fn parse_feed(body: &[u8]) -> Result<ParsedFeed, ScraperError> {
    let feed = feed_parser().parse(body).map_err(decode_error)?;
    let feed_type = feed_kind(&feed.feed_type)?;
    let channel = channel(&feed);
    let items = feed.entries.into_iter().map(item).collect();

    Ok(ParsedFeed {
        feed_type,
        channel,
        items,
    })
}

/// A parser whose timestamps go through [`parse_published`].
pub(crate) fn feed_parser() -> Parser {
    parser::Builder::new().timestamp_parser(timestamp).build()
}

fn timestamp(text: &str) -> Option<DateTime<Utc>> {
    let parsed = parse_published(text);
    if parsed.is_none() {
        tracing::debug!(raw_date = text, "parse: unparseable date");
    }
    parsed
}

/// Strip HTML tags from a string and normalize whitespace.
#[must_use]
pub fn strip_html(html: &str) -> String {
    let mut out = String::with_capacity(html.len());
    let mut in_tag = false;
    for ch in html.chars() {
        match ch {
            '<' => in_tag = true,
            '>' => {
                in_tag = false;
                out.push(' ');
            }
            _ if !in_tag => out.push(ch),
            _ => {}
        }
    }
    out.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn channel(feed: &Feed) -> ParsedChannel {
    ParsedChannel {
        title: feed
            .title
            .as_ref()
            .map(|t| strip_html(&t.content))
            .unwrap_or_default(),
        link: page_link(&feed.links),
        description: feed
            .description
            .as_ref()
            .and_then(|d| non_empty(&strip_html(&d.content))),
        language: feed.language.as_deref().and_then(non_empty),
        image_url: feed
            .logo
            .as_ref()
            .or(feed.icon.as_ref())
            .and_then(|image| non_empty(&image.uri)),
    }
}

fn item(entry: Entry) -> ParsedItem {
    let link = page_link(&entry.links).or_else(|| {
        // RSS items sometimes carry only a permalink guid.
        entry
            .id
            .starts_with("http")
            .then(|| entry.id.clone())
    });
    let image_url = item_image(&entry);
    let description = entry
        .summary
        .map(|s| s.content)
        .or_else(|| entry.content.and_then(|c| c.body))
        .and_then(|d| non_empty(&strip_html(&d)));

    ParsedItem {
        title: entry
            .title
            .map(|t| strip_html(&t.content))
            .unwrap_or_default(),
        link,
        description,
        published: entry.published.or(entry.updated),
        image_url,
    }
}

/// The human-facing link: `alternate` (or unlabelled) first, never `self`
/// or an enclosure.
fn page_link(links: &[Link]) -> Option<String> {
    links
        .iter()
        .find(|l| l.rel.as_deref().is_none_or(|rel| rel == "alternate"))
        .and_then(|l| non_empty(&l.href))
}

fn item_image(entry: &Entry) -> Option<String> {
    let from_media = entry.media.iter().find_map(|media| {
        media
            .content
            .iter()
            .filter(|c| is_image(c.content_type.as_ref().map(|m| m.as_str())))
            .find_map(|c| c.url.as_ref().and_then(|u| non_empty(u.as_str())))
            .or_else(|| {
                media
                    .thumbnails
                    .iter()
                    .find_map(|t| non_empty(&t.image.uri))
            })
    });

    from_media.or_else(|| {
        entry
            .links
            .iter()
            .filter(|l| l.rel.as_deref() == Some("enclosure"))
            .filter(|l| is_image(l.media_type.as_deref()))
            .find_map(|l| non_empty(&l.href))
    })
}

fn is_image(mime: Option<&str>) -> bool {
    mime.is_none_or(|m| m.starts_with("image/"))
}

fn non_empty(s: &str) -> Option<String> {
    let trimmed = s.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_owned())
}

#[cfg(test)]
#[path = "parse_test.rs"]
mod tests;
