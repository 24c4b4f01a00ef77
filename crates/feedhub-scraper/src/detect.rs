use feed_rs::model;
use feed_rs::parser::{ParseErrorKind, ParseFeedError};

use feedhub_core::FeedType;

use crate::error::ScraperError;
use crate::parse::feed_parser;

/// Detects the feed dialect of `body`.
///
/// RSS 0.9x, 1.0 (`<rdf:RDF>`) and 2.0 are all [`FeedType::Rss`]; `<feed>` is
/// [`FeedType::Atom`]. JSON Feed and documents without a feed root are
/// undetected.
///
/// # Errors
///
/// - [`ScraperError::UndetectedFeedType`] when the document is not RSS or Atom.
/// - [`ScraperError::Feed`] when it is a feed but cannot be decoded.
pub fn detect_feed_type(body: &[u8]) -> Result<FeedType, ScraperError> {
    let feed = feed_parser().parse(body).map_err(decode_error)?;
    feed_kind(&feed.feed_type)
}

pub(crate) fn feed_kind(kind: &model::FeedType) -> Result<FeedType, ScraperError> {
    match kind {
        model::FeedType::RSS0 | model::FeedType::RSS1 | model::FeedType::RSS2 => Ok(FeedType::Rss),
        model::FeedType::Atom => Ok(FeedType::Atom),
        _ => Err(ScraperError::UndetectedFeedType),
    }
}

/// Splits "not a feed at all" from "a feed we failed to read".
pub(crate) fn decode_error(err: ParseFeedError) -> ScraperError {
    match err {
        ParseFeedError::ParseError(ParseErrorKind::NoFeedRoot)
        | ParseFeedError::JsonSerde(_)
        | ParseFeedError::JsonUnsupportedVersion(_) => ScraperError::UndetectedFeedType,
        other => ScraperError::Feed(other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_rss_2() {
        let xml = br#"<?xml version="1.0"?><rss version="2.0"><channel><title>x</title></channel></rss>"#;
        assert_eq!(detect_feed_type(xml).unwrap(), FeedType::Rss);
    }

    #[test]
    fn detects_rss_1_rdf_root() {
        let xml = br#"<rdf:RDF xmlns:rdf="http://www.w3.org/1999/02/22-rdf-syntax-ns#" xmlns="http://purl.org/rss/1.0/"><channel><title>x</title></channel></rdf:RDF>"#;
        assert_eq!(detect_feed_type(xml).unwrap(), FeedType::Rss);
    }

    #[test]
    fn detects_atom_after_comment() {
        let xml = br#"<?xml version="1.0"?>
<!-- generated -->
<feed xmlns="http://www.w3.org/2005/Atom"><title>x</title></feed>"#;
        assert_eq!(detect_feed_type(xml).unwrap(), FeedType::Atom);
    }

    #[test]
    fn html_page_is_undetected() {
        let xml = b"<!DOCTYPE html><html><head><title>Not a feed</title></head></html>";
        assert!(matches!(
            detect_feed_type(xml),
            Err(ScraperError::UndetectedFeedType)
        ));
    }

    #[test]
    fn json_body_is_undetected() {
        assert!(matches!(
            detect_feed_type(b"{\"json\": true}"),
            Err(ScraperError::UndetectedFeedType)
        ));
    }

    #[test]
    fn json_feed_is_undetected() {
        let body = br#"{"version": "https://jsonfeed.org/version/1.1", "title": "J", "items": []}"#;
        assert!(matches!(
            detect_feed_type(body),
            Err(ScraperError::UndetectedFeedType)
        ));
    }

    #[test]
    fn maps_every_rss_version() {
        for kind in [model::FeedType::RSS0, model::FeedType::RSS1, model::FeedType::RSS2] {
            assert_eq!(feed_kind(&kind).unwrap(), FeedType::Rss);
        }
        assert_eq!(feed_kind(&model::FeedType::Atom).unwrap(), FeedType::Atom);
        assert!(matches!(
            feed_kind(&model::FeedType::JSON),
            Err(ScraperError::UndetectedFeedType)
        ));
    }
}
