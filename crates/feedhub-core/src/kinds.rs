//! Closed tag types persisted as short strings.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::CoreError;

/// Syndication format of a feed document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeedType {
    Rss,
    Atom,
}

impl FeedType {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            FeedType::Rss => "rss",
            FeedType::Atom => "atom",
        }
    }
}

impl fmt::Display for FeedType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FeedType {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "rss" => Ok(FeedType::Rss),
            "atom" => Ok(FeedType::Atom),
            other => Err(CoreError::UnknownFeedType(other.to_string())),
        }
    }
}

/// Category of a durable scraper failure.
///
/// Only failures that warrant an admin-visible record have a variant here.
/// Timeouts, undetectable formats, bad dates and duplicate posts are
/// informational and never reach the error log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorType {
    /// Transport failure (connect, TLS, body read, oversized body).
    #[serde(rename = "fetch_error")]
    Fetch,
    /// The server answered with a non-success status.
    #[serde(rename = "http_status")]
    HttpStatus,
    /// The document was recognised but could not be decoded.
    #[serde(rename = "parse_error")]
    Parse,
    /// A persistence call failed.
    #[serde(rename = "storage_error")]
    Storage,
}

impl ErrorType {
    pub const ALL: [ErrorType; 4] = [
        ErrorType::Fetch,
        ErrorType::HttpStatus,
        ErrorType::Parse,
        ErrorType::Storage,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorType::Fetch => "fetch_error",
            ErrorType::HttpStatus => "http_status",
            ErrorType::Parse => "parse_error",
            ErrorType::Storage => "storage_error",
        }
    }
}

impl fmt::Display for ErrorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ErrorType {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ErrorType::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| CoreError::UnknownErrorType(s.to_string()))
    }
}
