use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScraperError {
    #[error("request to {url} timed out")]
    Timeout { url: String },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("unexpected HTTP status {status} from {url}")]
    UnexpectedStatus { status: u16, url: String },

    #[error("response body from {url} exceeds {limit} bytes")]
    BodyTooLarge { url: String, limit: usize },

    #[error("could not detect feed type")]
    UndetectedFeedType,

    #[error("feed parse error: {0}")]
    Feed(#[source] feed_rs::parser::ParseFeedError),
}

impl ScraperError {
    /// HTTP status carried by the error, if the server answered at all.
    #[must_use]
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::UnexpectedStatus { status, .. } => Some(*status),
            Self::Http(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}
