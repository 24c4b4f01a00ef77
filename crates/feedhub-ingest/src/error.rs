use feedhub_db::DbError;
use feedhub_scraper::ScraperError;
use thiserror::Error;

/// Any failure raised while processing one feed.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Scraper(#[from] ScraperError),

    #[error(transparent)]
    Db(#[from] DbError),
}
