//! Ranking score for "top creator" listings.
//!
//! Each raw metric is min-max normalized across the scored cohort to
//! `[0, 100]`, then combined as
//! `consistency * 0.2 + engagement * 0.8 + random * 0.05` where
//! `engagement = follows * 0.5 + likes * 0.3 + comments * 0.2`.
//! The random term is drawn from `[0, 100)` and only separates creators whose
//! weighted scores are nearly equal.

use rand::Rng;

pub const CONSISTENCY_WEIGHT: f64 = 0.2;
pub const ENGAGEMENT_WEIGHT: f64 = 0.8;
pub const RANDOM_WEIGHT: f64 = 0.05;

pub const FOLLOWS_WEIGHT: f64 = 0.5;
pub const LIKES_WEIGHT: f64 = 0.3;
pub const COMMENTS_WEIGHT: f64 = 0.2;

/// Engagement and posting counters for one creator.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CreatorStats {
    pub follows: u64,
    pub likes: u64,
    pub comments: u64,
    pub created_feeds: u64,
    /// Mean gap between the creator's consecutive feeds, in hours.
    pub average_time_between_feeds: f64,
}

impl CreatorStats {
    /// Feeds created per unit of average interval.
    ///
    /// A zero (or non-finite) average interval falls back to the created-feed
    /// count itself.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn consistency(&self) -> f64 {
        let created = self.created_feeds as f64;
        if self.average_time_between_feeds > 0.0 && self.average_time_between_feeds.is_finite() {
            created / self.average_time_between_feeds
        } else {
            created
        }
    }
}

/// Scale `values` linearly so the smallest maps to `0` and the largest to `100`.
///
/// A cohort where every value is equal normalizes to all zeros.
#[must_use]
pub fn min_max_normalize(values: &[f64]) -> Vec<f64> {
    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let range = max - min;

    values
        .iter()
        .map(|v| {
            if range > 0.0 {
                (v - min) / range * 100.0
            } else {
                0.0
            }
        })
        .collect()
}

/// Score every creator in `creators`, returning scores in input order.
///
/// Deterministic for a given `rng` state.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn score_creators<R: Rng + ?Sized>(creators: &[CreatorStats], rng: &mut R) -> Vec<f64> {
    let follows = min_max_normalize(
        &creators
            .iter()
            .map(|c| c.follows as f64)
            .collect::<Vec<_>>(),
    );
    let likes = min_max_normalize(&creators.iter().map(|c| c.likes as f64).collect::<Vec<_>>());
    let comments = min_max_normalize(
        &creators
            .iter()
            .map(|c| c.comments as f64)
            .collect::<Vec<_>>(),
    );
    let consistency = min_max_normalize(
        &creators
            .iter()
            .map(CreatorStats::consistency)
            .collect::<Vec<_>>(),
    );

    (0..creators.len())
        .map(|i| {
            let engagement = follows[i] * FOLLOWS_WEIGHT
                + likes[i] * LIKES_WEIGHT
                + comments[i] * COMMENTS_WEIGHT;
            let random_factor: f64 = rng.random_range(0.0..100.0);
            consistency[i] * CONSISTENCY_WEIGHT
                + engagement * ENGAGEMENT_WEIGHT
                + random_factor * RANDOM_WEIGHT
        })
        .collect()
}
