//! Per-feed in-flight guard.
//!
//! A feed whose previous fetch is still running is not dispatched again.
//! The guard is released when the owning task finishes, including by panic.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, PoisonError};

use uuid::Uuid;

#[derive(Debug, Clone, Default)]
pub struct InFlight {
    feeds: Arc<Mutex<HashSet<Uuid>>>,
}

impl InFlight {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Claims `feed_id`, or returns `None` if it is already claimed.
    #[must_use]
    pub fn try_acquire(&self, feed_id: Uuid) -> Option<InFlightGuard> {
        let mut feeds = self.feeds.lock().unwrap_or_else(PoisonError::into_inner);
        feeds.insert(feed_id).then(|| InFlightGuard {
            feeds: Arc::clone(&self.feeds),
            feed_id,
        })
    }

    #[must_use]
    pub fn contains(&self, feed_id: Uuid) -> bool {
        self.feeds
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(&feed_id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.feeds.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug)]
pub struct InFlightGuard {
    feeds: Arc<Mutex<HashSet<Uuid>>>,
    feed_id: Uuid,
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.feeds
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&self.feed_id);
    }
}
