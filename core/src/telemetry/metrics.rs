use crate::polling::feed::Feed;
use std::collections::HashMap;
use std::sync::Mutex;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FeedCounters {
    pub succeeded: usize,
    pub failed: usize,
}

/// Success/failure counters per feed, shared between polling tasks.
pub struct FeedMetrics {
    inner: Mutex<HashMap<Feed, FeedCounters>>,
}

impl FeedMetrics {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(HashMap::new()),
        }
    }

    /// Counts a successful fetch and returns the feed's updated totals.
    pub fn record_success(&self, feed: Feed) -> FeedCounters {
        self.update(feed, |counters| counters.succeeded += 1)
    }

    pub fn record_failure(&self, feed: Feed) -> FeedCounters {
        self.update(feed, |counters| counters.failed += 1)
    }

    fn update(&self, feed: Feed, bump: impl FnOnce(&mut FeedCounters)) -> FeedCounters {
        match self.inner.lock() {
            Ok(mut counters) => {
                let entry = counters.entry(feed).or_default();
                bump(entry);
                *entry
            }
            Err(_) => FeedCounters::default(),
        }
    }

    pub fn snapshot(&self, feed: Feed) -> FeedCounters {
        if let Ok(counters) = self.inner.lock() {
            counters.get(&feed).copied().unwrap_or_default()
        } else {
            FeedCounters::default()
        }
    }
}

impl Default for FeedMetrics {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_are_kept_per_feed() {
        let metrics = FeedMetrics::new();
        metrics.record_success(Feed::Rssi);
        let totals = metrics.record_success(Feed::Rssi);
        metrics.record_failure(Feed::ValidDevices);

        assert_eq!(totals.succeeded, 2);

        assert_eq!(
            metrics.snapshot(Feed::Rssi),
            FeedCounters {
                succeeded: 2,
                failed: 0
            }
        );
        assert_eq!(metrics.snapshot(Feed::ValidDevices).failed, 1);
        assert_eq!(metrics.snapshot(Feed::ScannedDevices), FeedCounters::default());
    }
}
