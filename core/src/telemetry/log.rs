use crate::polling::feed::Feed;
use crate::prelude::FetchError;
use crate::telemetry::metrics::FeedCounters;
use log::{debug, warn};

/// Writes per-feed poll outcomes through the `log` facade.
#[derive(Debug, Clone, Copy, Default)]
pub struct FeedLog;

impl FeedLog {
    pub fn new() -> Self {
        Self
    }

    pub fn record_success(&self, feed: Feed, generation: u64, totals: FeedCounters) {
        debug!(
            "{} poll #{} fetched ({} ok, {} failed)",
            feed.name(),
            generation,
            totals.succeeded,
            totals.failed
        );
    }

    pub fn record_failure(
        &self,
        feed: Feed,
        generation: u64,
        error: &FetchError,
        totals: FeedCounters,
    ) {
        warn!(
            "Error fetching {} from {} (poll #{}): {}",
            feed.name(),
            feed.path(),
            generation,
            error
        );
        debug!(
            "{} totals: {} ok, {} failed",
            feed.name(),
            totals.succeeded,
            totals.failed
        );
    }

    pub fn record_stale(&self, feed: Feed, generation: u64, newest: u64) {
        debug!(
            "{} poll #{} arrived after #{}, ignoring",
            feed.name(),
            generation,
            newest
        );
    }
}
