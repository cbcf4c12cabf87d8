use crate::polling::feed::{Feed, FeedOutcome, FeedSource};
use crate::telemetry::{FeedLog, FeedMetrics};
use log::{debug, info, warn};
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::task::{JoinHandle, JoinSet};
use tokio::time::{self, MissedTickBehavior};

pub const DEFAULT_POLL_PERIOD: Duration = Duration::from_millis(500);

struct Dispatcher<S> {
    source: S,
    generations: [AtomicU64; 4],
    metrics: FeedMetrics,
    log: FeedLog,
}

impl<S: FeedSource> Dispatcher<S> {
    fn next_generation(&self, feed: Feed) -> u64 {
        self.generations[feed.index()].fetch_add(1, Ordering::Relaxed) + 1
    }

    async fn complete(&self, feed: Feed, generation: u64) -> FeedOutcome {
        let result = self.source.fetch(feed).await;
        match &result {
            Ok(_) => {
                let totals = self.metrics.record_success(feed);
                self.log.record_success(feed, generation, totals);
            }
            Err(error) => {
                let totals = self.metrics.record_failure(feed);
                self.log.record_failure(feed, generation, error, totals);
            }
        }
        FeedOutcome {
            feed,
            generation,
            result,
        }
    }
}

/// Periodically polls every configured feed, each on its own independent schedule.
pub struct PollingScheduler<S: FeedSource> {
    period: Duration,
    feeds: Vec<Feed>,
    dispatcher: Arc<Dispatcher<S>>,
}

impl<S: FeedSource> PollingScheduler<S> {
    pub fn new(source: S, period: Duration) -> Self {
        Self {
            period: period.max(Duration::from_millis(1)),
            feeds: Feed::ALL.to_vec(),
            dispatcher: Arc::new(Dispatcher {
                source,
                generations: Default::default(),
                metrics: FeedMetrics::new(),
                log: FeedLog::new(),
            }),
        }
    }

    pub fn with_feeds(mut self, feeds: impl IntoIterator<Item = Feed>) -> Self {
        self.feeds = feeds.into_iter().collect();
        self
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    pub fn feeds(&self) -> &[Feed] {
        &self.feeds
    }

    pub fn metrics(&self) -> &FeedMetrics {
        &self.dispatcher.metrics
    }

    /// One poll of `feed`. The generation is taken now, not when the future first runs.
    pub fn poll(&self, feed: Feed) -> impl Future<Output = FeedOutcome> + Send + 'static {
        let dispatcher = self.dispatcher.clone();
        let generation = dispatcher.next_generation(feed);
        async move { dispatcher.complete(feed, generation).await }
    }

    /// Fires every feed once, concurrently, and waits for all of them.
    pub async fn run_cycle(&self) -> Vec<FeedOutcome> {
        let handles: Vec<_> = self
            .feeds
            .iter()
            .map(|&feed| tokio::spawn(self.poll(feed)))
            .collect();

        let mut outcomes = Vec::with_capacity(handles.len());
        for handle in handles {
            match handle.await {
                Ok(outcome) => outcomes.push(outcome),
                Err(error) => warn!("poll task did not complete: {}", error),
            }
        }
        outcomes
    }

    /// Starts one polling loop per feed. Each fires immediately, then every period,
    /// until the returned handle is stopped or dropped. Outcomes go to `sink`.
    pub fn start(&self, sink: mpsc::UnboundedSender<FeedOutcome>) -> PollingHandle {
        let (stop_tx, stop_rx) = watch::channel(false);
        let tasks = self
            .feeds
            .iter()
            .map(|&feed| {
                let dispatcher = self.dispatcher.clone();
                let sink = sink.clone();
                let stop_rx = stop_rx.clone();
                tokio::spawn(feed_loop(feed, self.period, dispatcher, sink, stop_rx))
            })
            .collect();

        info!(
            "polling {} feeds every {} ms",
            self.feeds.len(),
            self.period.as_millis()
        );
        PollingHandle { stop_tx, tasks }
    }
}

async fn feed_loop<S: FeedSource>(
    feed: Feed,
    period: Duration,
    dispatcher: Arc<Dispatcher<S>>,
    sink: mpsc::UnboundedSender<FeedOutcome>,
    mut stop_rx: watch::Receiver<bool>,
) {
    let mut ticker = time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // Fetches run detached from the ticker so a slow response never delays the next tick.
    let mut in_flight = JoinSet::new();

    loop {
        tokio::select! {
            changed = stop_rx.changed() => {
                if changed.is_err() || *stop_rx.borrow() {
                    break;
                }
            }
            _ = ticker.tick() => {
                if sink.is_closed() {
                    break;
                }
                let generation = dispatcher.next_generation(feed);
                let dispatcher = dispatcher.clone();
                let sink = sink.clone();
                in_flight.spawn(async move {
                    let outcome = dispatcher.complete(feed, generation).await;
                    let _ = sink.send(outcome);
                });
            }
            Some(_) = in_flight.join_next(), if !in_flight.is_empty() => {}
        }
    }

    in_flight.abort_all();
    debug!("{} polling stopped", feed.name());
}

/// Lifecycle handle for a running scheduler. Dropping it also stops the loops.
pub struct PollingHandle {
    stop_tx: watch::Sender<bool>,
    tasks: Vec<JoinHandle<()>>,
}

impl PollingHandle {
    pub fn is_running(&self) -> bool {
        self.tasks.iter().any(|task| !task.is_finished())
    }

    /// Stops every feed loop, aborts in-flight fetches and waits for the loops to exit.
    pub async fn stop(self) {
        let _ = self.stop_tx.send(true);
        for task in self.tasks {
            if let Err(error) = task.await {
                warn!("polling task ended abnormally: {}", error);
            }
        }
        info!("polling stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{DevicePositions, RssiSampleSet};
    use crate::polling::feed::{FeedFuture, FeedUpdate};
    use crate::prelude::FetchError;
    use std::collections::HashMap;
    use std::sync::Mutex;

    #[derive(Default)]
    struct FakeSource {
        calls: Mutex<HashMap<Feed, usize>>,
        failing: Vec<Feed>,
        delays: HashMap<Feed, Duration>,
    }

    impl FakeSource {
        fn calls(&self, feed: Feed) -> usize {
            self.calls.lock().unwrap().get(&feed).copied().unwrap_or(0)
        }
    }

    impl FeedSource for FakeSource {
        fn fetch(&self, feed: Feed) -> FeedFuture {
            *self.calls.lock().unwrap().entry(feed).or_default() += 1;
            let fail = self.failing.contains(&feed);
            let delay = self.delays.get(&feed).copied();
            Box::pin(async move {
                if let Some(delay) = delay {
                    time::sleep(delay).await;
                }
                if fail {
                    return Err(FetchError::Status {
                        status: 503,
                        body: "unavailable".into(),
                    });
                }
                Ok(match feed {
                    Feed::DevicePositions => FeedUpdate::DevicePositions(DevicePositions::default()),
                    Feed::Rssi => FeedUpdate::Rssi(RssiSampleSet::default()),
                    Feed::ScannedDevices => FeedUpdate::ScannedDevices(Vec::new()),
                    Feed::ValidDevices => FeedUpdate::ValidDevices(7),
                })
            })
        }
    }

    #[tokio::test]
    async fn run_cycle_polls_every_feed_once() {
        let source = Arc::new(FakeSource {
            failing: vec![Feed::ScannedDevices],
            ..Default::default()
        });
        let scheduler = PollingScheduler::new(source.clone(), DEFAULT_POLL_PERIOD);

        let outcomes = scheduler.run_cycle().await;

        assert_eq!(outcomes.len(), 4);
        for feed in Feed::ALL {
            assert_eq!(source.calls(feed), 1);
        }
        let failed: Vec<_> = outcomes
            .iter()
            .filter(|outcome| outcome.result.is_err())
            .map(|outcome| outcome.feed)
            .collect();
        assert_eq!(failed, vec![Feed::ScannedDevices]);
        assert_eq!(scheduler.metrics().snapshot(Feed::ScannedDevices).failed, 1);
        assert_eq!(scheduler.metrics().snapshot(Feed::ValidDevices).succeeded, 1);
    }

    #[tokio::test]
    async fn generations_increase_per_feed() {
        let scheduler = PollingScheduler::new(FakeSource::default(), DEFAULT_POLL_PERIOD)
            .with_feeds([Feed::Rssi]);
        let first = scheduler.run_cycle().await;
        let second = scheduler.run_cycle().await;
        assert_eq!(first[0].generation, 1);
        assert_eq!(second[0].generation, 2);
    }

    #[tokio::test]
    async fn failures_do_not_cancel_the_schedule() {
        let source = Arc::new(FakeSource {
            failing: vec![Feed::ValidDevices],
            ..Default::default()
        });
        let scheduler = PollingScheduler::new(source.clone(), Duration::from_millis(10))
            .with_feeds([Feed::ValidDevices]);
        let (tx, mut rx) = mpsc::unbounded_channel();
        let handle = scheduler.start(tx);

        for _ in 0..3 {
            let outcome = rx.recv().await.unwrap();
            assert!(outcome.result.is_err());
        }
        handle.stop().await;
        assert!(source.calls(Feed::ValidDevices) >= 3);
    }

    #[tokio::test]
    async fn slow_feed_does_not_delay_the_others() {
        let source = Arc::new(FakeSource {
            delays: HashMap::from([(Feed::DevicePositions, Duration::from_secs(30))]),
            ..Default::default()
        });
        let scheduler = PollingScheduler::new(source.clone(), Duration::from_millis(10))
            .with_feeds([Feed::DevicePositions, Feed::Rssi]);
        let (tx, mut rx) = mpsc::unbounded_channel();
        let handle = scheduler.start(tx);

        let mut rssi_outcomes = 0;
        while rssi_outcomes < 3 {
            let outcome = rx.recv().await.unwrap();
            assert_eq!(outcome.feed, Feed::Rssi);
            rssi_outcomes += 1;
        }
        handle.stop().await;
        assert!(source.calls(Feed::DevicePositions) >= 1);
    }

    #[tokio::test]
    async fn stop_tears_down_all_loops() {
        let source = Arc::new(FakeSource::default());
        let scheduler = PollingScheduler::new(source.clone(), Duration::from_millis(5));
        let (tx, mut rx) = mpsc::unbounded_channel();
        let handle = scheduler.start(tx);
        assert!(handle.is_running());

        rx.recv().await.unwrap();
        handle.stop().await;

        let calls_after_stop: usize = Feed::ALL.iter().map(|&feed| source.calls(feed)).sum();
        time::sleep(Duration::from_millis(40)).await;
        let calls_later: usize = Feed::ALL.iter().map(|&feed| source.calls(feed)).sum();
        assert_eq!(calls_after_stop, calls_later);
    }

    #[tokio::test]
    async fn dropping_the_receiver_ends_the_loops() {
        let scheduler = PollingScheduler::new(FakeSource::default(), Duration::from_millis(5))
            .with_feeds([Feed::Rssi]);
        let (tx, rx) = mpsc::unbounded_channel();
        let handle = scheduler.start(tx);
        drop(rx);
        time::sleep(Duration::from_millis(30)).await;
        assert!(!handle.is_running());
    }
}
