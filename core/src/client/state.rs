use crate::model::{DeviceMetadata, DevicePositions, RssiSampleSet, ScannedDevice, ValidDeviceCount};
use crate::polling::feed::{Feed, FeedOutcome, FeedUpdate};
use crate::processing::histogram::{RssiHistogram, RssiHistogramAggregator};
use crate::telemetry::FeedLog;
use std::time::SystemTime;

/// Which view needs redrawing after an outcome was applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Redraw {
    Map,
    Histogram,
    DeviceList,
    Counter,
}

/// Last-known-good state of every feed, each slot owned and refreshed independently.
///
/// A failed poll leaves its slot untouched, and an outcome older than the newest one
/// already applied for the same feed is discarded.
#[derive(Debug, Clone, Default)]
pub struct ClientState {
    positions: DevicePositions,
    rssi: RssiSampleSet,
    histogram: RssiHistogram,
    scanned: Vec<ScannedDevice>,
    metadata: DeviceMetadata,
    valid: Option<ValidDeviceCount>,
    applied: [Option<u64>; 4],
    log: FeedLog,
}

impl ClientState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn apply(&mut self, outcome: FeedOutcome) -> Option<Redraw> {
        let FeedOutcome {
            feed,
            generation,
            result,
        } = outcome;

        if let Some(newest) = self.applied[feed.index()] {
            if generation <= newest {
                self.log.record_stale(feed, generation, newest);
                return None;
            }
        }

        let update = result.ok()?;
        if update.feed() != feed {
            return None;
        }
        self.applied[feed.index()] = Some(generation);
        Some(self.replace(update))
    }

    fn replace(&mut self, update: FeedUpdate) -> Redraw {
        match update {
            FeedUpdate::DevicePositions(positions) => {
                self.positions = positions;
                Redraw::Map
            }
            FeedUpdate::Rssi(samples) => {
                self.histogram = RssiHistogramAggregator::aggregate(&samples);
                self.rssi = samples;
                Redraw::Histogram
            }
            FeedUpdate::ScannedDevices(scanned) => {
                self.metadata = DeviceMetadata::from_scans(&scanned);
                self.scanned = scanned;
                Redraw::DeviceList
            }
            FeedUpdate::ValidDevices(count) => {
                self.valid = Some(ValidDeviceCount {
                    count,
                    updated_at: SystemTime::now(),
                });
                Redraw::Counter
            }
        }
    }

    pub fn positions(&self) -> &DevicePositions {
        &self.positions
    }

    pub fn rssi(&self) -> &RssiSampleSet {
        &self.rssi
    }

    pub fn histogram(&self) -> &RssiHistogram {
        &self.histogram
    }

    pub fn scanned_devices(&self) -> &[ScannedDevice] {
        &self.scanned
    }

    pub fn metadata(&self) -> &DeviceMetadata {
        &self.metadata
    }

    pub fn valid_devices(&self) -> Option<ValidDeviceCount> {
        self.valid
    }

    /// Generation of the newest applied outcome for `feed`.
    pub fn applied_generation(&self, feed: Feed) -> Option<u64> {
        self.applied[feed.index()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Position, Receiver, Sender};
    use crate::prelude::FetchError;

    fn outcome(generation: u64, update: FeedUpdate) -> FeedOutcome {
        FeedOutcome {
            feed: update.feed(),
            generation,
            result: Ok(update),
        }
    }

    fn positions(id: &str) -> DevicePositions {
        DevicePositions {
            receivers: vec![Receiver::new(id, Position::new(0.1, 0.2))],
            senders: Some(vec![Sender::new("aa", Position::new(0.5, 0.5))]),
        }
    }

    #[test]
    fn rssi_outcome_recounts_histogram() {
        let mut state = ClientState::new();
        let samples = RssiSampleSet::from_pairs([("R1", vec![-95, -72, -48, -5])]);
        let redraw = state.apply(outcome(1, FeedUpdate::Rssi(samples)));
        assert_eq!(redraw, Some(Redraw::Histogram));
        assert_eq!(state.histogram().counts(), &[1, 0, 1, 0, 0, 1, 0, 0, 0, 1, 0]);

        let replaced = RssiSampleSet::from_pairs([("R2", vec![-33])]);
        state.apply(outcome(2, FeedUpdate::Rssi(replaced)));
        assert_eq!(state.histogram().total(), 1);
        assert_eq!(state.histogram().counts()[6], 1);
        assert_eq!(state.rssi().receivers().collect::<Vec<_>>(), vec!["R2"]);
    }

    #[test]
    fn failed_poll_keeps_last_known_good_state() {
        let mut state = ClientState::new();
        state.apply(outcome(1, FeedUpdate::DevicePositions(positions("R1"))));

        let failed = FeedOutcome {
            feed: Feed::DevicePositions,
            generation: 2,
            result: Err(FetchError::Transport("connection refused".into())),
        };
        assert_eq!(state.apply(failed), None);
        assert_eq!(state.positions(), &positions("R1"));
        assert_eq!(state.applied_generation(Feed::DevicePositions), Some(1));
    }

    #[test]
    fn late_response_never_overwrites_newer_state() {
        let mut state = ClientState::new();
        state.apply(outcome(5, FeedUpdate::DevicePositions(positions("new"))));
        let stale = state.apply(outcome(4, FeedUpdate::DevicePositions(positions("old"))));
        assert_eq!(stale, None);
        assert_eq!(state.positions().receivers[0].device_id, "new");
    }

    #[test]
    fn feeds_are_refreshed_independently() {
        let mut state = ClientState::new();
        state.apply(outcome(3, FeedUpdate::ValidDevices(12)));
        state.apply(outcome(1, FeedUpdate::DevicePositions(positions("R1"))));

        assert_eq!(state.valid_devices().unwrap().count, 12);
        assert_eq!(state.applied_generation(Feed::ValidDevices), Some(3));
        assert_eq!(state.applied_generation(Feed::DevicePositions), Some(1));
        assert!(state.metadata().is_empty());
    }

    #[test]
    fn scanned_devices_replace_metadata_wholesale() {
        let mut state = ClientState::new();
        let scan = |mac: &str, name: &str| ScannedDevice {
            device_id: "R1".into(),
            mac_address: mac.into(),
            manufacture_id: None,
            name: Some(name.into()),
            timestamp: None,
            rssi: -70,
        };
        state.apply(outcome(1, FeedUpdate::ScannedDevices(vec![scan("aa", "Tag")])));
        let redraw = state.apply(outcome(2, FeedUpdate::ScannedDevices(vec![scan("bb", "Key")])));

        assert_eq!(redraw, Some(Redraw::DeviceList));
        assert!(state.metadata().get("aa").is_none());
        assert_eq!(state.metadata().display_name("bb"), Some("Key"));
        assert_eq!(state.scanned_devices().len(), 1);
    }
}
