use crate::client::http::{
    BackendClient, DEVICE_POSITIONS_PATH, RSSI_PATH, SCANNED_DEVICES_PATH, VALID_DEVICES_PATH,
};
use crate::model::{DevicePositions, RssiSampleSet, ScannedDevice};
use crate::prelude::FetchResult;
use std::future::Future;
use std::pin::Pin;

/// The four independently polled backend feeds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Feed {
    DevicePositions,
    Rssi,
    ScannedDevices,
    ValidDevices,
}

impl Feed {
    pub const ALL: [Feed; 4] = [
        Feed::DevicePositions,
        Feed::Rssi,
        Feed::ScannedDevices,
        Feed::ValidDevices,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Feed::DevicePositions => "device positions",
            Feed::Rssi => "device RSSI",
            Feed::ScannedDevices => "scanned devices",
            Feed::ValidDevices => "valid device count",
        }
    }

    pub fn path(&self) -> &'static str {
        match self {
            Feed::DevicePositions => DEVICE_POSITIONS_PATH,
            Feed::Rssi => RSSI_PATH,
            Feed::ScannedDevices => SCANNED_DEVICES_PATH,
            Feed::ValidDevices => VALID_DEVICES_PATH,
        }
    }

    pub(crate) fn index(&self) -> usize {
        match self {
            Feed::DevicePositions => 0,
            Feed::Rssi => 1,
            Feed::ScannedDevices => 2,
            Feed::ValidDevices => 3,
        }
    }
}

/// Decoded body of one successful poll.
#[derive(Debug, Clone, PartialEq)]
pub enum FeedUpdate {
    DevicePositions(DevicePositions),
    Rssi(RssiSampleSet),
    ScannedDevices(Vec<ScannedDevice>),
    ValidDevices(u32),
}

impl FeedUpdate {
    pub fn feed(&self) -> Feed {
        match self {
            FeedUpdate::DevicePositions(_) => Feed::DevicePositions,
            FeedUpdate::Rssi(_) => Feed::Rssi,
            FeedUpdate::ScannedDevices(_) => Feed::ScannedDevices,
            FeedUpdate::ValidDevices(_) => Feed::ValidDevices,
        }
    }
}

/// Result of one poll, stamped with the feed's generation number at dispatch time.
#[derive(Debug, Clone, PartialEq)]
pub struct FeedOutcome {
    pub feed: Feed,
    pub generation: u64,
    pub result: FetchResult<FeedUpdate>,
}

pub type FeedFuture = Pin<Box<dyn Future<Output = FetchResult<FeedUpdate>> + Send + 'static>>;

/// Anything that can fetch a feed: the HTTP backend, or a fake in tests.
pub trait FeedSource: Send + Sync + 'static {
    fn fetch(&self, feed: Feed) -> FeedFuture;
}

impl FeedSource for BackendClient {
    fn fetch(&self, feed: Feed) -> FeedFuture {
        let client = self.clone();
        Box::pin(async move {
            match feed {
                Feed::DevicePositions => client
                    .device_positions()
                    .await
                    .map(FeedUpdate::DevicePositions),
                Feed::Rssi => client.rssi().await.map(FeedUpdate::Rssi),
                Feed::ScannedDevices => client
                    .scanned_devices()
                    .await
                    .map(FeedUpdate::ScannedDevices),
                Feed::ValidDevices => client.valid_devices().await.map(FeedUpdate::ValidDevices),
            }
        })
    }
}

impl<T: FeedSource> FeedSource for std::sync::Arc<T> {
    fn fetch(&self, feed: Feed) -> FeedFuture {
        self.as_ref().fetch(feed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_feed_has_its_own_endpoint_and_slot() {
        let paths: Vec<_> = Feed::ALL.iter().map(Feed::path).collect();
        assert_eq!(
            paths,
            vec![
                "/get_device_positions_and_receiver_positions",
                "/api/rssi",
                "/api/scanned_devices",
                "/api/valid_devices",
            ]
        );
        let slots: Vec<_> = Feed::ALL.iter().map(Feed::index).collect();
        assert_eq!(slots, vec![0, 1, 2, 3]);
    }

    #[test]
    fn updates_report_their_feed() {
        assert_eq!(FeedUpdate::ValidDevices(3).feed(), Feed::ValidDevices);
        assert_eq!(
            FeedUpdate::ScannedDevices(Vec::new()).feed(),
            Feed::ScannedDevices
        );
    }
}
