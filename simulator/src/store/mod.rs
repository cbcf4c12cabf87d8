pub mod locate;
pub mod receivers;
pub mod scans;

use chrono::{DateTime, Utc};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use trackcore::model::{DevicePositions, Sender};

pub use locate::Locator;
pub use receivers::ReceiverRegistry;
pub use scans::{IngestError, ScanReport, ScanStore};

pub type SharedState = Arc<RwLock<BackendState>>;

pub fn shared(state: BackendState) -> SharedState {
    Arc::new(RwLock::new(state))
}

/// A panicked writer leaves the store usable, so poisoning is ignored.
pub fn read_state(state: &SharedState) -> RwLockReadGuard<'_, BackendState> {
    state.read().unwrap_or_else(PoisonError::into_inner)
}

pub fn write_state(state: &SharedState) -> RwLockWriteGuard<'_, BackendState> {
    state.write().unwrap_or_else(PoisonError::into_inner)
}

/// Everything the simulated backend knows, shared between the HTTP routes and the generator.
#[derive(Debug, Clone, Default)]
pub struct BackendState {
    pub scans: ScanStore,
    pub receivers: ReceiverRegistry,
    pub locator: Locator,
}

impl BackendState {
    pub fn new(receivers: ReceiverRegistry, locator: Locator) -> Self {
        Self {
            scans: ScanStore::new(),
            receivers,
            locator,
        }
    }

    /// Placed receivers plus every sender heard by enough of them to be located.
    pub fn device_positions(&self, now: DateTime<Utc>) -> DevicePositions {
        let senders = self
            .scans
            .recent_readings(now)
            .into_iter()
            .filter_map(|(mac, readings)| {
                let placed: Vec<_> = readings
                    .iter()
                    .filter_map(|(receiver, rssi)| {
                        self.receivers.position(receiver).map(|position| (position, *rssi))
                    })
                    .collect();
                self.locator
                    .estimate(&placed)
                    .map(|position| Sender::new(mac, position))
            })
            .collect();

        DevicePositions {
            receivers: self.receivers.receivers(),
            senders: Some(senders),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use trackcore::model::{Position, Receiver};

    fn report(receiver: &str, mac: &str, rssi: i32, now: DateTime<Utc>) -> ScanReport {
        ScanReport {
            device_id: Some(receiver.into()),
            address: Some(mac.into()),
            rssi: Some(rssi),
            time: Some(now.to_rfc3339()),
            ..Default::default()
        }
    }

    #[test]
    fn only_senders_heard_by_three_placed_receivers_are_located() {
        let now = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        let mut registry = ReceiverRegistry::in_memory();
        registry
            .replace(vec![
                Receiver::new("R1", Position::new(0.0, 0.0)),
                Receiver::new("R2", Position::new(1.0, 0.0)),
                Receiver::new("R3", Position::new(0.5, 1.0)),
            ])
            .unwrap();
        let mut state = BackendState::new(registry, Locator::default());

        for receiver in ["R1", "R2", "R3"] {
            state.scans.ingest(report(receiver, "aa", -70, now), now).unwrap();
        }
        state.scans.ingest(report("R1", "bb", -70, now), now).unwrap();
        state.scans.ingest(report("R2", "bb", -70, now), now).unwrap();
        state.scans.ingest(report("R9", "bb", -70, now), now).unwrap();

        let positions = state.device_positions(now);
        assert_eq!(positions.receivers.len(), 3);
        let senders = positions.senders.unwrap();
        assert_eq!(senders.len(), 1);
        assert_eq!(senders[0].mac_address, "aa");
    }
}
