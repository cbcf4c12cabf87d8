use chrono::{DateTime, Duration, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use trackcore::model::{ManufactureId, RssiSampleSet, ScanTimestamp, ScannedDevice};

/// Senders not heard from for this long are forgotten.
pub const SCAN_TIMEOUT_MINUTES: i64 = 30;
/// Window in which a sender counts towards the valid-device total and the RSSI feed.
pub const VALID_WINDOW_MINUTES: i64 = 5;
/// Window of readings used for position estimation.
pub const LOCATE_WINDOW_SECONDS: i64 = 10;
pub const RSSI_THRESHOLD: i32 = -200;
/// Receivers post UTC times with a literal `Z`; the fraction is optional.
pub const SCAN_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.fZ";

/// One reading as posted by a receiver.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScanReport {
    #[serde(default)]
    pub device_id: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub rssi: Option<i32>,
    #[serde(default)]
    pub manufacture_id: Option<ManufactureId>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub time: Option<String>,
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum IngestError {
    #[error("Invalid time format")]
    InvalidTime,
    #[error("Missing data")]
    MissingData,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Reading {
    rssi: i32,
    timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
struct SenderRecord {
    name: Option<String>,
    manufacture_id: Option<ManufactureId>,
    last_seen: DateTime<Utc>,
    readings: BTreeMap<String, Reading>,
}

impl SenderRecord {
    fn latest(&self) -> Option<(&str, &Reading)> {
        self.readings
            .iter()
            .max_by_key(|(_, reading)| reading.timestamp)
            .map(|(receiver, reading)| (receiver.as_str(), reading))
    }
}

/// Latest reading per (sender, receiver) pair, keyed by sender mac address.
#[derive(Debug, Clone, Default)]
pub struct ScanStore {
    senders: BTreeMap<String, SenderRecord>,
}

impl ScanStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.senders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.senders.is_empty()
    }

    pub fn ingest(&mut self, report: ScanReport, now: DateTime<Utc>) -> Result<(), IngestError> {
        let mut timestamp = report
            .time
            .as_deref()
            .and_then(|time| NaiveDateTime::parse_from_str(time, SCAN_TIME_FORMAT).ok())
            .map(|time| time.and_utc())
            .ok_or(IngestError::InvalidTime)?;
        // Receivers without a synced clock report epoch-ish dates.
        if timestamp < now - Duration::days(365) {
            timestamp = now;
        }

        let (Some(device_id), Some(address), Some(rssi)) =
            (report.device_id, report.address, report.rssi)
        else {
            return Err(IngestError::MissingData);
        };
        if device_id.is_empty() || address.is_empty() {
            return Err(IngestError::MissingData);
        }

        let reading = Reading { rssi, timestamp };
        match self.senders.get_mut(&address) {
            Some(record) => {
                record.readings.insert(device_id, reading);
                record.last_seen = record.last_seen.max(timestamp);
                if report.name.is_some() {
                    record.name = report.name;
                }
                if report.manufacture_id.is_some() {
                    record.manufacture_id = report.manufacture_id;
                }
            }
            None => {
                self.senders.insert(
                    address,
                    SenderRecord {
                        name: report.name,
                        manufacture_id: report.manufacture_id,
                        last_seen: timestamp,
                        readings: BTreeMap::from([(device_id, reading)]),
                    },
                );
            }
        }
        self.cleanup(now);
        Ok(())
    }

    pub fn cleanup(&mut self, now: DateTime<Utc>) {
        let cutoff = now - Duration::minutes(SCAN_TIMEOUT_MINUTES);
        self.senders.retain(|_, record| record.last_seen >= cutoff);
    }

    pub fn valid_device_count(&self, now: DateTime<Utc>) -> usize {
        let cutoff = now - Duration::minutes(VALID_WINDOW_MINUTES);
        self.senders
            .values()
            .filter(|record| record.last_seen > cutoff)
            .filter(|record| {
                record
                    .latest()
                    .is_some_and(|(_, reading)| reading.rssi >= RSSI_THRESHOLD)
            })
            .count()
    }

    /// Readings from the valid window grouped by the receiver that took them.
    pub fn rssi_by_receiver(&self, now: DateTime<Utc>) -> RssiSampleSet {
        let cutoff = now - Duration::minutes(VALID_WINDOW_MINUTES);
        let mut grouped: BTreeMap<String, Vec<i32>> = BTreeMap::new();
        for record in self.senders.values() {
            for (receiver, reading) in &record.readings {
                if reading.timestamp > cutoff {
                    grouped.entry(receiver.clone()).or_default().push(reading.rssi);
                }
            }
        }
        RssiSampleSet(grouped)
    }

    /// Recent readings per sender, for position estimation.
    pub fn recent_readings(&self, now: DateTime<Utc>) -> BTreeMap<String, Vec<(String, i32)>> {
        let cutoff = now - Duration::seconds(LOCATE_WINDOW_SECONDS);
        self.senders
            .iter()
            .map(|(mac, record)| {
                let readings = record
                    .readings
                    .iter()
                    .filter(|(_, reading)| reading.timestamp > cutoff)
                    .map(|(receiver, reading)| (receiver.clone(), reading.rssi))
                    .collect::<Vec<_>>();
                (mac.clone(), readings)
            })
            .filter(|(_, readings)| !readings.is_empty())
            .collect()
    }

    /// One entry per sender, most recently seen first.
    pub fn scanned_devices(&self) -> Vec<ScannedDevice> {
        let mut records: Vec<_> = self.senders.iter().collect();
        records.sort_by(|a, b| b.1.last_seen.cmp(&a.1.last_seen));
        records
            .into_iter()
            .filter_map(|(mac, record)| {
                let (receiver, reading) = record.latest()?;
                Some(ScannedDevice {
                    device_id: receiver.to_string(),
                    mac_address: mac.clone(),
                    manufacture_id: record.manufacture_id.clone(),
                    name: record.name.clone(),
                    timestamp: Some(ScanTimestamp::Epoch(
                        record.last_seen.timestamp_millis() as f64,
                    )),
                    rssi: reading.rssi,
                })
            })
            .collect()
    }
}
