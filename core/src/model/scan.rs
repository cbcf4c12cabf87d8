use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::time::SystemTime;

/// Manufacturer identifier(s) advertised by a sender.
///
/// Scanners report either one company id or the list of manufacturer-data keys.
/// Any other shape is kept as sent so one odd entry never rejects the whole listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ManufactureId {
    Single(i64),
    List(Vec<i64>),
    Other(serde_json::Value),
}

impl fmt::Display for ManufactureId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ManufactureId::Single(id) => write!(f, "[{}]", id),
            ManufactureId::List(ids) => {
                let joined = ids
                    .iter()
                    .map(|id| id.to_string())
                    .collect::<Vec<_>>()
                    .join(", ");
                write!(f, "[{}]", joined)
            }
            ManufactureId::Other(serde_json::Value::String(text)) => write!(f, "[{}]", text),
            ManufactureId::Other(value) => write!(f, "[{}]", value),
        }
    }
}

/// Last-seen time of a scanned device, either epoch-based or a formatted string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ScanTimestamp {
    Epoch(f64),
    Text(String),
}

impl ScanTimestamp {
    /// Epoch values above this are taken to be milliseconds rather than seconds.
    const MILLIS_CUTOFF: f64 = 1e11;

    pub fn epoch_millis(&self) -> Option<i64> {
        match self {
            ScanTimestamp::Epoch(value) if *value >= Self::MILLIS_CUTOFF => Some(*value as i64),
            ScanTimestamp::Epoch(value) => Some((*value * 1000.0) as i64),
            ScanTimestamp::Text(_) => None,
        }
    }
}

impl fmt::Display for ScanTimestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScanTimestamp::Epoch(value) => write!(f, "{:.0}", value),
            ScanTimestamp::Text(text) => f.write_str(text),
        }
    }
}

/// One entry of `/api/scanned_devices`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScannedDevice {
    pub device_id: String,
    pub mac_address: String,
    #[serde(default)]
    pub manufacture_id: Option<ManufactureId>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub timestamp: Option<ScanTimestamp>,
    pub rssi: i32,
}

/// Metadata kept per mac address for name resolution and listing.
#[derive(Debug, Clone, PartialEq)]
pub struct DeviceInfo {
    pub name: Option<String>,
    pub manufacture_id: Option<ManufactureId>,
    pub timestamp: Option<ScanTimestamp>,
    pub rssi: i32,
}

impl DeviceInfo {
    /// The advertised name, if the sender broadcast a non-empty one.
    pub fn display_name(&self) -> Option<&str> {
        self.name.as_deref().filter(|name| !name.is_empty())
    }
}

/// Mac address to metadata mapping, rebuilt wholesale from each scanned-devices poll.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DeviceMetadata {
    entries: HashMap<String, DeviceInfo>,
}

impl DeviceMetadata {
    /// Builds a fresh mapping; a repeated mac keeps its last entry.
    pub fn from_scans(scans: &[ScannedDevice]) -> Self {
        let entries = scans
            .iter()
            .map(|scan| {
                (
                    scan.mac_address.clone(),
                    DeviceInfo {
                        name: scan.name.clone(),
                        manufacture_id: scan.manufacture_id.clone(),
                        timestamp: scan.timestamp.clone(),
                        rssi: scan.rssi,
                    },
                )
            })
            .collect();
        Self { entries }
    }

    pub fn get(&self, mac_address: &str) -> Option<&DeviceInfo> {
        self.entries.get(mac_address)
    }

    /// Resolved display name; `None` when the mac is unknown or advertises no name.
    pub fn display_name(&self, mac_address: &str) -> Option<&str> {
        self.get(mac_address).and_then(DeviceInfo::display_name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Receiver id to RSSI readings, as served by `/api/rssi`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RssiSampleSet(pub BTreeMap<String, Vec<i32>>);

impl RssiSampleSet {
    pub fn from_pairs<I, K>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, Vec<i32>)>,
        K: Into<String>,
    {
        Self(
            pairs
                .into_iter()
                .map(|(receiver, samples)| (receiver.into(), samples))
                .collect(),
        )
    }

    /// Every reading of every receiver, receivers pooled.
    pub fn samples(&self) -> impl Iterator<Item = i32> + '_ {
        self.0.values().flat_map(|readings| readings.iter().copied())
    }

    pub fn receivers(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn sample_count(&self) -> usize {
        self.0.values().map(Vec::len).sum()
    }
}

/// Body of `/api/valid_devices`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidDevicesResponse {
    pub valid_device_count: u32,
}

/// Valid-device counter together with the moment the client received it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValidDeviceCount {
    pub count: u32,
    pub updated_at: SystemTime,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scan(mac: &str, name: Option<&str>, rssi: i32) -> ScannedDevice {
        ScannedDevice {
            device_id: "R1".into(),
            mac_address: mac.into(),
            manufacture_id: Some(ManufactureId::Single(76)),
            name: name.map(Into::into),
            timestamp: Some(ScanTimestamp::Epoch(1_700_000_000.0)),
            rssi,
        }
    }

    #[test]
    fn scanned_devices_decode_both_manufacture_id_shapes() {
        let body = r#"[
            {"device_id":"R1","mac_address":"aa","manufacture_id":76,"name":"Tag","timestamp":1700000000,"rssi":-60},
            {"device_id":"R2","mac_address":"bb","manufacture_id":[76,117],"timestamp":"2024-05-01T10:00:00Z","rssi":-81}
        ]"#;
        let scans: Vec<ScannedDevice> = serde_json::from_str(body).unwrap();
        assert_eq!(scans[0].manufacture_id, Some(ManufactureId::Single(76)));
        assert_eq!(
            scans[1].manufacture_id.as_ref().unwrap().to_string(),
            "[76, 117]"
        );
        assert!(scans[1].name.is_none());
        assert_eq!(
            scans[1].timestamp,
            Some(ScanTimestamp::Text("2024-05-01T10:00:00Z".into()))
        );
    }

    #[test]
    fn odd_manufacture_id_does_not_reject_the_listing() {
        let body = r#"[
            {"device_id":"R1","mac_address":"aa","manufacture_id":76,"name":"Tag","timestamp":1700000000,"rssi":-60},
            {"device_id":"R1","mac_address":"bb","manufacture_id":"0x004C","timestamp":1700000000,"rssi":-70},
            {"device_id":"R2","mac_address":"cc","manufacture_id":{"76":"0215"},"rssi":-75}
        ]"#;
        let scans: Vec<ScannedDevice> = serde_json::from_str(body).unwrap();
        assert_eq!(scans.len(), 3);
        assert_eq!(scans[0].manufacture_id, Some(ManufactureId::Single(76)));
        assert_eq!(scans[1].manufacture_id.as_ref().unwrap().to_string(), "[0x004C]");
        assert_eq!(
            scans[2].manufacture_id.as_ref().unwrap().to_string(),
            r#"[{"76":"0215"}]"#
        );

        let metadata = DeviceMetadata::from_scans(&scans);
        assert_eq!(metadata.display_name("aa"), Some("Tag"));
        assert!(metadata.get("bb").is_some());
    }

    #[test]
    fn metadata_lookup_of_unknown_mac_is_absent() {
        let metadata = DeviceMetadata::from_scans(&[scan("aa", Some("Tag"), -60)]);
        assert_eq!(metadata.display_name("aa"), Some("Tag"));
        assert!(metadata.get("zz").is_none());
        assert_eq!(metadata.display_name("zz"), None);
    }

    #[test]
    fn metadata_treats_empty_name_as_unnamed() {
        let metadata = DeviceMetadata::from_scans(&[scan("aa", Some(""), -60)]);
        assert!(metadata.get("aa").is_some());
        assert_eq!(metadata.display_name("aa"), None);
    }

    #[test]
    fn metadata_keeps_last_entry_for_repeated_mac() {
        let metadata =
            DeviceMetadata::from_scans(&[scan("aa", Some("Old"), -70), scan("aa", Some("New"), -50)]);
        assert_eq!(metadata.len(), 1);
        assert_eq!(metadata.get("aa").unwrap().rssi, -50);
        assert_eq!(metadata.display_name("aa"), Some("New"));
    }

    #[test]
    fn rssi_sample_set_pools_receivers() {
        let samples: RssiSampleSet =
            serde_json::from_str(r#"{"R1":[-95,-72],"R2":[-48]}"#).unwrap();
        assert_eq!(samples.sample_count(), 3);
        assert_eq!(samples.samples().collect::<Vec<_>>(), vec![-95, -72, -48]);
        assert_eq!(samples.receivers().collect::<Vec<_>>(), vec!["R1", "R2"]);
    }

    #[test]
    fn epoch_timestamps_normalize_to_millis() {
        assert_eq!(
            ScanTimestamp::Epoch(1_700_000_000.0).epoch_millis(),
            Some(1_700_000_000_000)
        );
        assert_eq!(
            ScanTimestamp::Epoch(1_700_000_000_000.0).epoch_millis(),
            Some(1_700_000_000_000)
        );
        assert_eq!(ScanTimestamp::Text("now".into()).epoch_millis(), None);
    }
}
