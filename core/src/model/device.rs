use serde::{Deserialize, Serialize};

/// Position expressed as a fraction of the map's width and height.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f32,
    pub y: f32,
}

impl Position {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// A fixed BLE scanner placed on the map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Receiver {
    pub device_id: String,
    pub position: Position,
}

impl Receiver {
    pub fn new(device_id: impl Into<String>, position: Position) -> Self {
        Self {
            device_id: device_id.into(),
            position,
        }
    }
}

/// A broadcasting device whose position the backend estimated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sender {
    pub mac_address: String,
    pub position: Position,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl Sender {
    pub fn new(mac_address: impl Into<String>, position: Position) -> Self {
        Self {
            mac_address: mac_address.into(),
            position,
            name: None,
        }
    }
}

/// Body of `/get_device_positions_and_receiver_positions`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DevicePositions {
    #[serde(default)]
    pub receivers: Vec<Receiver>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub senders: Option<Vec<Sender>>,
}

/// Body of `/get_receiver_positions`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReceiverList {
    #[serde(default)]
    pub receivers: Vec<Receiver>,
}

/// Body posted to `/save_receiver_positions`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SavePositionsRequest {
    pub devices: Vec<Receiver>,
}
