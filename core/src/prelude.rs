use serde::{Deserialize, Serialize};

pub use crate::math::coords::{ContainerBox, NormalizedCoordinateModel, PixelPoint, PixelSize};
pub use crate::model::{
    DeviceMetadata, DevicePositions, Position, Receiver, RssiSampleSet, ScannedDevice, Sender,
};

/// Common error type for every backend round trip.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    #[error("transport failure: {0}")]
    Transport(String),
    #[error("unexpected status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("undecodable body: {0}")]
    Decode(String),
}

pub type FetchResult<T> = Result<T, FetchError>;

/// Acknowledgement returned by the save endpoint. Its shape is not checked.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(transparent)]
pub struct Acknowledgement(pub serde_json::Value);
