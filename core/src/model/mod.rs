pub mod device;
pub mod scan;

pub use device::{DevicePositions, Position, Receiver, ReceiverList, SavePositionsRequest, Sender};
pub use scan::{
    DeviceInfo, DeviceMetadata, ManufactureId, RssiSampleSet, ScanTimestamp, ScannedDevice,
    ValidDeviceCount, ValidDevicesResponse,
};
