//! Client-side core for the BLE tracking dashboard.
//!
//! The modules turn independently polled backend feeds (device positions, RSSI samples,
//! scanned-device metadata, valid-device counts) into one renderable model, and host the
//! receiver-placement editor that operators use to lay out the fixed scanners.

pub mod client;
pub mod editor;
pub mod math;
pub mod model;
pub mod polling;
pub mod prelude;
pub mod processing;
pub mod render;
pub mod telemetry;

pub use prelude::{FetchError, FetchResult};
