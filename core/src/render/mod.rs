pub mod map;
pub mod surface;

pub use map::{DeviceMapRenderer, MapStyle, SenderStyle};
pub use surface::{DrawCommand, DrawList, MapSurface, Rgba};
