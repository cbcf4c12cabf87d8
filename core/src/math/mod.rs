pub mod coords;

pub use coords::{ContainerBox, NormalizedCoordinateModel, PixelPoint, PixelSize};
