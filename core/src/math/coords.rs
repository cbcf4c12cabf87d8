use crate::model::Position;

/// Pixel dimensions of a drawing container.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PixelSize {
    pub width: f32,
    pub height: f32,
}

impl PixelSize {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }
}

/// A point in pixel space.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PixelPoint {
    pub x: f32,
    pub y: f32,
}

impl PixelPoint {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn distance(&self, other: PixelPoint) -> f32 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }

    pub fn offset(&self, dx: f32, dy: f32) -> PixelPoint {
        PixelPoint::new(self.x + dx, self.y + dy)
    }
}

/// Bounding box of a container in the same space as pointer coordinates.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ContainerBox {
    pub origin: PixelPoint,
    pub size: PixelSize,
}

impl ContainerBox {
    pub fn new(origin: PixelPoint, size: PixelSize) -> Self {
        Self { origin, size }
    }

    /// Translates an absolute pointer location into the container's local pixels.
    pub fn to_local(&self, pointer: PixelPoint) -> PixelPoint {
        PixelPoint::new(pointer.x - self.origin.x, pointer.y - self.origin.y)
    }

    pub fn contains(&self, pointer: PixelPoint) -> bool {
        let local = self.to_local(pointer);
        (0.0..=self.size.width).contains(&local.x) && (0.0..=self.size.height).contains(&local.y)
    }
}

/// Maps between pixels and unit-square fractions of a container.
pub struct NormalizedCoordinateModel;

impl NormalizedCoordinateModel {
    pub fn to_pixel(normalized: Position, container: PixelSize) -> PixelPoint {
        PixelPoint::new(
            normalized.x * container.width,
            normalized.y * container.height,
        )
    }

    /// Pointer location to fractions of the container, pinned to `[0, 1]` on both axes.
    pub fn to_normalized(pointer: PixelPoint, container: ContainerBox) -> Position {
        let local = container.to_local(pointer);
        Position::new(
            Self::fraction(local.x, container.size.width),
            Self::fraction(local.y, container.size.height),
        )
    }

    fn fraction(offset: f32, extent: f32) -> f32 {
        if extent <= 0.0 || !extent.is_finite() {
            return 0.0;
        }
        let value = offset / extent;
        if value.is_nan() {
            0.0
        } else {
            value.clamp(0.0, 1.0)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn container() -> ContainerBox {
        ContainerBox::new(PixelPoint::new(40.0, 25.0), PixelSize::new(800.0, 600.0))
    }

    #[test]
    fn to_pixel_scales_by_container_size() {
        let pixel =
            NormalizedCoordinateModel::to_pixel(Position::new(0.25, 0.5), PixelSize::new(800.0, 600.0));
        assert_eq!(pixel, PixelPoint::new(200.0, 300.0));
    }

    #[test]
    fn interior_points_round_trip() {
        let container = container();
        for &(x, y) in &[(41.0, 26.0), (440.0, 325.0), (839.0, 624.0), (123.4, 567.8)] {
            let pointer = PixelPoint::new(x, y);
            let normalized = NormalizedCoordinateModel::to_normalized(pointer, container);
            let back = NormalizedCoordinateModel::to_pixel(normalized, container.size);
            let local = container.to_local(pointer);
            assert!((back.x - local.x).abs() < 1e-3, "x drifted for {:?}", pointer);
            assert!((back.y - local.y).abs() < 1e-3, "y drifted for {:?}", pointer);
        }
    }

    #[test]
    fn outside_points_are_pinned_to_the_nearest_edge() {
        let container = container();
        for &(x, y) in &[(-500.0, 10.0), (2000.0, 300.0), (100.0, -1.0), (5000.0, 5000.0)] {
            let normalized =
                NormalizedCoordinateModel::to_normalized(PixelPoint::new(x, y), container);
            assert!((0.0..=1.0).contains(&normalized.x));
            assert!((0.0..=1.0).contains(&normalized.y));
        }
        let left = NormalizedCoordinateModel::to_normalized(PixelPoint::new(-500.0, 325.0), container);
        assert_eq!(left, Position::new(0.0, 0.5));
    }

    #[test]
    fn contains_uses_absolute_pointer_coordinates() {
        let container = container();
        assert!(container.contains(PixelPoint::new(40.0, 25.0)));
        assert!(container.contains(PixelPoint::new(840.0, 625.0)));
        assert!(!container.contains(PixelPoint::new(39.0, 300.0)));
        assert!(!container.contains(PixelPoint::new(300.0, 626.0)));
    }

    #[test]
    fn zero_sized_container_maps_to_origin() {
        let empty = ContainerBox::new(PixelPoint::default(), PixelSize::default());
        let normalized = NormalizedCoordinateModel::to_normalized(PixelPoint::new(10.0, 10.0), empty);
        assert_eq!(normalized, Position::new(0.0, 0.0));
    }
}
