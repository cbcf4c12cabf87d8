use super::color_of;
use crate::app::Message;
use iced::{
    mouse,
    widget::canvas::{self, Frame, Geometry, Path},
    Color, Pixels, Point, Rectangle, Renderer, Size, Theme,
};
use trackcore::math::{PixelPoint, PixelSize};
use trackcore::model::{DeviceMetadata, DevicePositions};
use trackcore::render::{DeviceMapRenderer, MapSurface, Rgba};

const BACKGROUND: Color = Color::from_rgb(0.97, 0.97, 0.97);
const LABEL_SIZE: f32 = 12.0;

/// [`MapSurface`] backed by an iced canvas frame.
pub struct FrameSurface {
    frame: Frame,
    size: PixelSize,
}

impl FrameSurface {
    pub fn new(renderer: &Renderer, size: Size) -> Self {
        Self {
            frame: Frame::new(renderer, size),
            size: PixelSize::new(size.width, size.height),
        }
    }

    pub fn into_geometry(self) -> Geometry {
        self.frame.into_geometry()
    }
}

impl MapSurface for FrameSurface {
    fn size(&self) -> PixelSize {
        self.size
    }

    fn clear(&mut self, size: PixelSize) {
        self.size = size;
        self.frame
            .fill_rectangle(Point::ORIGIN, Size::new(size.width, size.height), BACKGROUND);
    }

    fn fill_circle(&mut self, center: PixelPoint, radius: f32, color: Rgba) {
        let marker = Path::circle(Point::new(center.x, center.y), radius);
        self.frame.fill(&marker, color_of(color));
    }

    fn fill_text(&mut self, content: &str, at: PixelPoint, color: Rgba) {
        self.frame.fill_text(canvas::Text {
            content: content.to_string(),
            position: Point::new(at.x, at.y),
            color: color_of(color),
            size: Pixels(LABEL_SIZE),
            ..canvas::Text::default()
        });
    }
}

/// Live device map: placed receivers plus located senders.
pub struct DeviceMap<'a> {
    pub renderer: &'a DeviceMapRenderer,
    pub scene: &'a DevicePositions,
    pub metadata: &'a DeviceMetadata,
}

impl canvas::Program<Message> for DeviceMap<'_> {
    type State = ();

    fn draw(
        &self,
        _state: &Self::State,
        renderer: &Renderer,
        _theme: &Theme,
        bounds: Rectangle,
        _cursor: mouse::Cursor,
    ) -> Vec<Geometry> {
        let mut surface = FrameSurface::new(renderer, bounds.size());
        self.renderer.draw(&mut surface, self.scene, self.metadata);
        vec![surface.into_geometry()]
    }
}
