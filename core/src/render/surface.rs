use crate::math::coords::{PixelPoint, PixelSize};

/// Straight RGBA color, channels as in CSS `rgba()`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: f32,
}

impl Rgba {
    pub const fn new(r: u8, g: u8, b: u8, a: f32) -> Self {
        Self { r, g, b, a }
    }

    pub const fn opaque(r: u8, g: u8, b: u8) -> Self {
        Self::new(r, g, b, 1.0)
    }
}

/// Drawing target for the device map. Implementations own the underlying canvas handle.
pub trait MapSurface {
    /// Current pixel size of the container backing the surface.
    fn size(&self) -> PixelSize;
    fn clear(&mut self, size: PixelSize);
    fn fill_circle(&mut self, center: PixelPoint, radius: f32, color: Rgba);
    fn fill_text(&mut self, content: &str, at: PixelPoint, color: Rgba);
}

#[derive(Debug, Clone, PartialEq)]
pub enum DrawCommand {
    Clear {
        size: PixelSize,
    },
    Circle {
        center: PixelPoint,
        radius: f32,
        color: Rgba,
    },
    Text {
        content: String,
        at: PixelPoint,
        color: Rgba,
    },
}

/// Surface that records draw commands; clearing discards everything drawn before.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DrawList {
    size: PixelSize,
    commands: Vec<DrawCommand>,
}

impl DrawList {
    pub fn new(size: PixelSize) -> Self {
        Self {
            size,
            commands: Vec::new(),
        }
    }

    pub fn resize(&mut self, size: PixelSize) {
        self.size = size;
    }

    pub fn commands(&self) -> &[DrawCommand] {
        &self.commands
    }

    pub fn circles(&self) -> impl Iterator<Item = (PixelPoint, Rgba)> + '_ {
        self.commands.iter().filter_map(|command| match command {
            DrawCommand::Circle { center, color, .. } => Some((*center, *color)),
            _ => None,
        })
    }

    pub fn texts(&self) -> impl Iterator<Item = &str> + '_ {
        self.commands.iter().filter_map(|command| match command {
            DrawCommand::Text { content, .. } => Some(content.as_str()),
            _ => None,
        })
    }
}

impl MapSurface for DrawList {
    fn size(&self) -> PixelSize {
        self.size
    }

    fn clear(&mut self, size: PixelSize) {
        self.commands.clear();
        self.commands.push(DrawCommand::Clear { size });
    }

    fn fill_circle(&mut self, center: PixelPoint, radius: f32, color: Rgba) {
        self.commands.push(DrawCommand::Circle {
            center,
            radius,
            color,
        });
    }

    fn fill_text(&mut self, content: &str, at: PixelPoint, color: Rgba) {
        self.commands.push(DrawCommand::Text {
            content: content.to_string(),
            at,
            color,
        });
    }
}
