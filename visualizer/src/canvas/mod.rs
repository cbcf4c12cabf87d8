pub mod histogram;
pub mod map;
pub mod setup;

use iced::Color;
use trackcore::render::Rgba;

pub use histogram::HistogramChart;
pub use map::DeviceMap;
pub use setup::ReceiverSetup;

pub fn color_of(rgba: Rgba) -> Color {
    Color::from_rgba8(rgba.r, rgba.g, rgba.b, rgba.a)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rgba_keeps_css_alpha() {
        let color = color_of(Rgba::new(0, 128, 0, 0.2));
        assert_eq!(color.r, 0.0);
        assert!((color.g - 128.0 / 255.0).abs() < 1e-6);
        assert!((color.a - 0.2).abs() < 1e-6);
    }
}
