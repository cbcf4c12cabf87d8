use super::color_of;
use crate::app::Message;
use iced::{
    mouse,
    widget::canvas::{self, Frame, Geometry, Path, Stroke},
    Color, Pixels, Point, Rectangle, Renderer, Size, Theme,
};
use trackcore::processing::RssiHistogram;

const MARGIN_TOP: f32 = 28.0;
const MARGIN_BOTTOM: f32 = 24.0;
const BAR_GAP: f32 = 4.0;
const TEXT_SIZE: f32 = 11.0;
const AXIS: Color = Color::from_rgb(0.55, 0.55, 0.6);
const INK: Color = Color::from_rgb(0.85, 0.85, 0.9);

/// Bar rectangles for `counts` inside a chart of `size`. The y axis starts at zero.
pub fn bar_layout(counts: &[u32], size: Size) -> Vec<Rectangle> {
    if counts.is_empty() {
        return Vec::new();
    }
    let plot_height = (size.height - MARGIN_TOP - MARGIN_BOTTOM).max(0.0);
    let slot = size.width / counts.len() as f32;
    let max = counts.iter().copied().max().unwrap_or(0).max(1) as f32;
    let baseline = MARGIN_TOP + plot_height;

    counts
        .iter()
        .enumerate()
        .map(|(index, &count)| {
            let height = plot_height * count as f32 / max;
            Rectangle {
                x: index as f32 * slot + BAR_GAP / 2.0,
                y: baseline - height,
                width: (slot - BAR_GAP).max(0.0),
                height,
            }
        })
        .collect()
}

pub struct HistogramChart<'a> {
    pub histogram: &'a RssiHistogram,
}

impl canvas::Program<Message> for HistogramChart<'_> {
    type State = ();

    fn draw(
        &self,
        _state: &Self::State,
        renderer: &Renderer,
        _theme: &Theme,
        bounds: Rectangle,
        _cursor: mouse::Cursor,
    ) -> Vec<Geometry> {
        let mut frame = Frame::new(renderer, bounds.size());
        frame.fill_rectangle(Point::ORIGIN, bounds.size(), Color::from_rgb(0.05, 0.05, 0.07));

        let series = self.histogram.series();
        frame.fill_text(canvas::Text {
            content: series.label.to_string(),
            position: Point::new(8.0, 6.0),
            color: INK,
            size: Pixels(14.0),
            ..canvas::Text::default()
        });

        let baseline = bounds.height - MARGIN_BOTTOM;
        let axis = Path::line(Point::new(0.0, baseline), Point::new(bounds.width, baseline));
        frame.stroke(&axis, Stroke::default().with_color(AXIS).with_width(1.0));

        let labels = RssiHistogram::labels();
        let bars = bar_layout(&series.data, bounds.size());
        for ((bar, label), count) in bars.iter().zip(&labels).zip(series.data) {
            if bar.height > 0.0 {
                let path = Path::rectangle(bar.position(), bar.size());
                frame.fill(&path, color_of(series.fill));
                frame.stroke(
                    &path,
                    Stroke::default()
                        .with_color(color_of(series.border))
                        .with_width(series.border_width),
                );
                frame.fill_text(canvas::Text {
                    content: count.to_string(),
                    position: Point::new(bar.x, bar.y - TEXT_SIZE - 2.0),
                    color: INK,
                    size: Pixels(TEXT_SIZE),
                    ..canvas::Text::default()
                });
            }
            frame.fill_text(canvas::Text {
                content: label.clone(),
                position: Point::new(bar.x, baseline + 4.0),
                color: INK,
                size: Pixels(TEXT_SIZE),
                ..canvas::Text::default()
            });
        }

        vec![frame.into_geometry()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_histogram_has_flat_bars() {
        let bars = bar_layout(&[0; 11], Size::new(440.0, 300.0));
        assert_eq!(bars.len(), 11);
        assert!(bars.iter().all(|bar| bar.height == 0.0));
        assert_eq!(bars[1].x - bars[0].x, 40.0);
    }

    #[test]
    fn tallest_bar_fills_the_plot() {
        let size = Size::new(220.0, 200.0);
        let bars = bar_layout(&[1, 0, 1, 0, 0, 1, 0, 0, 0, 2, 0], size);
        let plot = size.height - MARGIN_TOP - MARGIN_BOTTOM;
        assert!((bars[9].height - plot).abs() < 1e-4);
        assert!((bars[0].height - plot / 2.0).abs() < 1e-4);
        assert_eq!(bars[0].y + bars[0].height, bars[9].y + bars[9].height);
    }
}
