use crate::app::Message;
use iced::{
    mouse,
    widget::canvas::{self, Action, Event, Frame, Geometry, Path, Stroke},
    Color, Pixels, Point, Rectangle, Renderer, Theme,
};
use std::time::Instant;
use trackcore::editor::{EditorMode, PointerButton, PointerEvent, ReceiverPlacementEditor};
use trackcore::math::{ContainerBox, PixelPoint, PixelSize};

const MARKER: Color = Color::from_rgb(1.0, 0.0, 0.0);
const CAPTURED: Color = Color::from_rgb(1.0, 0.55, 0.0);

pub fn container_of(bounds: Rectangle) -> ContainerBox {
    ContainerBox::new(
        PixelPoint::new(bounds.x, bounds.y),
        PixelSize::new(bounds.width, bounds.height),
    )
}

fn button_of(button: mouse::Button) -> Option<PointerButton> {
    match button {
        mouse::Button::Left => Some(PointerButton::Primary),
        mouse::Button::Right => Some(PointerButton::Secondary),
        mouse::Button::Middle => Some(PointerButton::Middle),
        _ => None,
    }
}

/// Translates canvas mouse events into editor pointer events.
///
/// Presses only count over the canvas; moves are forwarded while a marker is captured
/// and releases are forwarded from anywhere so a drag always ends.
pub fn pointer_event(
    event: &Event,
    bounds: Rectangle,
    cursor: mouse::Cursor,
    dragging: bool,
) -> Option<PointerEvent> {
    let Event::Mouse(mouse_event) = event else {
        return None;
    };
    let at = cursor.position().map(|point| PixelPoint::new(point.x, point.y));
    match mouse_event {
        mouse::Event::ButtonPressed(button) if cursor.is_over(bounds) => Some(PointerEvent::Pressed {
            at: at?,
            button: button_of(*button)?,
            time: Instant::now(),
        }),
        mouse::Event::CursorMoved { position } if dragging => Some(PointerEvent::Moved {
            at: PixelPoint::new(position.x, position.y),
        }),
        mouse::Event::ButtonReleased(button) => Some(PointerEvent::Released {
            // Outside the window there is no cursor; the far corner keeps it outside the map.
            at: at.unwrap_or(PixelPoint::new(f32::MAX, f32::MAX)),
            button: button_of(*button)?,
        }),
        _ => None,
    }
}

/// Receiver placement surface of the setup page.
pub struct ReceiverSetup<'a> {
    pub editor: &'a ReceiverPlacementEditor,
}

impl canvas::Program<Message> for ReceiverSetup<'_> {
    type State = ();

    fn update(
        &self,
        _state: &mut Self::State,
        event: &Event,
        bounds: Rectangle,
        cursor: mouse::Cursor,
    ) -> Option<Action<Message>> {
        let dragging = matches!(self.editor.mode(), EditorMode::Dragging(_));
        let pointer = pointer_event(event, bounds, cursor, dragging)?;
        let action = Action::publish(Message::Pointer(pointer, container_of(bounds)));
        Some(if dragging { action.and_capture() } else { action })
    }

    fn draw(
        &self,
        _state: &Self::State,
        renderer: &Renderer,
        _theme: &Theme,
        bounds: Rectangle,
        _cursor: mouse::Cursor,
    ) -> Vec<Geometry> {
        let mut frame = Frame::new(renderer, bounds.size());
        frame.fill_rectangle(Point::ORIGIN, bounds.size(), Color::from_rgb(0.97, 0.97, 0.97));
        let border = Path::rectangle(Point::ORIGIN, bounds.size());
        frame.stroke(
            &border,
            Stroke::default()
                .with_color(Color::from_rgb(0.6, 0.6, 0.6))
                .with_width(1.0),
        );

        let size = PixelSize::new(bounds.width, bounds.height);
        for marker in self.editor.markers(size) {
            let center = Point::new(marker.at.x, marker.at.y);
            let color = if marker.captured { CAPTURED } else { MARKER };
            frame.fill(&Path::circle(center, 10.0), color);
            frame.fill_text(canvas::Text {
                content: marker.label.to_string(),
                position: Point::new(center.x + 12.0, center.y - 6.0),
                color: Color::BLACK,
                size: Pixels(12.0),
                ..canvas::Text::default()
            });
        }

        if !self.editor.is_loaded() {
            frame.fill_text(canvas::Text {
                content: "Loading receivers...".into(),
                position: Point::new(12.0, 12.0),
                color: Color::from_rgb(0.3, 0.3, 0.3),
                size: Pixels(14.0),
                ..canvas::Text::default()
            });
        }

        vec![frame.into_geometry()]
    }

    fn mouse_interaction(
        &self,
        _state: &Self::State,
        bounds: Rectangle,
        cursor: mouse::Cursor,
    ) -> mouse::Interaction {
        match self.editor.mode() {
            EditorMode::Dragging(_) => mouse::Interaction::Grabbing,
            EditorMode::Idle if cursor.is_over(bounds) => mouse::Interaction::Crosshair,
            EditorMode::Idle => mouse::Interaction::default(),
        }
    }
}
