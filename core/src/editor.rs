//! Receiver placement editor.
//!
//! A two-mode state machine (`Idle` / `Dragging`) driven by pointer events. Markers are
//! keyed by an internal [`MarkerKey`] so the editable `device_id` can change without
//! losing track of which marker is captured. Identifier prompts are modal: while one is
//! pending, pointer input is ignored until [`ReceiverPlacementEditor::answer_prompt`].

use crate::math::coords::{ContainerBox, NormalizedCoordinateModel, PixelPoint, PixelSize};
use crate::model::{Position, Receiver, SavePositionsRequest};
use log::{debug, info};
use std::time::{Duration, Instant};

/// Two presses on the same marker within this window count as a double-click.
pub const DOUBLE_CLICK_WINDOW: Duration = Duration::from_millis(400);

/// Pointer distance, in pixels, within which a press captures a marker.
pub const MARKER_HIT_RADIUS: f32 = 10.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MarkerKey(u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditorMode {
    Idle,
    Dragging(MarkerKey),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerButton {
    Primary,
    Secondary,
    Middle,
}

/// Pointer input in absolute coordinates (the same space as the container box).
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PointerEvent {
    Pressed {
        at: PixelPoint,
        button: PointerButton,
        time: Instant,
    },
    Moved {
        at: PixelPoint,
    },
    Released {
        at: PixelPoint,
        button: PointerButton,
    },
}

/// Question the operator has to answer before a mutation happens.
#[derive(Debug, Clone, PartialEq)]
pub enum PromptRequest {
    NewReceiver { at: Position },
    Rename { key: MarkerKey, current: String },
}

impl PromptRequest {
    pub fn message(&self) -> &'static str {
        match self {
            PromptRequest::NewReceiver { .. } => "Enter Receiver Device ID:",
            PromptRequest::Rename { .. } => "Edit Device ID:",
        }
    }

    /// Text the prompt input starts with.
    pub fn initial_value(&self) -> &str {
        match self {
            PromptRequest::NewReceiver { .. } => "",
            PromptRequest::Rename { current, .. } => current,
        }
    }
}

/// What the caller should do after feeding an event to the editor.
#[derive(Debug, Clone, PartialEq)]
pub enum EditorEffect {
    None,
    Redraw,
    Prompt(PromptRequest),
}

/// Marker ready to be drawn at its current pixel position.
#[derive(Debug, Clone, PartialEq)]
pub struct Marker<'a> {
    pub key: MarkerKey,
    pub label: &'a str,
    pub at: PixelPoint,
    pub captured: bool,
}

#[derive(Debug, Clone)]
struct PlacedReceiver {
    key: MarkerKey,
    receiver: Receiver,
}

#[derive(Debug, Clone, Copy)]
struct LastPress {
    key: MarkerKey,
    time: Instant,
}

#[derive(Debug, Clone, Default)]
pub struct ReceiverPlacementEditor {
    placed: Vec<PlacedReceiver>,
    mode: Option<MarkerKey>,
    loaded: bool,
    pending_click: Option<Position>,
    last_press: Option<LastPress>,
    prompt: Option<PromptRequest>,
    next_key: u64,
}

impl ReceiverPlacementEditor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the collection with the backend's receivers; enables interaction.
    pub fn load(&mut self, receivers: Vec<Receiver>) {
        self.placed.clear();
        self.mode = None;
        self.pending_click = None;
        self.last_press = None;
        self.prompt = None;
        for receiver in receivers {
            self.place(receiver);
        }
        self.loaded = true;
        info!("editor loaded {} receivers", self.placed.len());
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    pub fn mode(&self) -> EditorMode {
        match self.mode {
            Some(key) => EditorMode::Dragging(key),
            None => EditorMode::Idle,
        }
    }

    pub fn pending_prompt(&self) -> Option<&PromptRequest> {
        self.prompt.as_ref()
    }

    pub fn receivers(&self) -> Vec<Receiver> {
        self.placed.iter().map(|placed| placed.receiver.clone()).collect()
    }

    pub fn receiver(&self, key: MarkerKey) -> Option<&Receiver> {
        self.placed
            .iter()
            .find(|placed| placed.key == key)
            .map(|placed| &placed.receiver)
    }

    pub fn keys(&self) -> Vec<MarkerKey> {
        self.placed.iter().map(|placed| placed.key).collect()
    }

    pub fn markers(&self, size: PixelSize) -> Vec<Marker<'_>> {
        self.placed
            .iter()
            .map(|placed| Marker {
                key: placed.key,
                label: &placed.receiver.device_id,
                at: NormalizedCoordinateModel::to_pixel(placed.receiver.position, size),
                captured: self.mode == Some(placed.key),
            })
            .collect()
    }

    /// Body for `/save_receiver_positions` holding the whole in-memory collection.
    pub fn save_request(&self) -> SavePositionsRequest {
        SavePositionsRequest {
            devices: self.receivers(),
        }
    }

    pub fn handle(&mut self, event: PointerEvent, container: ContainerBox) -> EditorEffect {
        if !self.loaded || self.prompt.is_some() {
            return EditorEffect::None;
        }
        match (self.mode, event) {
            (
                None,
                PointerEvent::Pressed {
                    at,
                    button: PointerButton::Primary,
                    time,
                },
            ) => self.press(at, time, container),
            (None, PointerEvent::Released { at, .. }) => match self.pending_click.take() {
                Some(position) if container.contains(at) => {
                    self.request(PromptRequest::NewReceiver { at: position })
                }
                _ => EditorEffect::None,
            },
            (Some(key), PointerEvent::Moved { at }) => {
                let position = NormalizedCoordinateModel::to_normalized(at, container);
                if let Some(placed) = self.placed.iter_mut().find(|placed| placed.key == key) {
                    placed.receiver.position = position;
                }
                EditorEffect::Redraw
            }
            (Some(key), PointerEvent::Released { .. }) => {
                self.mode = None;
                if let Some(receiver) = self.receiver(key) {
                    debug!(
                        "dropped {} at ({:.3}, {:.3})",
                        receiver.device_id, receiver.position.x, receiver.position.y
                    );
                }
                EditorEffect::Redraw
            }
            _ => EditorEffect::None,
        }
    }

    /// Resolves the pending prompt. `None` or an empty answer leaves everything unchanged.
    pub fn answer_prompt(&mut self, answer: Option<String>) -> Option<MarkerKey> {
        let request = self.prompt.take()?;
        let answer = answer.filter(|value| !value.is_empty())?;
        match request {
            PromptRequest::NewReceiver { at } => {
                let key = self.place(Receiver::new(answer, at));
                info!("added receiver at ({:.3}, {:.3})", at.x, at.y);
                Some(key)
            }
            PromptRequest::Rename { key, .. } => {
                let placed = self.placed.iter_mut().find(|placed| placed.key == key)?;
                info!("renamed {} to {}", placed.receiver.device_id, answer);
                placed.receiver.device_id = answer;
                Some(key)
            }
        }
    }

    fn press(&mut self, at: PixelPoint, time: Instant, container: ContainerBox) -> EditorEffect {
        self.pending_click = None;
        let Some(key) = self.marker_at(at, container) else {
            self.last_press = None;
            self.pending_click = Some(NormalizedCoordinateModel::to_normalized(at, container));
            return EditorEffect::None;
        };

        let repeated = self
            .last_press
            .is_some_and(|last| last.key == key && time.duration_since(last.time) <= DOUBLE_CLICK_WINDOW);
        if repeated {
            self.last_press = None;
            let current = self
                .receiver(key)
                .map(|receiver| receiver.device_id.clone())
                .unwrap_or_default();
            return self.request(PromptRequest::Rename { key, current });
        }

        self.last_press = Some(LastPress { key, time });
        self.mode = Some(key);
        EditorEffect::Redraw
    }

    fn request(&mut self, request: PromptRequest) -> EditorEffect {
        self.prompt = Some(request.clone());
        EditorEffect::Prompt(request)
    }

    fn place(&mut self, receiver: Receiver) -> MarkerKey {
        let key = MarkerKey(self.next_key);
        self.next_key += 1;
        self.placed.push(PlacedReceiver { key, receiver });
        key
    }

    /// Topmost marker under the pointer; later markers are drawn above earlier ones.
    fn marker_at(&self, pointer: PixelPoint, container: ContainerBox) -> Option<MarkerKey> {
        let local = container.to_local(pointer);
        self.placed
            .iter()
            .rev()
            .find(|placed| {
                let center =
                    NormalizedCoordinateModel::to_pixel(placed.receiver.position, container.size);
                center.distance(local) <= MARKER_HIT_RADIUS
            })
            .map(|placed| placed.key)
    }
}
