use crate::math::coords::NormalizedCoordinateModel;
use crate::model::{DeviceMetadata, DevicePositions, Sender};
use crate::render::surface::{MapSurface, Rgba};

/// Colors and marker geometry used by the device map.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MapStyle {
    pub receiver: Rgba,
    pub named_sender: Rgba,
    pub unnamed_sender: Rgba,
    pub marker_radius: f32,
    pub label_offset: f32,
}

impl Default for MapStyle {
    fn default() -> Self {
        Self {
            receiver: Rgba::opaque(255, 0, 0),
            named_sender: Rgba::opaque(0, 0, 128),
            unnamed_sender: Rgba::new(0, 128, 0, 0.2),
            marker_radius: 10.0,
            label_offset: 10.0,
        }
    }
}

/// How a sender is drawn once its metadata has been consulted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SenderStyle<'a> {
    Named(&'a str),
    Unnamed,
}

impl<'a> SenderStyle<'a> {
    /// Metadata name first, then whatever name the position feed carried.
    /// Unknown macs resolve to `Unnamed`; the lookup never fails.
    pub fn resolve(sender: &'a Sender, metadata: &'a DeviceMetadata) -> Self {
        metadata
            .display_name(&sender.mac_address)
            .or_else(|| sender.name.as_deref().filter(|name| !name.is_empty()))
            .map(SenderStyle::Named)
            .unwrap_or(SenderStyle::Unnamed)
    }
}

/// Draws receivers and senders onto a [`MapSurface`].
#[derive(Debug, Clone, Default)]
pub struct DeviceMapRenderer {
    style: MapStyle,
}

impl DeviceMapRenderer {
    pub fn new(style: MapStyle) -> Self {
        Self { style }
    }

    pub fn style(&self) -> &MapStyle {
        &self.style
    }

    pub fn draw<S: MapSurface + ?Sized>(
        &self,
        surface: &mut S,
        scene: &DevicePositions,
        metadata: &DeviceMetadata,
    ) {
        let size = surface.size();
        surface.clear(size);

        for receiver in &scene.receivers {
            let center = NormalizedCoordinateModel::to_pixel(receiver.position, size);
            surface.fill_circle(center, self.style.marker_radius, self.style.receiver);
            surface.fill_text(
                &format!("Receiver {}", receiver.device_id),
                center.offset(self.style.label_offset, 0.0),
                self.style.receiver,
            );
        }

        let senders = scene.senders.as_deref().unwrap_or_default();
        for sender in senders {
            let center = NormalizedCoordinateModel::to_pixel(sender.position, size);
            match SenderStyle::resolve(sender, metadata) {
                SenderStyle::Named(name) => {
                    surface.fill_circle(center, self.style.marker_radius, self.style.named_sender);
                    surface.fill_text(
                        name,
                        center.offset(self.style.label_offset, 0.0),
                        self.style.named_sender,
                    );
                }
                SenderStyle::Unnamed => {
                    surface.fill_circle(
                        center,
                        self.style.marker_radius,
                        self.style.unnamed_sender,
                    );
                }
            }
        }
    }
}
