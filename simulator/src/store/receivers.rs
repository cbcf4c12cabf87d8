use anyhow::Context;
use log::info;
use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use trackcore::model::{Position, Receiver};

/// Receivers in placement order, stored on disk as a `{ device_id: {x, y} }` object
/// whose key order follows the order the operator placed them in.
#[derive(Debug, Clone, Default, PartialEq)]
struct Placement(Vec<Receiver>);

impl Placement {
    /// Keeps the first slot of a repeated id but the last position posted for it.
    fn insert(&mut self, device_id: String, position: Position) {
        match self.0.iter_mut().find(|receiver| receiver.device_id == device_id) {
            Some(existing) => existing.position = position,
            None => self.0.push(Receiver::new(device_id, position)),
        }
    }
}

impl Serialize for Placement {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for receiver in &self.0 {
            map.serialize_entry(&receiver.device_id, &receiver.position)?;
        }
        map.end()
    }
}

struct PlacementVisitor;

impl<'de> Visitor<'de> for PlacementVisitor {
    type Value = Placement;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("an object of receiver positions")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Placement, A::Error> {
        let mut placement = Placement::default();
        while let Some((device_id, position)) = access.next_entry::<String, Position>()? {
            placement.insert(device_id, position);
        }
        Ok(placement)
    }
}

impl<'de> Deserialize<'de> for Placement {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_map(PlacementVisitor)
    }
}

/// Placed receivers, persisted as a JSON object keyed by `device_id`.
#[derive(Debug, Clone, Default)]
pub struct ReceiverRegistry {
    path: Option<PathBuf>,
    positions: Placement,
}

impl ReceiverRegistry {
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// Loads `path` if it exists; a missing file starts an empty registry.
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path_ref = path.as_ref();
        let positions = if path_ref.exists() {
            let contents = fs::read_to_string(path_ref)
                .with_context(|| format!("reading receiver positions {}", path_ref.display()))?;
            serde_json::from_str(&contents)
                .with_context(|| format!("parsing receiver positions {}", path_ref.display()))?
        } else {
            Placement::default()
        };
        Ok(Self {
            path: Some(path_ref.to_path_buf()),
            positions,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.positions.0.is_empty()
    }

    pub fn position(&self, device_id: &str) -> Option<Position> {
        self.positions
            .0
            .iter()
            .find(|receiver| receiver.device_id == device_id)
            .map(|receiver| receiver.position)
    }

    /// Receivers in the order they were placed.
    pub fn receivers(&self) -> Vec<Receiver> {
        self.positions.0.clone()
    }

    /// Replaces the placement with `devices` and writes it out. Repeated ids keep the last
    /// position.
    pub fn replace(&mut self, devices: Vec<Receiver>) -> anyhow::Result<()> {
        let mut placement = Placement::default();
        for device in devices {
            if !device.device_id.is_empty() {
                placement.insert(device.device_id, device.position);
            }
        }
        self.positions = placement;
        self.persist()
    }

    fn persist(&self) -> anyhow::Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(&self.positions)?;
        fs::write(path, contents)
            .with_context(|| format!("writing receiver positions {}", path.display()))?;
        info!("saved {} receivers to {}", self.positions.0.len(), path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn missing_file_starts_empty() {
        let dir = tempdir().unwrap();
        let registry = ReceiverRegistry::load(dir.path().join("receivers.json")).unwrap();
        assert!(registry.is_empty());
    }

    #[test]
    fn replace_persists_and_reloads() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested/receivers.json");
        let mut registry = ReceiverRegistry::load(&path).unwrap();
        registry
            .replace(vec![
                Receiver::new("R1", Position::new(0.1, 0.2)),
                Receiver::new("R2", Position::new(0.9, 0.8)),
            ])
            .unwrap();

        let reloaded = ReceiverRegistry::load(&path).unwrap();
        assert_eq!(reloaded.receivers().len(), 2);
        assert_eq!(reloaded.position("R2"), Some(Position::new(0.9, 0.8)));
    }

    #[test]
    fn placement_order_survives_a_reload() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("receivers.json");
        let mut registry = ReceiverRegistry::load(&path).unwrap();
        registry
            .replace(vec![
                Receiver::new("Kitchen", Position::new(0.1, 0.2)),
                Receiver::new("Attic", Position::new(0.5, 0.5)),
                Receiver::new("Bedroom", Position::new(0.9, 0.8)),
                Receiver::new("Attic", Position::new(0.6, 0.4)),
            ])
            .unwrap();

        let reloaded = ReceiverRegistry::load(&path).unwrap();
        let ids: Vec<_> = reloaded
            .receivers()
            .into_iter()
            .map(|receiver| receiver.device_id)
            .collect();
        assert_eq!(ids, vec!["Kitchen", "Attic", "Bedroom"]);
        assert_eq!(reloaded.position("Attic"), Some(Position::new(0.6, 0.4)));
    }

    #[test]
    fn replace_drops_receivers_missing_from_the_save() {
        let mut registry = ReceiverRegistry::in_memory();
        registry
            .replace(vec![Receiver::new("R1", Position::new(0.1, 0.2))])
            .unwrap();
        registry
            .replace(vec![Receiver::new("Entrance", Position::new(0.1, 0.2))])
            .unwrap();
        assert_eq!(registry.position("R1"), None);
        assert!(registry.position("Entrance").is_some());
    }
}
