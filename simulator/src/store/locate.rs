use serde::{Deserialize, Serialize};
use trackcore::model::Position;

/// Fewer receivers than this cannot pin a sender down.
pub const MIN_RECEIVERS: usize = 3;

/// Log-distance path-loss model: distance in metres for a received power.
pub fn rssi_to_distance(rssi: f32, tx_power: f32, exponent: f32) -> f32 {
    10f32.powf((tx_power - rssi) / (10.0 * exponent))
}

/// Inverse of [`rssi_to_distance`].
pub fn distance_to_rssi(distance: f32, tx_power: f32, exponent: f32) -> f32 {
    tx_power - 10.0 * exponent * distance.max(f32::MIN_POSITIVE).log10()
}

/// Estimates sender positions from the readings of placed receivers.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct Locator {
    pub tx_power: f32,
    pub exponent: f32,
    /// Metres spanned by one unit of normalized map coordinates.
    pub room_scale_m: f32,
    pub iterations: usize,
    pub step: f32,
}

impl Default for Locator {
    fn default() -> Self {
        Self {
            tx_power: -50.0,
            exponent: 2.0,
            room_scale_m: 20.0,
            iterations: 400,
            step: 0.05,
        }
    }
}

impl Locator {
    /// Least-squares fit of the distance residuals, projected onto the unit square.
    pub fn estimate(&self, readings: &[(Position, i32)]) -> Option<Position> {
        if readings.len() < MIN_RECEIVERS {
            return None;
        }
        let scale = self.room_scale_m.max(f32::EPSILON);
        let ranged: Vec<(Position, f32)> = readings
            .iter()
            .map(|&(position, rssi)| {
                let metres = rssi_to_distance(rssi as f32, self.tx_power, self.exponent);
                (position, metres / scale)
            })
            .collect();

        let mut estimate = Self::weighted_centroid(&ranged);
        for _ in 0..self.iterations {
            let mut gx = 0.0;
            let mut gy = 0.0;
            for &(receiver, expected) in &ranged {
                let dx = estimate.x - receiver.x;
                let dy = estimate.y - receiver.y;
                let actual = (dx * dx + dy * dy).sqrt().max(1e-6);
                let residual = actual - expected;
                gx += 2.0 * residual * dx / actual;
                gy += 2.0 * residual * dy / actual;
            }
            estimate.x = (estimate.x - self.step * gx).clamp(0.0, 1.0);
            estimate.y = (estimate.y - self.step * gy).clamp(0.0, 1.0);
        }
        Some(estimate)
    }

    fn weighted_centroid(ranged: &[(Position, f32)]) -> Position {
        let (mut x, mut y, mut total) = (0.0, 0.0, 0.0);
        for &(receiver, distance) in ranged {
            let weight = 1.0 / distance.max(1e-3);
            x += receiver.x * weight;
            y += receiver.y * weight;
            total += weight;
        }
        if total > 0.0 {
            Position::new(x / total, y / total)
        } else {
            Position::new(0.5, 0.5)
        }
    }
}
