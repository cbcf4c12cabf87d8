use crate::store::locate::distance_to_rssi;
use crate::store::{Locator, ScanReport};
use chrono::{DateTime, SecondsFormat, Utc};
use rand::{rngs::StdRng, Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use trackcore::model::{ManufactureId, Position, Receiver};

/// Configuration for the synthetic sender population.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    pub senders: usize,
    pub seed: u64,
    /// Standard deviation-ish spread of RSSI jitter, in dB.
    pub noise_db: f32,
    /// Largest per-tick movement along each axis, in normalized units.
    pub step: f32,
    /// Fraction of senders that advertise a name.
    pub named_ratio: f32,
    /// Readings weaker than this are not reported, as a real scanner would miss them.
    pub sensitivity_dbm: i32,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            senders: 8,
            seed: 0,
            noise_db: 3.0,
            step: 0.01,
            named_ratio: 0.5,
            sensitivity_dbm: -100,
        }
    }
}

#[derive(Debug, Clone)]
struct SyntheticSender {
    mac_address: String,
    name: Option<String>,
    manufacture_id: ManufactureId,
    position: Position,
}

/// Random-walking senders observed by the placed receivers.
pub struct ScanGenerator {
    config: GeneratorConfig,
    locator: Locator,
    rng: StdRng,
    senders: Vec<SyntheticSender>,
}

impl ScanGenerator {
    pub fn new(config: GeneratorConfig, locator: Locator) -> Self {
        let mut rng = StdRng::seed_from_u64(config.seed);
        let senders = (0..config.senders)
            .map(|index| {
                let octets: Vec<String> = (0..6).map(|_| format!("{:02X}", rng.gen::<u8>())).collect();
                let named = rng.gen::<f32>() < config.named_ratio;
                SyntheticSender {
                    mac_address: octets.join(":"),
                    name: named.then(|| format!("Tag-{:02}", index + 1)),
                    manufacture_id: if index % 2 == 0 {
                        ManufactureId::Single(76)
                    } else {
                        ManufactureId::List(vec![76, 117])
                    },
                    position: Position::new(rng.gen_range(0.0..1.0), rng.gen_range(0.0..1.0)),
                }
            })
            .collect();
        Self {
            config,
            locator,
            rng,
            senders,
        }
    }

    pub fn sender_count(&self) -> usize {
        self.senders.len()
    }

    /// Moves every sender one step and returns what each receiver would report.
    pub fn step(&mut self, receivers: &[Receiver], now: DateTime<Utc>) -> Vec<ScanReport> {
        let time = now.to_rfc3339_opts(SecondsFormat::Millis, true);
        let step = self.config.step.max(0.0);
        let noise = self.config.noise_db.max(0.0);
        let mut reports = Vec::with_capacity(self.senders.len() * receivers.len());

        for sender in &mut self.senders {
            if step > 0.0 {
                sender.position.x = (sender.position.x + self.rng.gen_range(-step..=step)).clamp(0.0, 1.0);
                sender.position.y = (sender.position.y + self.rng.gen_range(-step..=step)).clamp(0.0, 1.0);
            }
            for receiver in receivers {
                let dx = receiver.position.x - sender.position.x;
                let dy = receiver.position.y - sender.position.y;
                let metres = ((dx * dx + dy * dy).sqrt() * self.locator.room_scale_m).max(0.5);
                let jitter = if noise > 0.0 {
                    self.rng.gen_range(-noise..=noise)
                } else {
                    0.0
                };
                let rssi = (distance_to_rssi(metres, self.locator.tx_power, self.locator.exponent)
                    + jitter)
                    .round() as i32;
                if rssi < self.config.sensitivity_dbm {
                    continue;
                }
                reports.push(ScanReport {
                    device_id: Some(receiver.device_id.clone()),
                    address: Some(sender.mac_address.clone()),
                    rssi: Some(rssi),
                    manufacture_id: Some(sender.manufacture_id.clone()),
                    name: sender.name.clone(),
                    time: Some(time.clone()),
                });
            }
        }
        reports
    }
}
