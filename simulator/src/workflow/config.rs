use crate::generator::profile::GeneratorConfig;
use crate::store::Locator;
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::fs;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulatorConfig {
    pub bind: SocketAddr,
    pub receivers_file: PathBuf,
    pub tick_ms: u64,
    /// Receivers placed on a corner layout when the registry starts empty.
    pub seed_receivers: usize,
    pub generator: GeneratorConfig,
    pub locator: Locator,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            bind: SocketAddr::from(([127, 0, 0, 1], 5050)),
            receivers_file: PathBuf::from("data/receivers.json"),
            tick_ms: 1000,
            seed_receivers: 3,
            generator: GeneratorConfig::default(),
            locator: Locator::default(),
        }
    }
}

impl SimulatorConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path_ref = path.as_ref();
        let contents = fs::read_to_string(path_ref)
            .with_context(|| format!("reading simulator config {}", path_ref.display()))?;
        let config: SimulatorConfig = serde_yaml::from_str(&contents)
            .with_context(|| format!("parsing simulator config {}", path_ref.display()))?;
        Ok(config)
    }

    pub fn from_args(bind: SocketAddr, receivers_file: PathBuf, senders: usize, seed: u64) -> Self {
        Self {
            bind,
            receivers_file,
            generator: GeneratorConfig {
                senders,
                seed,
                ..GeneratorConfig::default()
            },
            ..Self::default()
        }
    }

    pub fn tick(&self) -> Duration {
        Duration::from_millis(self.tick_ms.max(1))
    }
}
