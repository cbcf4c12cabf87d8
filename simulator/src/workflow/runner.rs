use crate::generator::profile::ScanGenerator;
use crate::store::{read_state, write_state, SharedState};
use crate::workflow::config::SimulatorConfig;
use chrono::{DateTime, Utc};
use log::{debug, info, warn};
use std::f32::consts::TAU;
use std::time::Duration;
use tokio::time::{self, MissedTickBehavior};
use trackcore::model::{Position, Receiver};

/// Places `count` receivers on a circle around the middle of the map.
pub fn default_layout(count: usize) -> Vec<Receiver> {
    (0..count)
        .map(|index| {
            let angle = TAU * index as f32 / count as f32;
            Receiver::new(
                format!("R{}", index + 1),
                Position::new(0.5 + 0.4 * angle.cos(), 0.5 + 0.4 * angle.sin()),
            )
        })
        .collect()
}

/// Feeds generated scans into the shared backend state on a fixed tick.
pub struct ScanRunner {
    state: SharedState,
    generator: ScanGenerator,
    tick: Duration,
}

impl ScanRunner {
    pub fn new(config: &SimulatorConfig, state: SharedState) -> Self {
        Self {
            generator: ScanGenerator::new(config.generator.clone(), config.locator),
            tick: config.tick(),
            state,
        }
    }

    /// Seeds the default layout when nothing has been placed yet. Returns how many were placed.
    pub fn seed_receivers(&self, count: usize) -> anyhow::Result<usize> {
        let mut state = write_state(&self.state);
        if !state.receivers.is_empty() || count == 0 {
            return Ok(0);
        }
        state.receivers.replace(default_layout(count))?;
        info!("seeded {} receivers", count);
        Ok(count)
    }

    /// Runs one generator step and returns the number of reports ingested.
    pub fn tick_once(&mut self, now: DateTime<Utc>) -> usize {
        let receivers = read_state(&self.state).receivers.receivers();
        let reports = self.generator.step(&receivers, now);
        let mut state = write_state(&self.state);
        let mut ingested = 0;
        for report in reports {
            match state.scans.ingest(report, now) {
                Ok(()) => ingested += 1,
                Err(err) => warn!("generated scan rejected: {}", err),
            }
        }
        debug!(
            "tick ingested {} reports, {} senders tracked",
            ingested,
            state.scans.len()
        );
        ingested
    }

    pub async fn run(mut self) {
        let mut ticker = time::interval(self.tick);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            self.tick_once(Utc::now());
        }
    }
}
