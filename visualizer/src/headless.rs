use crate::config::DashboardConfig;
use anyhow::Context;
use chrono::{DateTime, Local};
use log::info;
use std::sync::Arc;
use tokio::runtime::Builder as TokioBuilder;
use tokio::signal;
use tokio::sync::mpsc;
use trackcore::client::{BackendClient, ClientState, Redraw};
use trackcore::math::PixelSize;
use trackcore::polling::PollingScheduler;
use trackcore::render::{DeviceMapRenderer, DrawList};

/// Dashboard without a window: polls the backend and logs every view refresh.
pub struct HeadlessView {
    state: ClientState,
    renderer: DeviceMapRenderer,
    surface: DrawList,
}

impl HeadlessView {
    pub fn new(config: &DashboardConfig) -> Self {
        Self {
            state: ClientState::new(),
            renderer: DeviceMapRenderer::default(),
            surface: DrawList::new(PixelSize::new(config.map_width, config.map_height)),
        }
    }

    pub fn state_mut(&mut self) -> &mut ClientState {
        &mut self.state
    }

    pub fn surface(&self) -> &DrawList {
        &self.surface
    }

    /// Re-renders whatever `redraw` names and describes the result.
    pub fn refresh(&mut self, redraw: Redraw) -> String {
        match redraw {
            Redraw::Map => {
                let scene = self.state.positions();
                self.renderer
                    .draw(&mut self.surface, scene, self.state.metadata());
                format!(
                    "map: {} receivers, {} senders, {} draw commands",
                    scene.receivers.len(),
                    scene.senders.as_ref().map_or(0, Vec::len),
                    self.surface.commands().len()
                )
            }
            Redraw::Histogram => {
                let histogram = self.state.histogram();
                let receivers: Vec<&str> = self.state.rssi().receivers().collect();
                format!(
                    "histogram: {:?} ({} dropped) from [{}]",
                    histogram.counts(),
                    histogram.dropped(),
                    receivers.join(", ")
                )
            }
            Redraw::DeviceList => format!(
                "scanned devices: {} ({} with metadata)",
                self.state.scanned_devices().len(),
                self.state.metadata().len()
            ),
            Redraw::Counter => match self.state.valid_devices() {
                Some(valid) => {
                    let updated: DateTime<Local> = valid.updated_at.into();
                    format!(
                        "valid devices: {} (updated {})",
                        valid.count,
                        updated.format("%H:%M:%S")
                    )
                }
                None => "valid devices: n/a".into(),
            },
        }
    }
}

pub fn run(config: DashboardConfig, client: BackendClient, once: bool) -> anyhow::Result<()> {
    let runtime = TokioBuilder::new_multi_thread()
        .enable_all()
        .build()
        .context("creating runtime for headless polling")?;

    runtime.block_on(async move {
        let scheduler = PollingScheduler::new(Arc::new(client), config.poll_period());
        let mut view = HeadlessView::new(&config);

        if once {
            for outcome in scheduler.run_cycle().await {
                if let Some(redraw) = view.state_mut().apply(outcome) {
                    println!("{}", view.refresh(redraw));
                }
            }
            return Ok(());
        }

        let (sink, mut outcomes) = mpsc::unbounded_channel();
        let handle = scheduler.start(sink);
        loop {
            tokio::select! {
                Some(outcome) = outcomes.recv() => {
                    if let Some(redraw) = view.state_mut().apply(outcome) {
                        info!("{}", view.refresh(redraw));
                    }
                }
                result = signal::ctrl_c() => {
                    result.context("awaiting Ctrl+C to exit")?;
                    break;
                }
            }
        }
        handle.stop().await;
        Ok::<(), anyhow::Error>(())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use trackcore::model::{DevicePositions, Position, Receiver, RssiSampleSet, Sender};
    use trackcore::polling::{Feed, FeedOutcome, FeedUpdate};

    fn outcome(generation: u64, update: FeedUpdate) -> FeedOutcome {
        FeedOutcome {
            feed: update.feed(),
            generation,
            result: Ok(update),
        }
    }

    #[test]
    fn map_refresh_draws_into_the_surface() {
        let mut view = HeadlessView::new(&DashboardConfig::default());
        let positions = DevicePositions {
            receivers: vec![Receiver::new("R1", Position::new(0.5, 0.5))],
            senders: Some(vec![Sender::new("aa", Position::new(0.1, 0.1))]),
        };
        let redraw = view
            .state_mut()
            .apply(outcome(1, FeedUpdate::DevicePositions(positions)))
            .unwrap();
        assert_eq!(redraw, Redraw::Map);

        let summary = view.refresh(redraw);
        assert_eq!(summary, "map: 1 receivers, 1 senders, 4 draw commands");
        assert_eq!(view.surface().texts().collect::<Vec<_>>(), vec!["Receiver R1"]);
    }

    #[test]
    fn histogram_refresh_reports_buckets() {
        let mut view = HeadlessView::new(&DashboardConfig::default());
        let samples = RssiSampleSet::from_pairs([("R1", vec![-95, -72, -48, -5])]);
        let redraw = view
            .state_mut()
            .apply(outcome(1, FeedUpdate::Rssi(samples)))
            .unwrap();
        assert_eq!(
            view.refresh(redraw),
            "histogram: [1, 0, 1, 0, 0, 1, 0, 0, 0, 1, 0] (0 dropped) from [R1]"
        );
    }

    #[test]
    fn counter_refresh_before_any_poll_is_unknown() {
        let mut view = HeadlessView::new(&DashboardConfig::default());
        assert_eq!(view.refresh(Redraw::Counter), "valid devices: n/a");
        view.state_mut()
            .apply(outcome(3, FeedUpdate::ValidDevices(7)))
            .unwrap();
        assert!(view.refresh(Redraw::Counter).starts_with("valid devices: 7 (updated "));
        assert_eq!(view.state_mut().applied_generation(Feed::ValidDevices), Some(3));
    }
}
