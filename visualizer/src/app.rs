use crate::canvas::{DeviceMap, HistogramChart, ReceiverSetup};
use crate::config::DashboardConfig;
use chrono::{DateTime, Local};
use iced::{
    time,
    widget::{button, column, row, scrollable, text, text_input, Canvas, Column, Container},
    Alignment, Element, Length, Subscription, Task, Theme,
};
use log::{debug, error, info, warn};
use std::sync::Arc;
use trackcore::client::{BackendClient, ClientState, Redraw};
use trackcore::editor::{EditorEffect, PointerEvent, ReceiverPlacementEditor};
use trackcore::math::ContainerBox;
use trackcore::model::{Receiver, ScanTimestamp, ScannedDevice};
use trackcore::polling::{FeedOutcome, PollingScheduler};
use trackcore::prelude::Acknowledgement;
use trackcore::render::DeviceMapRenderer;
use trackcore::FetchResult;

const SAVED_MESSAGE: &str = "Devices saved successfully";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Page {
    Dashboard,
    Setup,
}

#[derive(Debug, Clone)]
pub enum Message {
    Tick,
    FeedPolled(FeedOutcome),
    PageSelected(Page),
    ReloadReceivers,
    ReceiversLoaded(FetchResult<Vec<Receiver>>),
    Pointer(PointerEvent, ContainerBox),
    PromptChanged(String),
    PromptSubmitted,
    PromptCancelled,
    SaveReceivers,
    ReceiversSaved(FetchResult<Acknowledgement>),
}

pub struct Dashboard {
    config: DashboardConfig,
    client: Arc<BackendClient>,
    scheduler: PollingScheduler<Arc<BackendClient>>,
    state: ClientState,
    renderer: DeviceMapRenderer,
    editor: ReceiverPlacementEditor,
    page: Page,
    prompt_input: String,
    connection: String,
    status: String,
}

pub fn run(config: DashboardConfig, client: BackendClient) -> iced::Result {
    iced::application(
        move || Dashboard::boot(config.clone(), client.clone()),
        Dashboard::update,
        Dashboard::view,
    )
    .title(Dashboard::title)
    .subscription(Dashboard::subscription)
    .theme(Dashboard::theme)
    .run()
}

impl Dashboard {
    fn boot(config: DashboardConfig, client: BackendClient) -> (Self, Task<Message>) {
        let client = Arc::new(client);
        let scheduler = PollingScheduler::new(client.clone(), config.poll_period());
        info!(
            "dashboard polling {} every {} ms",
            client.base_url(),
            scheduler.period().as_millis()
        );
        let dashboard = Dashboard {
            config,
            client,
            scheduler,
            state: ClientState::new(),
            renderer: DeviceMapRenderer::default(),
            editor: ReceiverPlacementEditor::new(),
            page: Page::Dashboard,
            prompt_input: String::new(),
            connection: "Waiting for the backend...".into(),
            status: String::new(),
        };
        let tasks = Task::batch([dashboard.poll_all(), dashboard.load_receivers()]);
        (dashboard, tasks)
    }

    fn title(&self) -> String {
        match self.page {
            Page::Dashboard => "BLE Tracking Dashboard".into(),
            Page::Setup => "BLE Tracking Dashboard - Receiver Setup".into(),
        }
    }

    fn subscription(&self) -> Subscription<Message> {
        time::every(self.config.poll_period()).map(|_| Message::Tick)
    }

    fn theme(&self) -> Theme {
        Theme::Dark
    }

    fn poll_all(&self) -> Task<Message> {
        Task::batch(
            self.scheduler
                .feeds()
                .iter()
                .map(|&feed| Task::perform(self.scheduler.poll(feed), Message::FeedPolled)),
        )
    }

    fn load_receivers(&self) -> Task<Message> {
        let client = self.client.clone();
        Task::perform(
            async move { client.receiver_positions().await },
            Message::ReceiversLoaded,
        )
    }

    fn update(&mut self, message: Message) -> Task<Message> {
        match message {
            Message::Tick => self.poll_all(),
            Message::FeedPolled(outcome) => {
                if let Err(err) = &outcome.result {
                    self.connection = format!("{} poll failed: {err}", outcome.feed.name());
                }
                if let Some(redraw) = self.state.apply(outcome) {
                    debug!("redraw {:?}", redraw);
                    if redraw == Redraw::Counter {
                        self.connection = format!("Connected to {}", self.client.base_url());
                    }
                }
                Task::none()
            }
            Message::PageSelected(page) => {
                self.page = page;
                Task::none()
            }
            Message::ReloadReceivers => self.load_receivers(),
            Message::ReceiversLoaded(Ok(receivers)) => {
                info!("loaded {} receivers for placement", receivers.len());
                self.editor.load(receivers);
                self.prompt_input.clear();
                Task::none()
            }
            Message::ReceiversLoaded(Err(err)) => {
                error!("loading receiver positions failed: {}", err);
                self.status = format!("Could not load receivers: {err}");
                Task::none()
            }
            Message::Pointer(event, container) => {
                if let EditorEffect::Prompt(request) = self.editor.handle(event, container) {
                    self.prompt_input = request.initial_value().to_string();
                }
                Task::none()
            }
            Message::PromptChanged(value) => {
                self.prompt_input = value;
                Task::none()
            }
            Message::PromptSubmitted => {
                let answer = std::mem::take(&mut self.prompt_input);
                self.editor.answer_prompt(Some(answer));
                Task::none()
            }
            Message::PromptCancelled => {
                self.prompt_input.clear();
                self.editor.answer_prompt(None);
                Task::none()
            }
            Message::SaveReceivers => {
                let client = self.client.clone();
                let request = self.editor.save_request();
                Task::perform(
                    async move { client.save_receiver_positions(&request).await },
                    Message::ReceiversSaved,
                )
            }
            Message::ReceiversSaved(Ok(_)) => {
                info!("receiver placement saved");
                self.status = SAVED_MESSAGE.into();
                Task::none()
            }
            Message::ReceiversSaved(Err(err)) => {
                warn!("saving receiver positions failed: {}", err);
                self.status = format!("Save failed: {err}");
                Task::none()
            }
        }
    }

    fn view(&self) -> Element<'_, Message> {
        let pages = row![
            button("Dashboard")
                .on_press(Message::PageSelected(Page::Dashboard))
                .padding(8),
            button("Receiver setup")
                .on_press(Message::PageSelected(Page::Setup))
                .padding(8),
            text(&self.connection).size(14),
        ]
        .spacing(10)
        .align_y(Alignment::Center);

        let body = match self.page {
            Page::Dashboard => self.dashboard_view(),
            Page::Setup => self.setup_view(),
        };

        Container::new(column![pages, body].spacing(16).padding(20))
            .width(Length::Fill)
            .height(Length::Fill)
            .into()
    }

    fn dashboard_view(&self) -> Element<'_, Message> {
        let counter = match self.state.valid_devices() {
            Some(valid) => {
                let updated: DateTime<Local> = valid.updated_at.into();
                column![
                    text(format!("Valid devices: {}", valid.count)).size(22),
                    text(format!("Last updated: {}", updated.format("%Y-%m-%d %H:%M:%S"))).size(12),
                ]
            }
            None => column![text("Valid devices: n/a").size(22)],
        };

        let map = Canvas::new(DeviceMap {
            renderer: &self.renderer,
            scene: self.state.positions(),
            metadata: self.state.metadata(),
        })
        .width(Length::Fixed(self.config.map_width))
        .height(Length::Fixed(self.config.map_height));

        let histogram = Canvas::new(HistogramChart {
            histogram: self.state.histogram(),
        })
        .width(Length::Fill)
        .height(Length::Fixed(260.0));

        let devices = self.state.scanned_devices();
        let device_list = if devices.is_empty() {
            Column::new().push(text("No devices scanned yet").size(12))
        } else {
            devices
                .iter()
                .fold(Column::new().spacing(4), |col, device| {
                    col.push(text(device_line(device)).size(12))
                })
        };

        let side = column![
            counter,
            text("RSSI distribution").size(18),
            histogram,
            text(format!("Scanned devices ({})", devices.len())).size(18),
            Container::new(scrollable(device_list).height(Length::Fill)).padding(6),
        ]
        .spacing(10)
        .width(Length::Fill);

        row![column![text("Device map").size(18), map].spacing(10), side]
            .spacing(20)
            .align_y(Alignment::Start)
            .into()
    }

    fn setup_view(&self) -> Element<'_, Message> {
        let surface = Canvas::new(ReceiverSetup {
            editor: &self.editor,
        })
        .width(Length::Fixed(self.config.map_width))
        .height(Length::Fixed(self.config.map_height));

        let mut controls = Column::new()
            .spacing(10)
            .width(Length::Fixed(320.0))
            .push(text("Receiver placement").size(22))
            .push(
                text("Drag markers to move them. Click an empty spot to add a receiver, double-click a marker to rename it.")
                    .size(12),
            );

        if let Some(request) = self.editor.pending_prompt() {
            controls = controls.push(
                column![
                    text(request.message()).size(14),
                    text_input("Device ID", &self.prompt_input)
                        .on_input(Message::PromptChanged)
                        .on_submit(Message::PromptSubmitted)
                        .padding(6),
                    row![
                        button("OK").on_press(Message::PromptSubmitted).padding(8),
                        button("Cancel").on_press(Message::PromptCancelled).padding(8),
                    ]
                    .spacing(8),
                ]
                .spacing(6),
            );
        }

        let receivers = self.editor.receivers();
        let listing = receivers.iter().fold(Column::new().spacing(2), |col, receiver| {
            col.push(
                text(format!(
                    "{}  ({:.3}, {:.3})",
                    receiver.device_id, receiver.position.x, receiver.position.y
                ))
                .size(12),
            )
        });

        let save = button("Save receivers").padding(10);
        let save = if self.editor.is_loaded() && self.editor.pending_prompt().is_none() {
            save.on_press(Message::SaveReceivers)
        } else {
            save
        };

        controls = controls
            .push(listing)
            .push(row![save, button("Reload").on_press(Message::ReloadReceivers).padding(10)].spacing(8))
            .push(text(&self.status).size(14));

        row![surface, controls]
            .spacing(20)
            .align_y(Alignment::Start)
            .into()
    }
}

/// One line of the scanned-device list.
pub fn device_line(device: &ScannedDevice) -> String {
    let name = device
        .name
        .as_deref()
        .filter(|name| !name.is_empty())
        .unwrap_or("Unnamed");
    let manufacturer = device
        .manufacture_id
        .as_ref()
        .map(ToString::to_string)
        .unwrap_or_else(|| "-".into());
    let seen = device
        .timestamp
        .as_ref()
        .map(format_timestamp)
        .unwrap_or_else(|| "-".into());
    format!(
        "{name} | {} | {} dBm | via {} | mfr {manufacturer} | {seen}",
        device.mac_address, device.rssi, device.device_id
    )
}

/// Local wall-clock rendering of a scan timestamp; text timestamps are shown as sent.
pub fn format_timestamp(timestamp: &ScanTimestamp) -> String {
    timestamp
        .epoch_millis()
        .and_then(DateTime::from_timestamp_millis)
        .map(|utc| utc.with_timezone(&Local).format("%H:%M:%S").to_string())
        .unwrap_or_else(|| timestamp.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use trackcore::model::ManufactureId;

    fn device(name: Option<&str>) -> ScannedDevice {
        ScannedDevice {
            device_id: "R1".into(),
            mac_address: "AA:BB:CC:DD:EE:FF".into(),
            manufacture_id: Some(ManufactureId::List(vec![76, 117])),
            name: name.map(Into::into),
            timestamp: Some(ScanTimestamp::Text("yesterday".into())),
            rssi: -61,
        }
    }

    #[test]
    fn device_line_shows_name_or_unnamed() {
        let named = device_line(&device(Some("Badge")));
        assert!(named.starts_with("Badge | AA:BB:CC:DD:EE:FF | -61 dBm | via R1"));
        assert!(named.contains("mfr [76, 117]"));
        assert!(named.ends_with("yesterday"));

        assert!(device_line(&device(None)).starts_with("Unnamed |"));
        assert!(device_line(&device(Some(""))).starts_with("Unnamed |"));
    }

    #[test]
    fn epoch_timestamps_render_as_local_time() {
        let rendered = format_timestamp(&ScanTimestamp::Epoch(1_714_564_800_000.0));
        let expected = DateTime::from_timestamp_millis(1_714_564_800_000)
            .unwrap()
            .with_timezone(&Local)
            .format("%H:%M:%S")
            .to_string();
        assert_eq!(rendered, expected);
    }
}
