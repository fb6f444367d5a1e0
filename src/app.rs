use std::collections::VecDeque;
use std::path::Path;

use anyhow::Result;

use crate::model::config::AppConfig;
use crate::model::scene::Document;
use crate::msg::{BodyMessage, Msg, PROTOCOL_VERSION, PanelMessage};
use crate::panel::Panel;
use crate::plugin::{
    FrameRequest, FramingOutcome, NO_IMAGES_MESSAGE, frame_images, selection_summary,
};

pub struct App {
    pub document: Document,
    pub config: AppConfig,
    panel: Panel,
    /// Toast-style notices for the user, drained by the caller.
    pub notifications: VecDeque<String>,
    pub should_quit: bool,
}

impl App {
    pub fn new(config: AppConfig, mut document: Document, panel: Panel) -> Self {
        document.take_selection_changed();
        Self {
            document,
            config,
            panel,
            notifications: VecDeque::new(),
            should_quit: false,
        }
    }

    /// Announces the body to the panel and reports the initial selection.
    pub fn start(&mut self) {
        self.panel.post(BodyMessage::Init {
            version: PROTOCOL_VERSION,
        });
        self.send_selection();
    }

    pub fn update(&mut self, msg: Msg) -> Result<()> {
        match msg {
            Msg::Panel(PanelMessage::UiReady | PanelMessage::GetSelection) => {
                self.send_selection();
            }
            Msg::Panel(PanelMessage::FrameImages {
                custom_frame_name,
                arrange_horizontally,
            }) => {
                let request = FrameRequest {
                    custom_name: custom_frame_name,
                    arrange_horizontally,
                };
                self.frame(&request);
            }
            Msg::Panel(PanelMessage::ClosePlugin) | Msg::Quit => {
                tracing::info!("closing plugin");
                self.should_quit = true;
            }
            Msg::SceneChanged(path) => self.reload(&path),
        }

        // Host selectionchange event.
        if self.document.take_selection_changed() {
            self.send_selection();
        }
        Ok(())
    }

    pub fn notify(&mut self, message: impl Into<String>) {
        let message = message.into();
        tracing::info!("notify: {message}");
        self.notifications.push_back(message);
    }

    fn send_selection(&self) {
        let summary = selection_summary(&self.document);
        self.panel.post(BodyMessage::SelectionData {
            count: summary.count,
            has_images: summary.has_images,
        });
    }

    fn frame(&mut self, request: &FrameRequest) {
        match frame_images(&mut self.document, request, &self.config.framing) {
            FramingOutcome::NoImages => self.notify(NO_IMAGES_MESSAGE),
            FramingOutcome::Completed(report) => {
                self.notify(report.summary());
                if report.succeeded > 0 {
                    self.panel.post(BodyMessage::FramingSuccess {
                        success_count: report.succeeded,
                        error_count: report.failed,
                        skipped_count: report.skipped,
                    });
                }
            }
        }
    }

    fn reload(&mut self, path: &Path) {
        match Document::load(path) {
            Ok(document) => {
                self.document = document;
                self.send_selection();
            }
            Err(err) => tracing::warn!("ignoring scene change: {err}"),
        }
    }
}
