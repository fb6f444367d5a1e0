use std::sync::mpsc::Sender;

use thiserror::Error;

use crate::model::config::PanelConfig;
use crate::msg::BodyMessage;

pub const STARTUP_FAILED_MESSAGE: &str = "Error starting plugin. Please try again.";

#[derive(Debug, Error)]
pub enum PanelError {
    #[error("panel size {width}x{height} is not displayable")]
    InvalidSize { width: u32, height: u32 },
}

/// Outbound half of the panel link. Posting never fails the caller.
#[derive(Debug, Clone)]
pub struct Panel {
    outbox: Sender<BodyMessage>,
}

impl Panel {
    pub fn show(config: &PanelConfig, outbox: Sender<BodyMessage>) -> Result<Self, PanelError> {
        if config.width == 0 || config.height == 0 {
            return Err(PanelError::InvalidSize {
                width: config.width,
                height: config.height,
            });
        }

        tracing::info!("panel shown at {}x{}", config.width, config.height);
        Ok(Self { outbox })
    }

    pub fn post(&self, msg: BodyMessage) {
        if let Err(err) = self.outbox.send(msg) {
            tracing::error!("error posting {:?} to panel: panel is gone", err.0);
        }
    }
}
