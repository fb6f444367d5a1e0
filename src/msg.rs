use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Version of the panel message schema, announced with [`BodyMessage::Init`].
pub const PROTOCOL_VERSION: u32 = 1;

/// Messages sent by the panel to the plugin body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum PanelMessage {
    UiReady,
    GetSelection,
    #[serde(rename_all = "camelCase")]
    FrameImages {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        custom_frame_name: Option<String>,
        #[serde(default)]
        arrange_horizontally: bool,
    },
    ClosePlugin,
}

/// Messages sent by the plugin body to the panel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum BodyMessage {
    Init {
        version: u32,
    },
    #[serde(rename_all = "camelCase")]
    SelectionData { count: usize, has_images: bool },
    #[serde(rename_all = "camelCase")]
    FramingSuccess {
        success_count: usize,
        error_count: usize,
        skipped_count: usize,
    },
}

/// All events that drive the app loop.
#[derive(Debug)]
pub enum Msg {
    // -- Panel
    Panel(PanelMessage),

    // -- Host
    SceneChanged(PathBuf),

    // -- System
    Quit,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn panel_messages_use_kebab_tags_and_camel_fields() {
        let msg: PanelMessage = serde_json::from_str(
            r#"{"type":"frame-images","customFrameName":"Hero","arrangeHorizontally":true}"#,
        )
        .unwrap();
        assert_eq!(
            msg,
            PanelMessage::FrameImages {
                custom_frame_name: Some("Hero".to_string()),
                arrange_horizontally: true,
            }
        );

        let bare: PanelMessage = serde_json::from_str(r#"{"type":"frame-images"}"#).unwrap();
        assert_eq!(
            bare,
            PanelMessage::FrameImages {
                custom_frame_name: None,
                arrange_horizontally: false,
            }
        );

        let ready: PanelMessage = serde_json::from_str(r#"{"type":"ui-ready"}"#).unwrap();
        assert_eq!(ready, PanelMessage::UiReady);
        assert!(serde_json::from_str::<PanelMessage>(r#"{"type":"explode"}"#).is_err());
    }

    #[test]
    fn body_messages_match_panel_contract() {
        let json = serde_json::to_value(BodyMessage::FramingSuccess {
            success_count: 2,
            error_count: 1,
            skipped_count: 0,
        })
        .unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "type": "framing-success",
                "successCount": 2,
                "errorCount": 1,
                "skippedCount": 0
            })
        );

        let json = serde_json::to_value(BodyMessage::SelectionData {
            count: 3,
            has_images: true,
        })
        .unwrap();
        assert_eq!(
            json,
            serde_json::json!({ "type": "selection-data", "count": 3, "hasImages": true })
        );
    }
}
