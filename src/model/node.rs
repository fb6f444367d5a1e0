use serde::{Deserialize, Serialize};
use slotmap::new_key_type;
use smallvec::SmallVec;

new_key_type! {
    /// Handle to a node owned by a [`Document`](crate::model::scene::Document).
    pub struct NodeId;
}

/// Scene node variants known to the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NodeKind {
    Page,
    Rectangle,
    Ellipse,
    Text,
    Vector,
    Frame,
    Group,
    Section,
    Component,
    Instance,
}

impl NodeKind {
    /// Whether nodes of this kind can hold children, and therefore accept
    /// indexed insertion.
    pub fn supports_children(self) -> bool {
        matches!(
            self,
            NodeKind::Page
                | NodeKind::Frame
                | NodeKind::Group
                | NodeKind::Section
                | NodeKind::Component
        )
    }

    pub fn label(self) -> &'static str {
        match self {
            NodeKind::Page => "PAGE",
            NodeKind::Rectangle => "RECTANGLE",
            NodeKind::Ellipse => "ELLIPSE",
            NodeKind::Text => "TEXT",
            NodeKind::Vector => "VECTOR",
            NodeKind::Frame => "FRAME",
            NodeKind::Group => "GROUP",
            NodeKind::Section => "SECTION",
            NodeKind::Component => "COMPONENT",
            NodeKind::Instance => "INSTANCE",
        }
    }
}

/// A fill attached to a shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Paint {
    Solid {
        #[serde(default)]
        color: String,
    },
    #[serde(rename_all = "camelCase")]
    Image {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        image_hash: Option<String>,
    },
    GradientLinear {},
    GradientRadial {},
}

impl Paint {
    pub fn is_image(&self) -> bool {
        matches!(self, Paint::Image { .. })
    }
}

/// Fill list. `None` on a node means the list is absent (mixed or unsupported).
pub type Fills = SmallVec<[Paint; 2]>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Constraint {
    #[default]
    Min,
    Max,
    Center,
    Stretch,
    Scale,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Constraints {
    #[serde(default)]
    pub horizontal: Constraint,
    #[serde(default)]
    pub vertical: Constraint,
}

impl Constraints {
    pub const STRETCH: Constraints = Constraints {
        horizontal: Constraint::Stretch,
        vertical: Constraint::Stretch,
    };
}

#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    /// Stable string handle used by scene files and selections.
    pub key: String,
    pub kind: NodeKind,
    pub name: String,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub locked: bool,
    pub fills: Option<Fills>,
    pub constraints: Constraints,
    pub constrain_proportions: bool,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
}

impl Node {
    pub fn new(key: impl Into<String>, kind: NodeKind, name: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            kind,
            name: name.into(),
            x: 0.0,
            y: 0.0,
            width: 100.0,
            height: 100.0,
            locked: false,
            fills: Some(Fills::new()),
            constraints: Constraints::default(),
            constrain_proportions: false,
            parent: None,
            children: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paint_uses_host_type_tags() {
        let paint: Paint =
            serde_json::from_str(r#"{"type":"IMAGE","imageHash":"abc"}"#).expect("image paint");
        assert_eq!(
            paint,
            Paint::Image {
                image_hash: Some("abc".to_string())
            }
        );
        assert!(paint.is_image());

        let solid: Paint = serde_json::from_str(r#"{"type":"SOLID"}"#).expect("solid paint");
        assert!(!solid.is_image());

        let gradient: Paint =
            serde_json::from_str(r#"{"type":"GRADIENT_LINEAR"}"#).expect("gradient paint");
        assert_eq!(gradient, Paint::GradientLinear {});
    }

    #[test]
    fn only_container_kinds_take_children() {
        assert!(NodeKind::Frame.supports_children());
        assert!(NodeKind::Section.supports_children());
        assert!(NodeKind::Group.supports_children());
        assert!(!NodeKind::Rectangle.supports_children());
        assert!(!NodeKind::Instance.supports_children());
    }
}
