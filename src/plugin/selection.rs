use crate::model::node::{Node, NodeId, NodeKind};
use crate::model::scene::Document;

/// A rectangle carrying at least one image fill.
#[derive(Debug, Clone, Copy)]
pub struct ImageNode<'a> {
    pub id: NodeId,
    pub node: &'a Node,
}

impl<'a> ImageNode<'a> {
    /// Narrows a scene node to an image node.
    pub fn narrow(id: NodeId, node: &'a Node) -> Option<Self> {
        if node.kind != NodeKind::Rectangle {
            return None;
        }
        let fills = node.fills.as_ref()?;
        fills
            .iter()
            .any(|paint| paint.is_image())
            .then_some(Self { id, node })
    }
}

/// Summary reported to the panel whenever the selection changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SelectionSummary {
    pub count: usize,
    pub has_images: bool,
}

/// Image nodes among `ids`, in their original order. Unknown ids are skipped.
pub fn filter_image_nodes<'a>(doc: &'a Document, ids: &[NodeId]) -> Vec<ImageNode<'a>> {
    ids.iter()
        .filter_map(|id| ImageNode::narrow(*id, doc.get(*id)?))
        .collect()
}

pub fn selection_summary(doc: &Document) -> SelectionSummary {
    let count = filter_image_nodes(doc, doc.selection()).len();
    SelectionSummary {
        count,
        has_images: count > 0,
    }
}
