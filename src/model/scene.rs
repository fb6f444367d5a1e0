use std::collections::HashMap;
use std::path::PathBuf;

use slotmap::SlotMap;
use thiserror::Error;

use crate::model::node::{Constraints, Fills, Node, NodeId, NodeKind, Paint};

/// Smallest dimension the host accepts for a resize.
pub const MIN_DIMENSION: f64 = 0.01;

#[derive(Debug, Error)]
pub enum SceneError {
    #[error("node not found")]
    NodeNotFound,
    #[error("invalid size {width}x{height}")]
    InvalidSize { width: f64, height: f64 },
    #[error("{0} nodes cannot contain children")]
    NoChildren(&'static str),
    #[error("index {index} out of bounds for {len} children")]
    IndexOutOfBounds { index: usize, len: usize },
    #[error("cannot move a node inside itself")]
    CycleDetected,
    #[error("the page root cannot be moved or removed")]
    RootNode,
    #[error("duplicate node id: {0}")]
    DuplicateKey(String),
    #[error("selection references unknown node: {0}")]
    UnknownSelection(String),
    #[error("{path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("{path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Clone)]
struct Snapshot {
    nodes: SlotMap<NodeId, Node>,
    selection: Vec<NodeId>,
    next_key: u64,
}

#[derive(Debug, Clone)]
struct UndoStep {
    label: String,
    snapshot: Snapshot,
}

/// In-process host document: a single page of nodes plus the current selection.
///
/// Every mutating call bumps the revision. Mutations made inside
/// [`Document::transaction`] collapse into one undo step.
#[derive(Debug)]
pub struct Document {
    nodes: SlotMap<NodeId, Node>,
    keys: HashMap<String, NodeId>,
    root: NodeId,
    selection: Vec<NodeId>,
    selection_changed: bool,
    next_key: u64,
    revision: u64,
    undo: Vec<UndoStep>,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    pub fn new() -> Self {
        let mut nodes = SlotMap::with_key();
        let mut page = Node::new("page", NodeKind::Page, "Page 1");
        page.fills = None;
        let root = nodes.insert(page);

        let mut keys = HashMap::new();
        keys.insert("page".to_string(), root);

        Self {
            nodes,
            keys,
            root,
            selection: Vec::new(),
            selection_changed: false,
            next_key: 1,
            revision: 0,
            undo: Vec::new(),
        }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id)
    }

    pub fn node(&self, id: NodeId) -> Result<&Node, SceneError> {
        self.nodes.get(id).ok_or(SceneError::NodeNotFound)
    }

    pub fn find(&self, key: &str) -> Option<NodeId> {
        self.keys.get(key).copied()
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.nodes
            .get(id)
            .map(|node| node.children.as_slice())
            .unwrap_or(&[])
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Adds a node as the last child of `parent`. An empty key is replaced with
    /// a generated one.
    pub fn add_node(&mut self, parent: NodeId, mut node: Node) -> Result<NodeId, SceneError> {
        let parent_kind = self.node(parent)?.kind;
        if !parent_kind.supports_children() {
            return Err(SceneError::NoChildren(parent_kind.label()));
        }

        if node.key.is_empty() {
            node.key = self.generate_key();
        } else if self.keys.contains_key(&node.key) {
            return Err(SceneError::DuplicateKey(node.key));
        }

        node.parent = Some(parent);
        node.children.clear();
        let key = node.key.clone();
        let id = self.nodes.insert(node);
        self.keys.insert(key, id);
        if let Some(parent) = self.nodes.get_mut(parent) {
            parent.children.push(id);
        }
        self.touch();
        Ok(id)
    }

    /// Creates an empty frame on the page, the way the host does: 100x100
    /// with a white solid fill.
    pub fn create_frame(&mut self) -> NodeId {
        let mut frame = Node::new(self.generate_key(), NodeKind::Frame, "Frame");
        frame.fills = Some(Fills::from_vec(vec![Paint::Solid {
            color: "#FFFFFF".to_string(),
        }]));
        frame.parent = Some(self.root);

        let key = frame.key.clone();
        let id = self.nodes.insert(frame);
        self.keys.insert(key, id);
        if let Some(page) = self.nodes.get_mut(self.root) {
            page.children.push(id);
        }
        self.touch();
        id
    }

    pub fn set_name(&mut self, id: NodeId, name: impl Into<String>) -> Result<(), SceneError> {
        self.node_mut(id)?.name = name.into();
        self.touch();
        Ok(())
    }

    pub fn resize(&mut self, id: NodeId, width: f64, height: f64) -> Result<(), SceneError> {
        if !width.is_finite() || !height.is_finite() || width < MIN_DIMENSION || height < MIN_DIMENSION
        {
            return Err(SceneError::InvalidSize { width, height });
        }

        let node = self.node_mut(id)?;
        node.width = width;
        node.height = height;
        self.touch();
        Ok(())
    }

    pub fn set_position(&mut self, id: NodeId, x: f64, y: f64) -> Result<(), SceneError> {
        let node = self.node_mut(id)?;
        node.x = x;
        node.y = y;
        self.touch();
        Ok(())
    }

    pub fn set_fills(&mut self, id: NodeId, fills: Fills) -> Result<(), SceneError> {
        self.node_mut(id)?.fills = Some(fills);
        self.touch();
        Ok(())
    }

    pub fn set_constraints(
        &mut self,
        id: NodeId,
        constraints: Constraints,
    ) -> Result<(), SceneError> {
        self.node_mut(id)?.constraints = constraints;
        self.touch();
        Ok(())
    }

    pub fn set_constrain_proportions(&mut self, id: NodeId, on: bool) -> Result<(), SceneError> {
        self.node_mut(id)?.constrain_proportions = on;
        self.touch();
        Ok(())
    }

    /// Parent of `id` and its index among the parent's children.
    pub fn position_in_parent(&self, id: NodeId) -> Option<(NodeId, usize)> {
        let parent = self.nodes.get(id)?.parent?;
        let index = self
            .children(parent)
            .iter()
            .position(|child| *child == id)?;
        Some((parent, index))
    }

    /// Moves `child` into `parent` at `index`. The index is interpreted after
    /// `child` has been detached from its current parent.
    pub fn insert_child(
        &mut self,
        parent: NodeId,
        index: usize,
        child: NodeId,
    ) -> Result<(), SceneError> {
        let parent_kind = self.node(parent)?.kind;
        let current_parent = self.node(child)?.parent;
        if child == self.root {
            return Err(SceneError::RootNode);
        }
        if !parent_kind.supports_children() {
            return Err(SceneError::NoChildren(parent_kind.label()));
        }
        if self.is_ancestor_or_self(child, parent) {
            return Err(SceneError::CycleDetected);
        }

        let mut len = self.children(parent).len();
        if current_parent == Some(parent) {
            len -= 1;
        }
        if index > len {
            return Err(SceneError::IndexOutOfBounds { index, len });
        }

        self.detach(child);
        if let Some(node) = self.nodes.get_mut(parent) {
            node.children.insert(index, child);
        }
        if let Some(node) = self.nodes.get_mut(child) {
            node.parent = Some(parent);
        }
        self.touch();
        Ok(())
    }

    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), SceneError> {
        let mut len = self.node(parent)?.children.len();
        if self.node(child)?.parent == Some(parent) {
            len = len.saturating_sub(1);
        }
        self.insert_child(parent, len, child)
    }

    /// Removes `id` and its whole subtree.
    pub fn remove(&mut self, id: NodeId) -> Result<(), SceneError> {
        if id == self.root {
            return Err(SceneError::RootNode);
        }
        self.node(id)?;
        self.detach(id);

        let mut pending = vec![id];
        while let Some(next) = pending.pop() {
            if let Some(node) = self.nodes.remove(next) {
                self.keys.remove(&node.key);
                pending.extend(node.children);
            }
        }

        let before = self.selection.len();
        self.selection.retain(|selected| self.nodes.contains_key(*selected));
        if self.selection.len() != before {
            self.selection_changed = true;
        }
        self.touch();
        Ok(())
    }

    pub fn selection(&self) -> &[NodeId] {
        &self.selection
    }

    /// Replaces the selection. Duplicates and stale ids are dropped.
    pub fn set_selection(&mut self, ids: impl IntoIterator<Item = NodeId>) {
        let mut next: Vec<NodeId> = Vec::new();
        for id in ids {
            if id != self.root && self.nodes.contains_key(id) && !next.contains(&id) {
                next.push(id);
            }
        }

        if next != self.selection {
            self.selection = next;
            self.selection_changed = true;
        }
    }

    /// Returns whether the selection changed since the last call.
    pub fn take_selection_changed(&mut self) -> bool {
        std::mem::take(&mut self.selection_changed)
    }

    /// Runs `f` as one undoable step labelled `label`. Nothing is recorded when
    /// the document ends up as it started, even if `f` mutated it on the way.
    pub fn transaction<T>(&mut self, label: &str, f: impl FnOnce(&mut Self) -> T) -> T {
        let snapshot = Snapshot {
            nodes: self.nodes.clone(),
            selection: self.selection.clone(),
            next_key: self.next_key,
        };
        let revision = self.revision;

        let result = f(self);

        if self.revision != revision && !self.matches(&snapshot) {
            tracing::debug!(label, "recorded undo step");
            self.undo.push(UndoStep {
                label: label.to_string(),
                snapshot,
            });
        }
        result
    }

    /// Reverts the most recent transaction and returns its label.
    #[allow(dead_code)] // host-side undo; the panel has no undo command
    pub fn undo(&mut self) -> Option<String> {
        let step = self.undo.pop()?;
        let Snapshot {
            nodes,
            selection,
            next_key,
        } = step.snapshot;

        self.nodes = nodes;
        self.next_key = next_key;
        self.keys = self
            .nodes
            .iter()
            .map(|(id, node)| (node.key.clone(), id))
            .collect();
        if self.selection != selection {
            self.selection = selection;
            self.selection_changed = true;
        }
        self.touch();
        Some(step.label)
    }

    pub fn undo_depth(&self) -> usize {
        self.undo.len()
    }

    fn matches(&self, snapshot: &Snapshot) -> bool {
        self.selection == snapshot.selection
            && self.nodes.len() == snapshot.nodes.len()
            && self
                .nodes
                .iter()
                .all(|(id, node)| snapshot.nodes.get(id) == Some(node))
    }

    fn node_mut(&mut self, id: NodeId) -> Result<&mut Node, SceneError> {
        self.nodes.get_mut(id).ok_or(SceneError::NodeNotFound)
    }

    fn detach(&mut self, id: NodeId) {
        let Some(parent) = self.nodes.get_mut(id).and_then(|node| node.parent.take()) else {
            return;
        };
        if let Some(parent) = self.nodes.get_mut(parent) {
            parent.children.retain(|child| *child != id);
        }
    }

    fn is_ancestor_or_self(&self, ancestor: NodeId, mut id: NodeId) -> bool {
        loop {
            if id == ancestor {
                return true;
            }
            match self.nodes.get(id).and_then(|node| node.parent) {
                Some(parent) => id = parent,
                None => return false,
            }
        }
    }

    fn generate_key(&mut self) -> String {
        loop {
            let key = format!("node-{}", self.next_key);
            self.next_key += 1;
            if !self.keys.contains_key(&key) {
                return key;
            }
        }
    }

    fn touch(&mut self) {
        self.revision += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rect(key: &str) -> Node {
        Node::new(key, NodeKind::Rectangle, key)
    }

    #[test]
    fn create_frame_lands_on_page_with_default_fill() {
        let mut doc = Document::new();
        let frame = doc.create_frame();

        let node = doc.node(frame).unwrap();
        assert_eq!(node.kind, NodeKind::Frame);
        assert_eq!(node.parent, Some(doc.root()));
        assert_eq!(node.fills.as_ref().map(|f| f.len()), Some(1));
        assert_eq!(doc.children(doc.root()), &[frame]);
    }

    #[test]
    fn resize_rejects_degenerate_sizes() {
        let mut doc = Document::new();
        let frame = doc.create_frame();

        assert!(matches!(
            doc.resize(frame, 0.0, 10.0),
            Err(SceneError::InvalidSize { .. })
        ));
        assert!(matches!(
            doc.resize(frame, f64::NAN, 10.0),
            Err(SceneError::InvalidSize { .. })
        ));
        doc.resize(frame, 40.0, 30.0).unwrap();
        assert_eq!(doc.node(frame).unwrap().width, 40.0);
    }

    #[test]
    fn insert_child_preserves_slot() {
        let mut doc = Document::new();
        let root = doc.root();
        let a = doc.add_node(root, rect("a")).unwrap();
        let b = doc.add_node(root, rect("b")).unwrap();
        let c = doc.add_node(root, rect("c")).unwrap();

        let frame = doc.create_frame();
        assert_eq!(doc.position_in_parent(b), Some((root, 1)));
        doc.insert_child(root, 1, frame).unwrap();
        doc.append_child(frame, b).unwrap();

        assert_eq!(doc.children(root), &[a, frame, c]);
        assert_eq!(doc.children(frame), &[b]);
        assert_eq!(doc.node(b).unwrap().parent, Some(frame));
    }

    #[test]
    fn insert_child_rejects_bad_targets() {
        let mut doc = Document::new();
        let root = doc.root();
        let a = doc.add_node(root, rect("a")).unwrap();
        let frame = doc.create_frame();

        assert!(matches!(
            doc.append_child(a, frame),
            Err(SceneError::NoChildren("RECTANGLE"))
        ));
        assert!(matches!(
            doc.insert_child(root, 5, frame),
            Err(SceneError::IndexOutOfBounds { index: 5, len: 1 })
        ));
        doc.append_child(frame, a).unwrap();
        let inner = doc.add_node(frame, Node::new("", NodeKind::Group, "g")).unwrap();
        assert!(matches!(
            doc.append_child(inner, frame),
            Err(SceneError::CycleDetected)
        ));
        assert!(matches!(
            doc.append_child(frame, root),
            Err(SceneError::RootNode)
        ));
    }

    #[test]
    fn duplicate_keys_are_rejected() {
        let mut doc = Document::new();
        let root = doc.root();
        doc.add_node(root, rect("a")).unwrap();
        assert!(matches!(
            doc.add_node(root, rect("a")),
            Err(SceneError::DuplicateKey(key)) if key == "a"
        ));
    }

    #[test]
    fn selection_dedupes_and_flags_changes() {
        let mut doc = Document::new();
        let root = doc.root();
        let a = doc.add_node(root, rect("a")).unwrap();
        let b = doc.add_node(root, rect("b")).unwrap();

        doc.set_selection([b, a, b, root]);
        assert_eq!(doc.selection(), &[b, a]);
        assert!(doc.take_selection_changed());
        assert!(!doc.take_selection_changed());

        doc.set_selection([b, a]);
        assert!(!doc.take_selection_changed());

        doc.remove(a).unwrap();
        assert_eq!(doc.selection(), &[b]);
        assert!(doc.take_selection_changed());
        assert_eq!(doc.find("a"), None);
    }

    #[test]
    fn transaction_records_one_undo_step() {
        let mut doc = Document::new();
        let root = doc.root();
        let a = doc.add_node(root, rect("a")).unwrap();
        doc.set_selection([a]);

        doc.transaction("wrap", |doc| {
            let frame = doc.create_frame();
            doc.resize(frame, 10.0, 10.0).unwrap();
            doc.append_child(frame, a).unwrap();
            doc.set_selection([frame]);
        });
        doc.transaction("noop", |_| {});
        doc.transaction("round trip", |doc| {
            let frame = doc.create_frame();
            doc.set_name(frame, "scratch").unwrap();
            doc.remove(frame).unwrap();
        });

        assert_eq!(doc.undo_depth(), 1);
        assert_eq!(doc.len(), 3);

        assert_eq!(doc.undo().as_deref(), Some("wrap"));
        assert_eq!(doc.len(), 2);
        assert_eq!(doc.children(root), &[a]);
        assert_eq!(doc.selection(), &[a]);
        assert_eq!(doc.find("a"), Some(a));
        assert_eq!(doc.undo(), None);
    }
}
