use std::collections::HashSet;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::model::node::{Constraints, Fills, Node, NodeId, NodeKind};
use crate::model::scene::{Document, SceneError};

/// On-disk JSON form of a page.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SceneFile {
    #[serde(default)]
    pub selection: Vec<String>,
    #[serde(default)]
    pub children: Vec<NodeRecord>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(rename = "type")]
    pub kind: NodeKind,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub x: f64,
    #[serde(default)]
    pub y: f64,
    #[serde(default = "default_size")]
    pub width: f64,
    #[serde(default = "default_size")]
    pub height: f64,
    #[serde(default, skip_serializing_if = "is_false")]
    pub locked: bool,
    #[serde(default = "default_fills")]
    pub fills: Option<Fills>,
    #[serde(default)]
    pub constraints: Constraints,
    #[serde(default, skip_serializing_if = "is_false")]
    pub constrain_proportions: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<NodeRecord>,
}

fn default_size() -> f64 {
    100.0
}

fn default_fills() -> Option<Fills> {
    Some(Fills::new())
}

fn is_false(value: &bool) -> bool {
    !*value
}

impl Document {
    pub fn load(path: &Path) -> Result<Self, SceneError> {
        let raw = fs::read_to_string(path).map_err(|source| SceneError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let scene: SceneFile = serde_json::from_str(&raw).map_err(|source| SceneError::Json {
            path: path.to_path_buf(),
            source,
        })?;

        let doc = Self::from_scene(&scene)?;
        tracing::info!(
            "loaded {} nodes from {} ({} selected)",
            doc.len().saturating_sub(1),
            path.display(),
            doc.selection().len()
        );
        Ok(doc)
    }

    pub fn save(&self, path: &Path) -> Result<(), SceneError> {
        let json = serde_json::to_string_pretty(&self.to_scene()).map_err(|source| {
            SceneError::Json {
                path: path.to_path_buf(),
                source,
            }
        })?;
        fs::write(path, json).map_err(|source| SceneError::Io {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn from_scene(scene: &SceneFile) -> Result<Self, SceneError> {
        let mut doc = Document::new();
        let root = doc.root();

        // Generated keys must not take an id claimed later in the file.
        let mut taken = HashSet::new();
        let mut walk: Vec<&NodeRecord> = scene.children.iter().collect();
        while let Some(record) = walk.pop() {
            if let Some(id) = record.id.as_deref() {
                taken.insert(id.to_string());
            }
            walk.extend(record.children.iter());
        }

        let mut counter = 0u64;
        let mut pending: Vec<(NodeId, &NodeRecord)> =
            scene.children.iter().rev().map(|record| (root, record)).collect();
        while let Some((parent, record)) = pending.pop() {
            let mut node = record.to_node();
            if node.key.is_empty() {
                node.key = loop {
                    counter += 1;
                    let key = format!("node-{counter}");
                    if !taken.contains(&key) && doc.find(&key).is_none() {
                        break key;
                    }
                };
            }
            let id = doc.add_node(parent, node)?;
            pending.extend(record.children.iter().rev().map(|child| (id, child)));
        }

        let mut selection = Vec::with_capacity(scene.selection.len());
        for key in &scene.selection {
            let id = doc
                .find(key)
                .ok_or_else(|| SceneError::UnknownSelection(key.clone()))?;
            selection.push(id);
        }
        doc.set_selection(selection);
        doc.take_selection_changed();

        Ok(doc)
    }

    pub fn to_scene(&self) -> SceneFile {
        let children = self
            .children(self.root())
            .iter()
            .filter_map(|id| self.record(*id))
            .collect();
        let selection = self
            .selection()
            .iter()
            .filter_map(|id| self.get(*id).map(|node| node.key.clone()))
            .collect();

        SceneFile {
            selection,
            children,
        }
    }

    fn record(&self, id: NodeId) -> Option<NodeRecord> {
        let node = self.get(id)?;
        Some(NodeRecord {
            id: Some(node.key.clone()),
            kind: node.kind,
            name: node.name.clone(),
            x: node.x,
            y: node.y,
            width: node.width,
            height: node.height,
            locked: node.locked,
            fills: node.fills.clone(),
            constraints: node.constraints,
            constrain_proportions: node.constrain_proportions,
            children: node
                .children
                .iter()
                .filter_map(|child| self.record(*child))
                .collect(),
        })
    }
}

impl NodeRecord {
    fn to_node(&self) -> Node {
        let mut node = Node::new(self.id.clone().unwrap_or_default(), self.kind, &self.name);
        node.x = self.x;
        node.y = self.y;
        node.width = self.width;
        node.height = self.height;
        node.locked = self.locked;
        node.fills = self.fills.clone();
        node.constraints = self.constraints;
        node.constrain_proportions = self.constrain_proportions;
        node
    }
}
