use crate::builder::{NodeBuilder, NodeId};
use crate::convert::floor_size;
use crate::error::BuilderError;
use async_trait::async_trait;
use domloom_capture::{Bounds, CapturedNode, NodeKind, NodePath, StyleDigest};
use domloom_fingerprint::Fingerprint;
use serde::Serialize;
use std::collections::HashMap;

/// One node in the in-memory document arena
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentNode {
    pub id: NodeId,
    pub kind: NodeKind,
    pub name: String,
    pub bounds: Bounds,
    #[serde(skip_serializing_if = "style_is_empty")]
    pub style: StyleDigest,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    /// Reconciliation metadata, absent on component-instance internals
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<NodePath>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fingerprint: Option<Fingerprint>,
    /// For instances: the template this node references
    #[serde(skip_serializing_if = "Option::is_none")]
    pub component_ref: Option<NodeId>,
    #[serde(skip)]
    pub children: Vec<NodeId>,
    #[serde(skip)]
    removed: bool,
}

fn style_is_empty(style: &StyleDigest) -> bool {
    style == &StyleDigest::default()
}

/// In-memory [`NodeBuilder`] backed by an arena of [`DocumentNode`]s
///
/// Serves double duty: the fake builder for engine tests and the real
/// backend for the CLI's JSON document output. Text preconditions can be
/// made to fail on demand to exercise the recovery path.
#[derive(Default)]
pub struct MemoryBuilder {
    nodes: Vec<DocumentNode>,
    roots: HashMap<String, NodeId>,
    /// When set, `update_text` fails for text containing this marker
    fail_text_containing: Option<String>,
}

impl MemoryBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a materialized tree as the existing output for a source
    pub fn register_tree(&mut self, source_id: impl Into<String>, root: NodeId) {
        self.roots.insert(source_id.into(), root);
    }

    /// Make `update_text` fail with a resource-precondition error whenever
    /// the new text contains `marker`
    pub fn fail_text_containing(&mut self, marker: impl Into<String>) {
        self.fail_text_containing = Some(marker.into());
    }

    #[must_use]
    pub fn get(&self, id: NodeId) -> Option<&DocumentNode> {
        self.nodes.get(id.0 as usize).filter(|n| !n.removed)
    }

    /// Number of live nodes in the arena
    #[must_use]
    pub fn live_count(&self) -> usize {
        self.nodes.iter().filter(|n| !n.removed).count()
    }

    /// Serialize the subtree rooted at `id` as a nested JSON value
    #[must_use]
    pub fn to_json(&self, id: NodeId) -> serde_json::Value {
        let Some(node) = self.get(id) else {
            return serde_json::Value::Null;
        };
        let mut value = serde_json::to_value(node).unwrap_or(serde_json::Value::Null);
        let children: Vec<serde_json::Value> =
            node.children.iter().map(|&child| self.to_json(child)).collect();
        if let serde_json::Value::Object(map) = &mut value {
            map.insert("children".to_string(), serde_json::Value::Array(children));
        }
        value
    }

    fn alloc(&mut self, node: DocumentNode) -> NodeId {
        let id = node.id;
        self.nodes.push(node);
        id
    }

    fn get_mut(&mut self, id: NodeId) -> std::result::Result<&mut DocumentNode, BuilderError> {
        self.nodes
            .get_mut(id.0 as usize)
            .filter(|n| !n.removed)
            .ok_or_else(|| BuilderError::Refused(format!("no such node {id}")))
    }

    fn next_id(&self) -> NodeId {
        NodeId(self.nodes.len() as u64)
    }
}

#[async_trait]
impl NodeBuilder for MemoryBuilder {
    async fn create_node(
        &mut self,
        kind: NodeKind,
        name: &str,
        bounds: Bounds,
        style: &StyleDigest,
    ) -> std::result::Result<NodeId, BuilderError> {
        let id = self.next_id();
        Ok(self.alloc(DocumentNode {
            id,
            kind,
            name: name.to_string(),
            bounds,
            style: style.clone(),
            text: None,
            path: None,
            fingerprint: None,
            component_ref: None,
            children: Vec::new(),
            removed: false,
        }))
    }

    async fn create_component_instance(
        &mut self,
        source: &CapturedNode,
        component: NodeId,
    ) -> std::result::Result<NodeId, BuilderError> {
        let template_name = self
            .get(component)
            .map(|t| t.name.clone())
            .ok_or_else(|| BuilderError::Refused(format!("no such component {component}")))?;
        let id = self.next_id();
        Ok(self.alloc(DocumentNode {
            id,
            kind: source.kind,
            name: template_name,
            bounds: floor_size(source.bounds),
            style: StyleDigest::default(),
            text: None,
            path: None,
            fingerprint: None,
            component_ref: Some(component),
            children: Vec::new(),
            removed: false,
        }))
    }

    async fn append_child(
        &mut self,
        parent: NodeId,
        child: NodeId,
    ) -> std::result::Result<(), BuilderError> {
        self.get_mut(child)?;
        let parent_node = self.get_mut(parent)?;
        parent_node.children.push(child);
        Ok(())
    }

    async fn tag_with_path(
        &mut self,
        node: NodeId,
        path: &NodePath,
        fingerprint: Fingerprint,
    ) -> std::result::Result<(), BuilderError> {
        let node = self.get_mut(node)?;
        node.path = Some(path.clone());
        node.fingerprint = Some(fingerprint);
        Ok(())
    }

    async fn read_path_and_fingerprint(&self, node: NodeId) -> Option<(NodePath, Fingerprint)> {
        let node = self.get(node)?;
        Some((node.path.clone()?, node.fingerprint?))
    }

    async fn locate_existing_tree(&self, source_id: &str) -> Option<NodeId> {
        self.roots.get(source_id).copied()
    }

    async fn update_text(
        &mut self,
        node: NodeId,
        text: &str,
    ) -> std::result::Result<(), BuilderError> {
        if let Some(marker) = &self.fail_text_containing {
            if text.contains(marker.as_str()) {
                return Err(BuilderError::ResourcePrecondition(format!(
                    "font unavailable for text containing {marker:?}"
                )));
            }
        }
        let node = self.get_mut(node)?;
        node.text = Some(text.to_string());
        Ok(())
    }

    async fn update_geometry(
        &mut self,
        node: NodeId,
        bounds: Bounds,
    ) -> std::result::Result<(), BuilderError> {
        let node = self.get_mut(node)?;
        node.bounds = bounds;
        Ok(())
    }

    async fn remove_node(&mut self, node: NodeId) -> std::result::Result<(), BuilderError> {
        // Detach from any parent, then mark the subtree removed.
        for candidate in &mut self.nodes {
            candidate.children.retain(|&child| child != node);
        }
        let mut pending = vec![node];
        while let Some(id) = pending.pop() {
            let doc = self.get_mut(id)?;
            doc.removed = true;
            pending.extend(doc.children.iter().copied());
        }
        Ok(())
    }

    async fn children(&self, node: NodeId) -> Vec<NodeId> {
        self.get(node).map(|n| n.children.clone()).unwrap_or_default()
    }
}
