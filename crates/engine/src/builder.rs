use crate::error::BuilderError;
use async_trait::async_trait;
use domloom_capture::{Bounds, CapturedNode, NodeKind, NodePath, StyleDigest};
use domloom_fingerprint::Fingerprint;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque handle to a node in the destination document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub u64);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// The injected node-creation capability
///
/// The converter and reconciler depend on this trait instead of any concrete
/// platform SDK; the surrounding application supplies the implementation.
/// Every method is an asynchronous suspension point (resource loading, IPC);
/// the engine awaits them in walk order, never concurrently for two nodes of
/// the same tree.
#[async_trait]
pub trait NodeBuilder: Send {
    /// Create a node of the given kind; the node starts detached
    async fn create_node(
        &mut self,
        kind: NodeKind,
        name: &str,
        bounds: Bounds,
        style: &StyleDigest,
    ) -> std::result::Result<NodeId, BuilderError>;

    /// Create a lightweight reference to an already-materialized component
    async fn create_component_instance(
        &mut self,
        source: &CapturedNode,
        component: NodeId,
    ) -> std::result::Result<NodeId, BuilderError>;

    /// Append `child` as the last child of `parent`
    async fn append_child(
        &mut self,
        parent: NodeId,
        child: NodeId,
    ) -> std::result::Result<(), BuilderError>;

    /// Stamp reconciliation metadata onto a node
    async fn tag_with_path(
        &mut self,
        node: NodeId,
        path: &NodePath,
        fingerprint: Fingerprint,
    ) -> std::result::Result<(), BuilderError>;

    /// Read back stamped metadata; `None` for untagged nodes
    async fn read_path_and_fingerprint(&self, node: NodeId) -> Option<(NodePath, Fingerprint)>;

    /// Find a previously produced tree for a source identifier
    async fn locate_existing_tree(&self, source_id: &str) -> Option<NodeId>;

    /// Replace a node's text content
    ///
    /// Implementations must guarantee platform preconditions (e.g. font
    /// loading) before mutating displayed content and report failure as
    /// [`BuilderError::ResourcePrecondition`].
    async fn update_text(
        &mut self,
        node: NodeId,
        text: &str,
    ) -> std::result::Result<(), BuilderError>;

    /// Replace a node's geometry
    async fn update_geometry(
        &mut self,
        node: NodeId,
        bounds: Bounds,
    ) -> std::result::Result<(), BuilderError>;

    /// Delete a node and its subtree
    async fn remove_node(&mut self, node: NodeId) -> std::result::Result<(), BuilderError>;

    /// Current children of a node, in document order
    async fn children(&self, node: NodeId) -> Vec<NodeId>;
}
