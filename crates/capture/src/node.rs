use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Kind of a captured page element
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    /// Container element (div, section, nav, ...)
    Frame,
    /// Text-bearing element
    Text,
    /// Raster image
    Image,
    /// Inline vector graphic
    Svg,
    /// Form control
    Input,
    /// Video element
    Video,
    /// Anything the capture stage could not classify
    #[serde(other)]
    Unknown,
}

impl NodeKind {
    /// Get kind name as string
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            NodeKind::Frame => "frame",
            NodeKind::Text => "text",
            NodeKind::Image => "image",
            NodeKind::Svg => "svg",
            NodeKind::Input => "input",
            NodeKind::Video => "video",
            NodeKind::Unknown => "unknown",
        }
    }
}

/// Layout rectangle of a captured element, in capture-viewport pixels
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Bounds {
    #[must_use]
    pub const fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Rounded `"WxH"` form used by fingerprinting
    #[must_use]
    pub fn size_key(&self) -> String {
        format!("{}x{}", self.width.round() as i64, self.height.round() as i64)
    }
}

/// Subset of computed style relevant to rendering
///
/// Values are kept as the capture stage serialized them (CSS color strings,
/// `"16px"` font sizes); the core never parses them, only compares them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StyleDigest {
    /// Background color, if not transparent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background_color: Option<String>,

    /// Foreground (text) color
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,

    /// Font size as captured
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_size: Option<String>,
}

/// Immutable snapshot of one page element
///
/// Nodes own their children; a capture is a rooted ordered tree with no
/// sharing and no cycles. Child order is significant and stable across
/// captures of an unchanged page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CapturedNode {
    pub kind: NodeKind,

    /// Source element name (`div`, `li`, ...)
    pub tag: String,

    pub bounds: Bounds,

    #[serde(default)]
    pub style: StyleDigest,

    /// Text content, present only for text-bearing nodes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,

    #[serde(default = "default_visible")]
    pub visible: bool,

    /// Precomputed by the capture stage when three-or-more-sibling
    /// repetition is structurally plausible; absence means "not a candidate".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub structural_hash: Option<String>,

    /// Class names, used only for component naming
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub class_names: Vec<String>,

    /// ARIA-style role, used only for component naming
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub semantic_role: Option<String>,

    /// Naming hints such as `data-component`
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub named_attributes: BTreeMap<String, String>,

    #[serde(default)]
    pub children: Vec<CapturedNode>,
}

const fn default_visible() -> bool {
    true
}

impl CapturedNode {
    /// Create a minimal node of the given kind and tag
    #[must_use]
    pub fn new(kind: NodeKind, tag: impl Into<String>) -> Self {
        Self {
            kind,
            tag: tag.into(),
            bounds: Bounds::default(),
            style: StyleDigest::default(),
            text: None,
            visible: true,
            structural_hash: None,
            class_names: Vec::new(),
            semantic_role: None,
            named_attributes: BTreeMap::new(),
            children: Vec::new(),
        }
    }

    /// Builder: set bounds
    #[must_use]
    pub const fn with_bounds(mut self, bounds: Bounds) -> Self {
        self.bounds = bounds;
        self
    }

    /// Builder: set text content
    #[must_use]
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    /// Builder: set structural hash
    #[must_use]
    pub fn with_structural_hash(mut self, hash: impl Into<String>) -> Self {
        self.structural_hash = Some(hash.into());
        self
    }

    /// Builder: append a child
    #[must_use]
    pub fn with_child(mut self, child: CapturedNode) -> Self {
        self.children.push(child);
        self
    }

    /// Whether this node may root a component: a frame with children
    #[must_use]
    pub fn is_component_candidate(&self) -> bool {
        self.kind == NodeKind::Frame
            && !self.children.is_empty()
            && self
                .structural_hash
                .as_deref()
                .is_some_and(|h| !h.is_empty())
    }
}

/// Intended output canvas size, from the capture viewport
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
}

/// Top-level metadata accompanying a captured tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CaptureMetadata {
    /// Stable identifier of the captured source (page URL or equivalent)
    pub source_id: String,

    /// Capture timestamp, unix milliseconds
    pub captured_at_ms: u64,

    pub viewport: Viewport,
}

/// Transport envelope: metadata plus the root node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Capture {
    pub metadata: CaptureMetadata,
    pub root: CapturedNode,
}

impl Capture {
    /// Parse a capture from its JSON transport encoding
    pub fn from_json_str(raw: &str) -> Result<Self> {
        Ok(serde_json::from_str(raw)?)
    }

    /// Read and parse a capture file
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json_str(&raw)
    }
}

/// Count every node in the tree, including the root
#[must_use]
pub fn count_nodes(node: &CapturedNode) -> usize {
    1 + node.children.iter().map(count_nodes).sum::<usize>()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn count_includes_root_and_descendants() {
        let tree = CapturedNode::new(NodeKind::Frame, "div")
            .with_child(
                CapturedNode::new(NodeKind::Frame, "ul")
                    .with_child(CapturedNode::new(NodeKind::Text, "li")),
            )
            .with_child(CapturedNode::new(NodeKind::Text, "p"));
        assert_eq!(count_nodes(&tree), 4);
    }

    #[test]
    fn size_key_rounds_to_integers() {
        let bounds = Bounds::new(0.0, 0.0, 99.6, 40.2);
        assert_eq!(bounds.size_key(), "100x40");
    }

    #[test]
    fn unknown_kind_deserializes_from_unrecognized_value() {
        let json = r#"{"kind":"canvas","tag":"canvas","bounds":{"x":0,"y":0,"width":1,"height":1}}"#;
        let node: CapturedNode = serde_json::from_str(json).unwrap();
        assert_eq!(node.kind, NodeKind::Unknown);
        assert!(node.visible);
    }

    #[test]
    fn component_candidate_requires_frame_hash_and_children() {
        let leaf = CapturedNode::new(NodeKind::Frame, "div").with_structural_hash("H");
        assert!(!leaf.is_component_candidate());

        let text = CapturedNode::new(NodeKind::Text, "span")
            .with_structural_hash("H")
            .with_child(CapturedNode::new(NodeKind::Text, "b"));
        assert!(!text.is_component_candidate());

        let frame = CapturedNode::new(NodeKind::Frame, "div")
            .with_structural_hash("H")
            .with_child(CapturedNode::new(NodeKind::Text, "span"));
        assert!(frame.is_component_candidate());
    }

    #[test]
    fn undecodable_json_surfaces_a_decode_error() {
        let err = Capture::from_json_str("{\"not\": \"a capture\"}").unwrap_err();
        assert!(matches!(err, crate::CaptureError::Decode(_)));
    }

    #[test]
    fn missing_file_surfaces_an_io_error() {
        let err = Capture::from_json_file(Path::new("/no/such/capture.json")).unwrap_err();
        assert!(matches!(err, crate::CaptureError::Io(_)));
    }

    #[test]
    fn capture_round_trips_through_json() {
        let capture = Capture {
            metadata: CaptureMetadata {
                source_id: "https://example.com".to_string(),
                captured_at_ms: 1_700_000_000_000,
                viewport: Viewport {
                    width: 1280.0,
                    height: 800.0,
                },
            },
            root: CapturedNode::new(NodeKind::Frame, "body")
                .with_child(CapturedNode::new(NodeKind::Text, "h1").with_text("Hello")),
        };
        let json = serde_json::to_string(&capture).unwrap();
        let back: Capture = serde_json::from_str(&json).unwrap();
        assert_eq!(capture, back);
    }
}
