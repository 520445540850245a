use crate::error::{CaptureError, Result};
use crate::node::{Capture, CapturedNode};
use crate::path::NodePath;

/// Hard nesting ceiling; trees deeper than this are rejected outright
pub const MAX_TREE_DEPTH: usize = 512;

/// Validate a capture before any downstream processing
///
/// The gate is all-or-nothing: a malformed tree is surfaced as a single
/// fatal error and no node creation begins. Depth and visibility pruning are
/// not validation concerns; they are handled (silently) by the converter.
pub fn validate(capture: &Capture) -> Result<()> {
    if capture.metadata.source_id.is_empty() {
        return Err(CaptureError::malformed("root", "metadata.sourceId is empty"));
    }
    let viewport = capture.metadata.viewport;
    if !viewport.width.is_finite() || !viewport.height.is_finite() {
        return Err(CaptureError::malformed(
            "root",
            "metadata.viewport dimensions must be finite",
        ));
    }
    validate_node(&capture.root, &NodePath::root(), 0)
}

fn validate_node(node: &CapturedNode, path: &NodePath, depth: usize) -> Result<()> {
    if depth > MAX_TREE_DEPTH {
        return Err(CaptureError::TooDeep {
            path: path.to_string(),
            max: MAX_TREE_DEPTH,
        });
    }

    if node.tag.is_empty() {
        return Err(CaptureError::malformed(path.to_string(), "tag is empty"));
    }

    let b = &node.bounds;
    for (name, value) in [("x", b.x), ("y", b.y), ("width", b.width), ("height", b.height)] {
        if !value.is_finite() {
            return Err(CaptureError::malformed(
                path.to_string(),
                format!("bounds.{name} is not finite"),
            ));
        }
    }
    if b.width < 0.0 || b.height < 0.0 {
        return Err(CaptureError::malformed(
            path.to_string(),
            format!("bounds must be non-negative (width={}, height={})", b.width, b.height),
        ));
    }

    for (index, child) in node.children.iter().enumerate() {
        validate_node(child, &path.child(index), depth + 1)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::{Bounds, CaptureMetadata, NodeKind, Viewport};

    fn capture_with_root(root: CapturedNode) -> Capture {
        Capture {
            metadata: CaptureMetadata {
                source_id: "https://example.com".to_string(),
                captured_at_ms: 0,
                viewport: Viewport {
                    width: 1280.0,
                    height: 800.0,
                },
            },
            root,
        }
    }

    #[test]
    fn accepts_well_formed_tree() {
        let root = CapturedNode::new(NodeKind::Frame, "body")
            .with_child(CapturedNode::new(NodeKind::Text, "p").with_text("hi"));
        assert!(validate(&capture_with_root(root)).is_ok());
    }

    #[test]
    fn rejects_negative_dimensions() {
        let root = CapturedNode::new(NodeKind::Frame, "body").with_child(
            CapturedNode::new(NodeKind::Frame, "div")
                .with_bounds(Bounds::new(0.0, 0.0, -4.0, 10.0)),
        );
        let err = validate(&capture_with_root(root)).unwrap_err();
        assert!(err.to_string().contains("root-0"));
    }

    #[test]
    fn rejects_non_finite_bounds() {
        let root = CapturedNode::new(NodeKind::Frame, "body")
            .with_bounds(Bounds::new(f64::NAN, 0.0, 1.0, 1.0));
        assert!(validate(&capture_with_root(root)).is_err());
    }

    #[test]
    fn rejects_empty_tag() {
        let root = CapturedNode::new(NodeKind::Frame, "");
        assert!(validate(&capture_with_root(root)).is_err());
    }

    #[test]
    fn rejects_empty_source_id() {
        let mut capture = capture_with_root(CapturedNode::new(NodeKind::Frame, "body"));
        capture.metadata.source_id.clear();
        assert!(validate(&capture).is_err());
    }

    #[test]
    fn rejects_depth_bomb() {
        let mut root = CapturedNode::new(NodeKind::Frame, "div");
        for _ in 0..=MAX_TREE_DEPTH {
            root = CapturedNode::new(NodeKind::Frame, "div").with_child(root);
        }
        let err = validate(&capture_with_root(root)).unwrap_err();
        assert!(matches!(err, CaptureError::TooDeep { .. }));
    }
}
