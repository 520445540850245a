use crate::hash::{fingerprint, Fingerprint};
use domloom_capture::{CapturedNode, NodePath};
use std::collections::BTreeMap;

/// One entry of a path→fingerprint map, pointing back at the source node
#[derive(Debug, Clone, Copy)]
pub struct PathEntry<'a> {
    pub fingerprint: Fingerprint,
    pub node: &'a CapturedNode,
}

/// Complete path→fingerprint map for one captured tree
pub type FingerprintMap<'a> = BTreeMap<NodePath, PathEntry<'a>>;

/// Build the path→fingerprint map for a whole tree
///
/// Pre-order walk; every node receives exactly one entry regardless of kind
/// or visibility, so `map.len() == count_nodes(root)` always holds. Pure
/// function; safe to call concurrently on different trees.
#[must_use]
pub fn build_fingerprint_map<'a>(root: &'a CapturedNode, prefix: NodePath) -> FingerprintMap<'a> {
    let mut map = BTreeMap::new();
    insert_subtree(root, prefix, &mut map);
    map
}

fn insert_subtree<'a>(node: &'a CapturedNode, path: NodePath, map: &mut FingerprintMap<'a>) {
    map.insert(
        path.clone(),
        PathEntry {
            fingerprint: fingerprint(node),
            node,
        },
    );
    for (index, child) in node.children.iter().enumerate() {
        insert_subtree(child, path.child(index), map);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domloom_capture::{count_nodes, NodeKind};
    use pretty_assertions::assert_eq;

    fn sample_tree() -> CapturedNode {
        CapturedNode::new(NodeKind::Frame, "body")
            .with_child(
                CapturedNode::new(NodeKind::Frame, "div")
                    .with_child(CapturedNode::new(NodeKind::Text, "p").with_text("a"))
                    .with_child(CapturedNode::new(NodeKind::Text, "p").with_text("b")),
            )
            .with_child(CapturedNode::new(NodeKind::Image, "img"))
    }

    #[test]
    fn map_has_one_entry_per_node() {
        let tree = sample_tree();
        let map = build_fingerprint_map(&tree, NodePath::root());
        assert_eq!(map.len(), count_nodes(&tree));
    }

    #[test]
    fn paths_encode_preorder_position() {
        let tree = sample_tree();
        let map = build_fingerprint_map(&tree, NodePath::root());
        let paths: Vec<&str> = map.keys().map(NodePath::as_str).collect();
        assert_eq!(paths, vec!["root", "root-0", "root-0-0", "root-0-1", "root-1"]);
    }

    #[test]
    fn identical_trees_produce_identical_maps() {
        let a = sample_tree();
        let b = sample_tree();
        let map_a = build_fingerprint_map(&a, NodePath::root());
        let map_b = build_fingerprint_map(&b, NodePath::root());
        for (path, entry) in &map_a {
            assert_eq!(entry.fingerprint, map_b[path].fingerprint, "at {path}");
        }
    }

    #[test]
    fn hidden_nodes_still_receive_entries() {
        let mut tree = sample_tree();
        tree.children[1].visible = false;
        let map = build_fingerprint_map(&tree, NodePath::root());
        assert!(map.contains_key(&NodePath::from_encoded("root-1")));
    }
}
