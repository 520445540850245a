use crate::builder::{NodeBuilder, NodeId};
use crate::error::{BuilderError, EngineError, Result};
use crate::progress::{Phase, ProgressReporter};
use domloom_capture::{count_nodes, validate, Bounds, Capture, CapturedNode, NodePath};
use domloom_detect::detect;
use domloom_fingerprint::fingerprint;
use serde::Serialize;
use std::collections::{BTreeSet, HashMap};
use std::future::Future;
use std::pin::Pin;

/// Hand control back to the scheduler after this many processed nodes
const YIELD_INTERVAL: usize = 32;

/// Conversion tuning knobs
#[derive(Debug, Clone, Copy)]
pub struct ConvertOptions {
    /// Nodes deeper than this are pruned (the root is depth 0)
    pub max_depth: usize,

    /// Materialize nodes whose captured `visible` flag is false
    pub include_hidden: bool,
}

impl Default for ConvertOptions {
    fn default() -> Self {
        Self {
            max_depth: 25,
            include_hidden: false,
        }
    }
}

/// Counts produced by one conversion run
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConvertStats {
    pub nodes_created: usize,
    pub components_created: usize,
    pub instances_created: usize,
    pub styles_applied: usize,
    pub nodes_skipped: usize,
    pub text_updates_skipped: usize,
}

/// Result of a conversion: the document root plus run counts
#[derive(Debug, Clone)]
pub struct ConvertOutcome {
    pub root: NodeId,
    pub stats: ConvertStats,
}

/// Convert a captured tree into a document tree via the injected builder
///
/// Depth-first, pre-order; sibling order is preserved. Repeated structures
/// recognized by the detector are materialized once (first pre-order
/// encounter becomes the template) and referenced thereafter as lightweight
/// instances. Every materialized node is stamped with its positional path
/// and content fingerprint for later reconciliation.
pub async fn convert<B: NodeBuilder>(
    capture: &Capture,
    builder: &mut B,
    options: &ConvertOptions,
    progress: &mut ProgressReporter,
) -> Result<ConvertOutcome> {
    progress.phase(Phase::Preparing);
    validate(capture)?;
    let total = count_nodes(&capture.root);
    log::info!(
        "Converting capture of {} ({total} nodes)",
        capture.metadata.source_id
    );

    progress.phase(Phase::CreatingStyles);
    let styles_applied = distinct_styles(&capture.root);

    progress.phase(Phase::DetectingComponents);
    let components = detect(&capture.root);
    let templates: HashMap<String, Option<NodeId>> = components
        .iter()
        .map(|c| (c.structural_hash.clone(), None))
        .collect();

    progress.phase(Phase::CreatingNodes);
    let mut walker = Walker {
        builder,
        options,
        progress,
        templates,
        stats: ConvertStats {
            styles_applied,
            ..ConvertStats::default()
        },
        processed: 0,
        total,
        since_yield: 0,
    };
    let root = walker
        .walk(&capture.root, NodePath::root(), 0)
        .await?
        .ok_or_else(|| BuilderError::Refused("root node was not materialized".to_string()))?;
    let stats = walker.stats;

    progress.finish();
    log::info!(
        "Conversion done: {} nodes, {} components, {} instances",
        stats.nodes_created,
        stats.components_created,
        stats.instances_created
    );
    Ok(ConvertOutcome { root, stats })
}

/// Output primitives cannot be zero-sized; floor dimensions to 1
pub(crate) fn floor_size(bounds: Bounds) -> Bounds {
    Bounds {
        x: bounds.x,
        y: bounds.y,
        width: bounds.width.max(1.0),
        height: bounds.height.max(1.0),
    }
}

/// Count distinct non-empty style digests in the tree
fn distinct_styles(root: &CapturedNode) -> usize {
    fn visit(node: &CapturedNode, seen: &mut BTreeSet<String>) {
        if let Ok(key) = serde_json::to_string(&node.style) {
            if key != "{}" {
                seen.insert(key);
            }
        }
        for child in &node.children {
            visit(child, seen);
        }
    }
    let mut seen = BTreeSet::new();
    visit(root, &mut seen);
    seen.len()
}

struct Walker<'a, B: NodeBuilder> {
    builder: &'a mut B,
    options: &'a ConvertOptions,
    progress: &'a mut ProgressReporter,
    /// structural hash → materialized template, once one exists
    templates: HashMap<String, Option<NodeId>>,
    stats: ConvertStats,
    processed: usize,
    total: usize,
    since_yield: usize,
}

type WalkFuture<'b> = Pin<Box<dyn Future<Output = Result<Option<NodeId>>> + Send + 'b>>;

impl<B: NodeBuilder> Walker<'_, B> {
    /// Visit one node; returns the materialized handle, or `None` on a prune
    fn walk<'b>(&'b mut self, node: &'b CapturedNode, path: NodePath, depth: usize) -> WalkFuture<'b> {
        Box::pin(async move {
            // The synthetic top-level node is always fully expanded; hidden
            // filtering and component substitution only apply below it.
            if depth > 0 {
                if !node.visible && !self.options.include_hidden {
                    self.stats.nodes_skipped += count_nodes(node);
                    return Ok(None);
                }
                if depth > self.options.max_depth {
                    log::debug!("Pruning {path} at depth {depth}");
                    self.stats.nodes_skipped += count_nodes(node);
                    return Ok(None);
                }
                if let Some(instance) = self.try_substitute(node, &path).await? {
                    return Ok(Some(instance));
                }
            }

            let id = self
                .builder
                .create_node(node.kind, &node.tag, floor_size(node.bounds), &node.style)
                .await?;
            self.stats.nodes_created += 1;
            if let Some(text) = node.text.as_deref() {
                self.set_text(id, text, &path).await?;
            }
            self.tick(1).await;

            for (index, child) in node.children.iter().enumerate() {
                if let Some(child_id) = self.walk(child, path.child(index), depth + 1).await? {
                    self.builder.append_child(id, child_id).await?;
                }
            }

            self.builder
                .tag_with_path(id, &path, fingerprint(node))
                .await?;

            if let Some(hash) = node.structural_hash.as_deref().filter(|_| node.is_component_candidate()) {
                if let Some(slot) = self.templates.get_mut(hash) {
                    if slot.is_none() {
                        *slot = Some(id);
                        self.stats.components_created += 1;
                    }
                }
            }
            Ok(Some(id))
        })
    }

    /// Emit an instance reference when this node matches a materialized
    /// template; the whole subtree still counts toward progress
    async fn try_substitute(
        &mut self,
        node: &CapturedNode,
        path: &NodePath,
    ) -> Result<Option<NodeId>> {
        if !node.is_component_candidate() {
            return Ok(None);
        }
        let Some(hash) = node.structural_hash.as_deref() else {
            return Ok(None);
        };
        let Some(Some(template)) = self.templates.get(hash).copied() else {
            return Ok(None);
        };
        let id = self.builder.create_component_instance(node, template).await?;
        self.builder
            .tag_with_path(id, path, fingerprint(node))
            .await?;
        self.stats.instances_created += 1;
        self.tick(count_nodes(node)).await;
        Ok(Some(id))
    }

    async fn set_text(&mut self, id: NodeId, text: &str, path: &NodePath) -> Result<()> {
        match self.builder.update_text(id, text).await {
            Ok(()) => Ok(()),
            Err(err) if err.is_recoverable() => {
                log::warn!("Skipping text update at {path}: {err}");
                self.stats.text_updates_skipped += 1;
                Ok(())
            }
            Err(err) => Err(EngineError::Builder(err)),
        }
    }

    async fn tick(&mut self, nodes: usize) {
        self.processed = (self.processed + nodes).min(self.total);
        self.progress.nodes(self.processed, self.total);
        self.since_yield += nodes;
        if self.since_yield >= YIELD_INTERVAL {
            self.since_yield = 0;
            tokio::task::yield_now().await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryBuilder;
    use domloom_capture::{CaptureMetadata, NodeKind, Viewport};
    use pretty_assertions::assert_eq;
    use std::sync::{Arc, Mutex};

    fn capture(root: CapturedNode) -> Capture {
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

    fn card(hash: &str, text: &str) -> CapturedNode {
        CapturedNode::new(NodeKind::Frame, "div")
            .with_structural_hash(hash)
            .with_bounds(Bounds::new(0.0, 0.0, 200.0, 100.0))
            .with_child(
                CapturedNode::new(NodeKind::Text, "span")
                    .with_bounds(Bounds::new(0.0, 0.0, 180.0, 20.0))
                    .with_text(text),
            )
    }

    #[tokio::test]
    async fn repeated_structures_become_one_template_plus_instances() {
        let root = CapturedNode::new(NodeKind::Frame, "body")
            .with_child(card("H", "one"))
            .with_child(card("H", "two"))
            .with_child(card("H", "three"));
        let mut builder = MemoryBuilder::new();
        let outcome = convert(
            &capture(root),
            &mut builder,
            &ConvertOptions::default(),
            &mut ProgressReporter::silent(),
        )
        .await
        .unwrap();

        assert_eq!(outcome.stats.components_created, 1);
        assert_eq!(outcome.stats.instances_created, 2);
        // root + first card (template) + its text child
        assert_eq!(outcome.stats.nodes_created, 3);

        let children = builder.children(outcome.root).await;
        assert_eq!(children.len(), 3);
        assert!(builder.get(children[0]).unwrap().component_ref.is_none());
        assert!(builder.get(children[1]).unwrap().component_ref.is_some());
        assert!(builder.get(children[2]).unwrap().component_ref.is_some());
    }

    #[tokio::test]
    async fn hidden_subtrees_are_skipped_unless_included() {
        let mut hidden = card("X", "ghost");
        hidden.structural_hash = None;
        hidden.visible = false;
        let root = CapturedNode::new(NodeKind::Frame, "body")
            .with_child(hidden.clone())
            .with_child(CapturedNode::new(NodeKind::Text, "p").with_text("shown"));

        let mut builder = MemoryBuilder::new();
        let outcome = convert(
            &capture(root.clone()),
            &mut builder,
            &ConvertOptions::default(),
            &mut ProgressReporter::silent(),
        )
        .await
        .unwrap();
        assert_eq!(outcome.stats.nodes_created, 2);
        assert_eq!(outcome.stats.nodes_skipped, 2);

        let mut builder = MemoryBuilder::new();
        let outcome = convert(
            &capture(root),
            &mut builder,
            &ConvertOptions {
                include_hidden: true,
                ..ConvertOptions::default()
            },
            &mut ProgressReporter::silent(),
        )
        .await
        .unwrap();
        assert_eq!(outcome.stats.nodes_created, 4);
        assert_eq!(outcome.stats.nodes_skipped, 0);
    }

    #[tokio::test]
    async fn depth_limit_prunes_but_root_is_always_expanded() {
        let deep = CapturedNode::new(NodeKind::Frame, "body").with_child(
            CapturedNode::new(NodeKind::Frame, "div")
                .with_child(CapturedNode::new(NodeKind::Text, "p").with_text("too deep")),
        );
        let mut builder = MemoryBuilder::new();
        let outcome = convert(
            &capture(deep),
            &mut builder,
            &ConvertOptions {
                max_depth: 1,
                ..ConvertOptions::default()
            },
            &mut ProgressReporter::silent(),
        )
        .await
        .unwrap();
        assert_eq!(outcome.stats.nodes_created, 2);
        assert_eq!(outcome.stats.nodes_skipped, 1);
    }

    #[tokio::test]
    async fn zero_sized_bounds_floor_to_one() {
        let root = CapturedNode::new(NodeKind::Frame, "body").with_child(
            CapturedNode::new(NodeKind::Frame, "div").with_bounds(Bounds::new(5.0, 5.0, 0.0, 0.0)),
        );
        let mut builder = MemoryBuilder::new();
        let outcome = convert(
            &capture(root),
            &mut builder,
            &ConvertOptions::default(),
            &mut ProgressReporter::silent(),
        )
        .await
        .unwrap();
        let child = builder.children(outcome.root).await[0];
        let bounds = builder.get(child).unwrap().bounds;
        assert_eq!(bounds.width, 1.0);
        assert_eq!(bounds.height, 1.0);
    }

    #[tokio::test]
    async fn zero_sized_instance_bounds_floor_to_one() {
        let root = CapturedNode::new(NodeKind::Frame, "body")
            .with_child(card("H", "one"))
            .with_child(card("H", "two"))
            .with_child(card("H", "three").with_bounds(Bounds::new(10.0, 10.0, 0.0, 80.0)));
        let mut builder = MemoryBuilder::new();
        let outcome = convert(
            &capture(root),
            &mut builder,
            &ConvertOptions::default(),
            &mut ProgressReporter::silent(),
        )
        .await
        .unwrap();

        let instance = builder.children(outcome.root).await[2];
        let node = builder.get(instance).unwrap();
        assert!(node.component_ref.is_some());
        assert_eq!(node.bounds.width, 1.0);
        assert_eq!(node.bounds.height, 80.0);
    }

    #[tokio::test]
    async fn every_materialized_node_is_tagged() {
        let root = CapturedNode::new(NodeKind::Frame, "body")
            .with_child(CapturedNode::new(NodeKind::Text, "p").with_text("a"))
            .with_child(CapturedNode::new(NodeKind::Text, "p").with_text("b"));
        let mut builder = MemoryBuilder::new();
        let outcome = convert(
            &capture(root),
            &mut builder,
            &ConvertOptions::default(),
            &mut ProgressReporter::silent(),
        )
        .await
        .unwrap();

        let (path, _) = builder
            .read_path_and_fingerprint(outcome.root)
            .await
            .unwrap();
        assert_eq!(path.as_str(), "root");
        for (index, child) in builder.children(outcome.root).await.iter().enumerate() {
            let (path, _) = builder.read_path_and_fingerprint(*child).await.unwrap();
            assert_eq!(path.as_str(), format!("root-{index}"));
        }
    }

    #[tokio::test]
    async fn progress_is_monotonic_and_bounded() {
        let mut root = CapturedNode::new(NodeKind::Frame, "body");
        for i in 0..100 {
            root = root.with_child(CapturedNode::new(NodeKind::Text, "p").with_text(format!("{i}")));
        }
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let mut progress = ProgressReporter::new(move |fraction, _| {
            sink.lock().unwrap().push(fraction);
        });
        let mut builder = MemoryBuilder::new();
        convert(&capture(root), &mut builder, &ConvertOptions::default(), &mut progress)
            .await
            .unwrap();

        let seen = seen.lock().unwrap();
        assert!(seen.windows(2).all(|w| w[0] <= w[1]));
        assert!(seen.iter().all(|f| (0.0..=1.0).contains(f)));
        assert_eq!(*seen.last().unwrap(), 1.0);
    }

    #[tokio::test]
    async fn malformed_capture_creates_nothing() {
        let root = CapturedNode::new(NodeKind::Frame, "body")
            .with_child(CapturedNode::new(NodeKind::Frame, ""));
        let mut builder = MemoryBuilder::new();
        let err = convert(
            &capture(root),
            &mut builder,
            &ConvertOptions::default(),
            &mut ProgressReporter::silent(),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, EngineError::Capture(_)));
        assert_eq!(builder.live_count(), 0);
    }

    #[tokio::test]
    async fn text_precondition_failure_does_not_abort_conversion() {
        let root = CapturedNode::new(NodeKind::Frame, "body")
            .with_child(CapturedNode::new(NodeKind::Text, "p").with_text("☃ broken"))
            .with_child(CapturedNode::new(NodeKind::Text, "p").with_text("fine"));
        let mut builder = MemoryBuilder::new();
        builder.fail_text_containing("☃");
        let outcome = convert(
            &capture(root),
            &mut builder,
            &ConvertOptions::default(),
            &mut ProgressReporter::silent(),
        )
        .await
        .unwrap();
        assert_eq!(outcome.stats.text_updates_skipped, 1);
        assert_eq!(outcome.stats.nodes_created, 3);
    }
}
