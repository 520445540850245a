use crate::builder::{NodeBuilder, NodeId};
use crate::convert::floor_size;
use crate::error::{EngineError, Result};
use domloom_capture::{CapturedNode, NodeKind, NodePath};
use domloom_fingerprint::{Fingerprint, FingerprintMap};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Longest quoted text excerpt in a change description
const DESCRIPTION_TEXT_LIMIT: usize = 30;

/// Classification of one path between two captures
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeKind {
    Modified,
    Added,
    Removed,
}

/// One proposed mutation of the existing document
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeRecord {
    /// Stable record id (the path)
    pub id: String,
    pub kind: ChangeKind,
    pub path: NodePath,
    /// Node kind, for display
    pub node_kind: NodeKind,
    pub description: String,
    /// Whether the user kept this change selected; defaults true
    #[serde(default = "default_selected")]
    pub selected: bool,
}

const fn default_selected() -> bool {
    true
}

/// Aggregate counts of one diff run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeSummary {
    /// Total node count of the new capture
    pub total_nodes: usize,
    pub added: usize,
    pub modified: usize,
    pub removed: usize,
    pub unchanged: usize,
}

/// One recovered entry of the existing document's metadata
#[derive(Debug, Clone, Copy)]
pub struct ExistingEntry {
    pub node: NodeId,
    pub fingerprint: Fingerprint,
}

/// Path→handle+fingerprint map recovered from the existing document
pub type ExistingMap = BTreeMap<NodePath, ExistingEntry>;

/// Counts of one apply run
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplyStats {
    pub updated: usize,
    pub added: usize,
    pub removed: usize,
    pub text_updates_skipped: usize,
    pub path_misses: usize,
}

/// Rebuild the path→handle map from the existing document's metadata
///
/// Walks the document tree reading back stamped path+fingerprint tags.
/// Untagged nodes (component-instance internals) are descended through but
/// produce no entries. Rebuilt fresh at the start of every reconciliation
/// run; nothing is maintained incrementally.
pub async fn collect_existing_map<B: NodeBuilder>(builder: &B, root: NodeId) -> ExistingMap {
    let mut map = ExistingMap::new();
    let mut pending = vec![root];
    while let Some(id) = pending.pop() {
        if let Some((path, fingerprint)) = builder.read_path_and_fingerprint(id).await {
            map.insert(path, ExistingEntry { node: id, fingerprint });
        }
        pending.extend(builder.children(id).await);
    }
    map
}

/// Fingerprints of an existing map, for feeding [`diff`]
#[must_use]
pub fn existing_fingerprints(existing: &ExistingMap) -> BTreeMap<NodePath, Fingerprint> {
    existing
        .iter()
        .map(|(path, entry)| (path.clone(), entry.fingerprint))
        .collect()
}

/// Compare a new capture's fingerprint map against existing metadata
///
/// Every path present only in the new map is `added`; present in both with
/// differing fingerprints is `modified`; present only in the existing map is
/// `removed`. Identical fingerprints produce no record, only the unchanged
/// count. All records start selected.
#[must_use]
pub fn diff(
    new_map: &FingerprintMap<'_>,
    existing: &BTreeMap<NodePath, Fingerprint>,
) -> (Vec<ChangeRecord>, ChangeSummary) {
    let mut changes = Vec::new();
    let mut summary = ChangeSummary {
        total_nodes: new_map.len(),
        ..ChangeSummary::default()
    };

    for (path, entry) in new_map {
        match existing.get(path) {
            None => {
                summary.added += 1;
                changes.push(record(ChangeKind::Added, path, entry.node));
            }
            Some(existing_fp) if *existing_fp != entry.fingerprint => {
                summary.modified += 1;
                changes.push(record(ChangeKind::Modified, path, entry.node));
            }
            Some(_) => summary.unchanged += 1,
        }
    }

    for path in existing.keys() {
        if !new_map.contains_key(path) {
            summary.removed += 1;
            changes.push(ChangeRecord {
                id: path.to_string(),
                kind: ChangeKind::Removed,
                path: path.clone(),
                node_kind: NodeKind::Unknown,
                description: "No longer present in capture".to_string(),
                selected: true,
            });
        }
    }

    (changes, summary)
}

fn record(kind: ChangeKind, path: &NodePath, node: &CapturedNode) -> ChangeRecord {
    ChangeRecord {
        id: path.to_string(),
        kind,
        path: path.clone(),
        node_kind: node.kind,
        description: describe(node),
        selected: true,
    }
}

/// Quote truncated text content when present, else the tag in angle brackets
fn describe(node: &CapturedNode) -> String {
    match node.text.as_deref().map(str::trim) {
        Some(text) if !text.is_empty() => {
            let truncated: String = text.chars().take(DESCRIPTION_TEXT_LIMIT).collect();
            if text.chars().count() > DESCRIPTION_TEXT_LIMIT {
                format!("\"{truncated}…\"")
            } else {
                format!("\"{truncated}\"")
            }
        }
        _ => format!("<{}>", node.tag),
    }
}

/// Apply the selected subset of changes to the existing document
///
/// Not atomic across the batch: an interrupted run leaves already-applied
/// changes durably in place and unapplied ones untouched. Adds are applied
/// shallow-to-deep so a parent added in the same batch exists before its
/// children; removals run deep-to-shallow so subtrees disappear bottom-up.
/// Path misses are counted no-ops (adds fall back to the document root).
pub async fn apply<B: NodeBuilder>(
    changes: &[ChangeRecord],
    new_map: &FingerprintMap<'_>,
    existing: &ExistingMap,
    existing_root: NodeId,
    builder: &mut B,
) -> Result<ApplyStats> {
    let mut stats = ApplyStats::default();
    let mut live: BTreeMap<NodePath, NodeId> = existing
        .iter()
        .map(|(path, entry)| (path.clone(), entry.node))
        .collect();

    let selected: Vec<&ChangeRecord> = changes.iter().filter(|c| c.selected).collect();

    let mut adds: Vec<&ChangeRecord> = Vec::new();
    let mut removals: Vec<&ChangeRecord> = Vec::new();
    for change in selected {
        match change.kind {
            ChangeKind::Modified => {
                apply_modified(change, new_map, &live, builder, &mut stats).await?;
            }
            ChangeKind::Added => adds.push(change),
            ChangeKind::Removed => removals.push(change),
        }
    }

    adds.sort_by_key(|c| c.path.depth());
    for change in adds {
        apply_added(change, new_map, &mut live, existing_root, builder, &mut stats).await?;
    }

    removals.sort_by_key(|c| std::cmp::Reverse(c.path.depth()));
    for change in removals {
        match live.remove(&change.path) {
            Some(node) => {
                builder.remove_node(node).await?;
                stats.removed += 1;
            }
            None => {
                log::debug!("Remove miss at {}: nothing to delete", change.path);
                stats.path_misses += 1;
            }
        }
    }

    log::info!(
        "Applied {} update(s), {} addition(s), {} removal(s)",
        stats.updated,
        stats.added,
        stats.removed
    );
    Ok(stats)
}

async fn apply_modified<B: NodeBuilder>(
    change: &ChangeRecord,
    new_map: &FingerprintMap<'_>,
    live: &BTreeMap<NodePath, NodeId>,
    builder: &mut B,
    stats: &mut ApplyStats,
) -> Result<()> {
    let (Some(&node), Some(entry)) = (live.get(&change.path), new_map.get(&change.path)) else {
        log::debug!("Modify miss at {}: nothing to update", change.path);
        stats.path_misses += 1;
        return Ok(());
    };

    builder
        .update_geometry(node, floor_size(entry.node.bounds))
        .await?;
    if let Some(text) = entry.node.text.as_deref() {
        set_text_recovering(builder, node, text, &change.path, stats).await?;
    }
    // Re-stamp even when the text update was skipped, so the node is not
    // flagged again on every subsequent diff.
    builder
        .tag_with_path(node, &change.path, entry.fingerprint)
        .await?;
    stats.updated += 1;
    Ok(())
}

async fn apply_added<B: NodeBuilder>(
    change: &ChangeRecord,
    new_map: &FingerprintMap<'_>,
    live: &mut BTreeMap<NodePath, NodeId>,
    existing_root: NodeId,
    builder: &mut B,
    stats: &mut ApplyStats,
) -> Result<()> {
    let Some(entry) = new_map.get(&change.path) else {
        log::debug!("Add miss at {}: no source node", change.path);
        stats.path_misses += 1;
        return Ok(());
    };
    let source = entry.node;

    // Single-node creation, same shape as initial conversion; children of an
    // added subtree arrive as their own records.
    let id = builder
        .create_node(source.kind, &source.tag, floor_size(source.bounds), &source.style)
        .await?;
    if let Some(text) = source.text.as_deref() {
        set_text_recovering(builder, id, text, &change.path, stats).await?;
    }
    builder
        .tag_with_path(id, &change.path, entry.fingerprint)
        .await?;

    let parent = match change.path.parent().and_then(|p| live.get(&p).copied()) {
        Some(parent) => parent,
        None => {
            log::warn!(
                "No parent for added node at {}; attaching to document root",
                change.path
            );
            stats.path_misses += 1;
            existing_root
        }
    };
    builder.append_child(parent, id).await?;
    live.insert(change.path.clone(), id);
    stats.added += 1;
    Ok(())
}

async fn set_text_recovering<B: NodeBuilder>(
    builder: &mut B,
    node: NodeId,
    text: &str,
    path: &NodePath,
    stats: &mut ApplyStats,
) -> Result<()> {
    match builder.update_text(node, text).await {
        Ok(()) => Ok(()),
        Err(err) if err.is_recoverable() => {
            log::warn!("Skipping text update at {path}: {err}");
            stats.text_updates_skipped += 1;
            Ok(())
        }
        Err(err) => Err(EngineError::Builder(err)),
    }
}
