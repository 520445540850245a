use crate::naming::derive_name;
use domloom_capture::CapturedNode;

/// Minimum repetitions before a structural hash becomes a component
pub const MIN_INSTANCES: usize = 3;

/// A repeated structure recognized as a reusable component
///
/// Borrowed from the capture it was detected in; recomputed each run.
#[derive(Debug, Clone)]
pub struct DetectedComponent<'a> {
    /// Structural hash shared by every instance
    pub structural_hash: String,

    /// Derived display name
    pub name: String,

    /// All instances, in pre-order encounter order
    pub instances: Vec<&'a CapturedNode>,
}

impl<'a> DetectedComponent<'a> {
    /// First instance encountered in pre-order; the template source
    #[must_use]
    pub fn representative(&self) -> &'a CapturedNode {
        self.instances[0]
    }
}

/// Detect repeated components in a captured tree
///
/// Pre-order walk collecting frame nodes that carry a structural hash and
/// have at least one child; groups below [`MIN_INSTANCES`] are dropped.
/// Output is ordered most-instances-first, stable on ties, so callers can
/// materialize the strongest patterns first.
#[must_use]
pub fn detect(root: &CapturedNode) -> Vec<DetectedComponent<'_>> {
    // Insertion-ordered groups keep the tie-break deterministic.
    let mut groups: Vec<(String, Vec<&CapturedNode>)> = Vec::new();
    collect(root, &mut groups);

    let mut components: Vec<DetectedComponent<'_>> = groups
        .into_iter()
        .filter(|(_, instances)| instances.len() >= MIN_INSTANCES)
        .map(|(structural_hash, instances)| {
            let name = derive_name(instances[0], &instances);
            DetectedComponent {
                structural_hash,
                name,
                instances,
            }
        })
        .collect();

    components.sort_by(|a, b| b.instances.len().cmp(&a.instances.len()));

    if !components.is_empty() {
        log::debug!(
            "Detected {} component pattern(s): {}",
            components.len(),
            components
                .iter()
                .map(|c| format!("{} x{}", c.name, c.instances.len()))
                .collect::<Vec<_>>()
                .join(", ")
        );
    }
    components
}

fn collect<'a>(node: &'a CapturedNode, groups: &mut Vec<(String, Vec<&'a CapturedNode>)>) {
    if node.is_component_candidate() {
        let hash = node.structural_hash.as_deref().unwrap_or_default();
        match groups.iter_mut().find(|(key, _)| key == hash) {
            Some((_, instances)) => instances.push(node),
            None => groups.push((hash.to_string(), vec![node])),
        }
    }
    for child in &node.children {
        collect(child, groups);
    }
}
