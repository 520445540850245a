use serde::{Deserialize, Serialize};
use std::fmt;

/// Positional address of a node within a captured tree
///
/// Encoded as `root` plus dash-joined sibling indices (`root-0-2` is the
/// third child of the first child of the root). Paths are positional, not
/// content-addressed: reordering siblings changes every following sibling's
/// path, so a reorder shows up in a diff as spurious add/remove pairs rather
/// than a move. That is an accepted limitation of the scheme.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodePath(String);

impl NodePath {
    /// The conventional root prefix
    #[must_use]
    pub fn root() -> Self {
        Self("root".to_string())
    }

    /// Wrap an already-encoded path string
    #[must_use]
    pub fn from_encoded(encoded: impl Into<String>) -> Self {
        Self(encoded.into())
    }

    /// Path of the `index`-th child of this node
    #[must_use]
    pub fn child(&self, index: usize) -> Self {
        Self(format!("{}-{}", self.0, index))
    }

    /// Path of the parent, or `None` at the root
    #[must_use]
    pub fn parent(&self) -> Option<Self> {
        self.0.rsplit_once('-').map(|(head, _)| Self(head.to_string()))
    }

    /// Number of segments below the root (`root` → 0, `root-1-2` → 2)
    #[must_use]
    pub fn depth(&self) -> usize {
        self.0.matches('-').count()
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NodePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
