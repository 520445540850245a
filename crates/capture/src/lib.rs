//! # Domloom Capture
//!
//! The shared tree model for captured page snapshots.
//!
//! A capture is a rooted, ordered tree of [`CapturedNode`]s produced by an
//! external extraction collaborator and ferried here as JSON. This crate owns
//! the schema, positional [`NodePath`] addressing, and the validation gate
//! that rejects malformed trees before any downstream work begins.
//!
//! ```text
//! Capture (JSON)
//!     │
//!     ├──> validate()        fatal malformed-capture gate
//!     │
//!     ├──> CapturedNode tree consumed by:
//!     │    ├─> fingerprinting (change detection)
//!     │    ├─> component detection (repeated structures)
//!     │    └─> conversion (document materialization)
//!     │
//!     └──> NodePath           positional identity ("root-0-2")
//! ```

mod error;
mod node;
mod path;
mod validate;

pub use error::{CaptureError, Result};
pub use node::{
    count_nodes, Bounds, Capture, CaptureMetadata, CapturedNode, NodeKind, StyleDigest, Viewport,
};
pub use path::NodePath;
pub use validate::{validate, MAX_TREE_DEPTH};
