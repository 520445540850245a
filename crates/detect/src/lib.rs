//! # Domloom Detect
//!
//! Component-pattern detection over captured trees.
//!
//! The capture stage stamps structurally-similar subtrees with a shared
//! structural hash. This crate groups those subtrees, applies a repetition
//! threshold, and derives a human-readable name for each surviving group:
//!
//! ```text
//! CapturedNode tree
//!     │
//!     ├──> pre-order collection (frame nodes with hash + children)
//!     │
//!     ├──> threshold filter (>= 3 instances)
//!     │
//!     ├──> naming pipeline
//!     │    ├─> explicit component-name attribute
//!     │    ├─> semantic role (skipping the generic role)
//!     │    ├─> class-name vote (utility classes excluded)
//!     │    └─> curated tag label fallback
//!     │
//!     └──> DetectedComponent[], most-instances-first
//! ```
//!
//! Detection is derived state: recomputed per run, never persisted apart
//! from the instances that produced it.

mod detector;
mod naming;

pub use detector::{detect, DetectedComponent, MIN_INSTANCES};
pub use naming::{clean_name, derive_name, is_utility_class, tag_label};
