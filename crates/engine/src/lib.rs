//! # Domloom Engine
//!
//! Tree conversion and fingerprint-based reconciliation.
//!
//! The engine never talks to a concrete design platform. Node creation,
//! instance creation, and metadata tagging live behind the [`NodeBuilder`]
//! capability, injected by the surrounding application; [`MemoryBuilder`] is
//! the in-memory implementation used by tests and the CLI's document output.
//!
//! ```text
//! Capture ──> validate ──> detect components ──> convert (builder)
//!                                                    │
//!                                  document tree with path+fingerprint tags
//!                                                    │
//! Re-capture ──> fingerprint map ──> diff ──> ChangeRecord[] ──> apply
//! ```
//!
//! Execution is single-walk and cooperative: builder calls are awaited in
//! pre-order, never concurrently for two nodes of the same tree, and the
//! converter hands control back to the scheduler every few dozen nodes so a
//! long conversion cannot starve the host.

mod builder;
mod convert;
mod error;
mod memory;
mod progress;
mod reconcile;

pub use builder::{NodeBuilder, NodeId};
pub use convert::{convert, ConvertOptions, ConvertOutcome, ConvertStats};
pub use error::{BuilderError, EngineError, Result};
pub use memory::{DocumentNode, MemoryBuilder};
pub use progress::{Phase, ProgressReporter};
pub use reconcile::{
    apply, collect_existing_map, diff, existing_fingerprints, ApplyStats, ChangeKind,
    ChangeRecord, ChangeSummary, ExistingEntry, ExistingMap,
};
