//! # Domloom Fingerprint
//!
//! Deterministic content fingerprinting for change detection.
//!
//! A fingerprint is a coarse, non-cryptographic digest of the fields a
//! visual re-render would care about: kind, tag, text, rounded size, and the
//! captured style subset. Two captures of the same page state fingerprint
//! byte-identically; unrelated DOM identity (node addresses, capture order
//! of attributes) never leaks in. Collisions are acceptable; fingerprints
//! drive change detection, not identity.

mod hash;
mod map;

pub use hash::{fingerprint, fnv1a_32, Fingerprint};
pub use map::{build_fingerprint_map, FingerprintMap, PathEntry};
