use domloom_capture::CapturedNode;
use serde::{Deserialize, Serialize};
use std::fmt;

const FNV_OFFSET_BASIS: u32 = 0x811c_9dc5;
const FNV_PRIME: u32 = 0x0100_0193;

/// FNV-1a over raw bytes, 32-bit
///
/// Chosen for speed and determinism, not collision resistance.
#[must_use]
pub fn fnv1a_32(bytes: &[u8]) -> u32 {
    let mut hash = FNV_OFFSET_BASIS;
    for &byte in bytes {
        hash ^= u32::from(byte);
        hash = hash.wrapping_mul(FNV_PRIME);
    }
    hash
}

/// A node content fingerprint (32-bit FNV-1a digest)
#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Fingerprint(u32);

impl Fingerprint {
    #[must_use]
    pub const fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    #[must_use]
    pub const fn as_raw(self) -> u32 {
        self.0
    }

    /// 8-digit lowercase hex form, as stamped into node metadata
    #[must_use]
    pub fn to_hex(self) -> String {
        format!("{:08x}", self.0)
    }

    /// Parse the hex form back; `None` if it is not 8 hex digits
    #[must_use]
    pub fn from_hex(hex: &str) -> Option<Self> {
        if hex.len() != 8 {
            return None;
        }
        u32::from_str_radix(hex, 16).ok().map(Self)
    }
}

impl fmt::Debug for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Fingerprint({})", self.to_hex())
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:08x}", self.0)
    }
}

/// Fingerprint a single captured node
///
/// Feeds the hash one concatenation of the semantically relevant fields:
/// kind, tag, text, rounded `"WxH"` size, the captured style subset, and the
/// structural hash. Children do not participate; a child edit changes the
/// child's own fingerprint at its own path.
#[must_use]
pub fn fingerprint(node: &CapturedNode) -> Fingerprint {
    let mut input = String::with_capacity(64);
    input.push_str(node.kind.as_str());
    input.push('|');
    input.push_str(&node.tag);
    input.push('|');
    input.push_str(node.text.as_deref().unwrap_or(""));
    input.push('|');
    input.push_str(&node.bounds.size_key());
    input.push('|');
    input.push_str(node.style.background_color.as_deref().unwrap_or(""));
    input.push('|');
    input.push_str(node.style.color.as_deref().unwrap_or(""));
    input.push('|');
    input.push_str(node.style.font_size.as_deref().unwrap_or(""));
    input.push('|');
    input.push_str(node.structural_hash.as_deref().unwrap_or(""));
    Fingerprint(fnv1a_32(input.as_bytes()))
}
