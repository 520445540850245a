use thiserror::Error;

/// Result type for capture operations
pub type Result<T> = std::result::Result<T, CaptureError>;

/// Errors that can occur while ingesting a captured tree
#[derive(Error, Debug)]
pub enum CaptureError {
    /// The captured tree fails schema validation
    #[error("Malformed capture at {path}: {reason}")]
    MalformedNode { path: String, reason: String },

    /// The tree nests deeper than the hard ceiling
    #[error("Capture exceeds maximum depth of {max} at {path}")]
    TooDeep { path: String, max: usize },

    /// The transport JSON could not be decoded
    #[error("Decode error: {0}")]
    Decode(#[from] serde_json::Error),

    /// IO error occurred
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl CaptureError {
    /// Create a malformed-node error
    pub fn malformed(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::MalformedNode {
            path: path.into(),
            reason: reason.into(),
        }
    }
}
