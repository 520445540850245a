use thiserror::Error;

/// Result type for engine operations
pub type Result<T> = std::result::Result<T, EngineError>;

/// Failures surfaced by the injected node-creation capability
#[derive(Error, Debug)]
pub enum BuilderError {
    /// A required resource (font, image) could not be loaded before a
    /// mutation; the specific property update is skipped, the walk continues
    #[error("Resource precondition failed: {0}")]
    ResourcePrecondition(String),

    /// The output platform refused the operation; unrecoverable
    #[error("Builder refused operation: {0}")]
    Refused(String),
}

impl BuilderError {
    /// Whether the walk may continue past this failure
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        matches!(self, Self::ResourcePrecondition(_))
    }
}

/// Terminal errors of a conversion or reconciliation run
///
/// Everything recoverable (precondition skips, path misses, prunes) is
/// logged and counted instead of surfacing here.
#[derive(Error, Debug)]
pub enum EngineError {
    /// The captured tree failed schema validation; nothing was created
    #[error("Invalid capture: {0}")]
    Capture(#[from] domloom_capture::CaptureError),

    /// Unrecoverable builder failure
    #[error("Builder error: {0}")]
    Builder(#[from] BuilderError),
}
