use thiserror::Error;

/// Errors originating from the core viewport/addressing layer.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("invalid max iterations: {0} (must be >= 1)")]
    InvalidMaxIterations(u32),

    #[error("invalid level of detail: {0} (must be >= 1)")]
    InvalidLod(u32),

    #[error("invalid viewport: {reason}")]
    InvalidViewport { reason: String },
}
