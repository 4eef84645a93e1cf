//! Error taxonomy for platform collaborators.

use thiserror::Error;

/// Result type alias for platform operations.
pub type PlatformResult<T> = Result<T, PlatformError>;

/// Errors surfaced by the alias store and metrics provider.
///
/// Only `Transient` is retryable; `Conflict` and `Fatal` escalate
/// immediately to the caller's failure-handling path.
#[derive(Debug, Clone, Error)]
pub enum PlatformError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("conflicting update: {0}")]
    Conflict(String),

    #[error("transient failure: {0}")]
    Transient(String),

    #[error("platform failure: {0}")]
    Fatal(String),
}

impl PlatformError {
    /// Whether a retry may succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Transient(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_transient_is_retryable() {
        assert!(PlatformError::Transient("timeout".into()).is_transient());
        assert!(!PlatformError::Conflict("revision moved".into()).is_transient());
        assert!(!PlatformError::Fatal("denied".into()).is_transient());
        assert!(!PlatformError::NotFound("live".into()).is_transient());
    }
}
