//! Error types for collector operations.
//!
//! The exported runtime surface has no error channel back into generated
//! code, so every error that reaches it is terminal. Inside the library,
//! fallible operations still return [`Result`] so that hosts and tests can
//! observe failures before they turn fatal.

use thiserror::Error;

/// Result type alias for collector operations.
pub type Result<T> = std::result::Result<T, TgcError>;

/// Errors that can occur inside the collector library.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TgcError {
    /// The underlying allocator refused a block request.
    ///
    /// **When returned:** `calloc` returned null, or the requested size
    /// plus the header word does not fit in an address word.
    ///
    /// **Recovery strategy:** none at this level. The runtime surface
    /// reports the failure on the diagnostic stream and terminates the
    /// process; generated code never sees a null block.
    #[error("out of memory: failed to reserve {requested} bytes")]
    OutOfMemory { requested: usize },

    /// A caller passed an argument outside the operation's domain.
    ///
    /// **When returned:** currently only for negative allocation sizes
    /// arriving over the C surface, where the two's-complement bit pattern
    /// would otherwise be misread as an enormous unsigned request.
    ///
    /// **Recovery strategy:** none; this is a bug in the calling code
    /// generator, not a runtime condition.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

impl TgcError {
    /// Whether this error indicates a bug in the caller rather than an
    /// environmental condition.
    pub fn is_bug(&self) -> bool {
        matches!(self, TgcError::InvalidArgument(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = TgcError::OutOfMemory { requested: 4096 };
        assert_eq!(
            err.to_string(),
            "out of memory: failed to reserve 4096 bytes"
        );

        let err = TgcError::InvalidArgument("negative size -3".to_string());
        assert_eq!(err.to_string(), "invalid argument: negative size -3");
    }

    #[test]
    fn test_bug_classification() {
        assert!(!TgcError::OutOfMemory { requested: 1 }.is_bug());
        assert!(TgcError::InvalidArgument("x".into()).is_bug());
    }
}
