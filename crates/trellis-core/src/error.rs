//! Error types for Trellis Core
//!
//! Provides error handling for:
//! - Record store failures that abort a batch (listing, not single reads)
//! - Diagram materialization
//! - Configuration loading
//! - Batch gate contention

use crate::batch::BatchKind;
use trellis_record::AccessError;

/// Main Trellis error type
#[derive(Debug, thiserror::Error)]
pub enum TrellisError {
    /// Record store failed as a whole
    #[error("record access failed: {0}")]
    Access(#[from] AccessError),

    /// Diagram could not be written
    #[error("materialize failed: {0}")]
    Materialize(String),

    /// Configuration could not be loaded
    #[error("configuration error: {0}")]
    Config(String),

    /// Another batch holds the gate
    #[error("batch already running: {0}")]
    Busy(BatchKind),
}

impl TrellisError {
    /// Create materialize error
    pub fn materialize(message: impl Into<String>) -> Self {
        Self::Materialize(message.into())
    }

    /// Create config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Check if retrying later can succeed
    #[inline]
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Busy(_) | Self::Access(AccessError::Unavailable(_)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn busy_is_retryable() {
        let err = TrellisError::Busy(BatchKind::Layout);
        assert!(err.is_retryable());
        assert_eq!(err.to_string(), "batch already running: layout");
    }

    #[test]
    fn config_is_not_retryable() {
        let err = TrellisError::config("bad toml");
        assert!(!err.is_retryable());
        assert!(err.to_string().contains("bad toml"));
    }
}
