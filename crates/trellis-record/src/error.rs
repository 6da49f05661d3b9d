//! Error types for the record layer
//!
//! Provides error handling for:
//! - Parse operations (document text → front matter)
//! - Access operations (list/read/write against a store)

use crate::record::RecordKey;

/// Errors while decoding or encoding a document's front matter
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    /// Document does not open with a `---` line
    #[error("document has no front matter block")]
    MissingFrontmatter,

    /// Opening delimiter found but no closing one
    #[error("front matter block is not terminated")]
    UnterminatedFrontmatter,

    /// YAML syntax error inside the block
    #[error("front matter yaml error: {0}")]
    Yaml(String),

    /// Block decoded to something other than a mapping
    #[error("front matter must be a mapping, got {0}")]
    NotAMapping(String),

    /// Re-encoding the block failed
    #[error("failed to encode front matter: {0}")]
    Encode(String),
}

/// Errors raised by a [`RecordAccessor`](crate::RecordAccessor)
#[derive(Debug, thiserror::Error)]
pub enum AccessError {
    /// No record stored under this key
    #[error("record not found: {0}")]
    NotFound(RecordKey),

    /// IO error during read or write
    #[error("io error on {key}: {source}")]
    Io {
        /// Record being accessed
        key: RecordKey,
        /// Underlying IO error
        #[source]
        source: std::io::Error,
    },

    /// Stored document could not be parsed
    #[error("failed to parse {key}: {source}")]
    Parse {
        /// Record that failed to parse
        key: RecordKey,
        /// Parse failure
        #[source]
        source: ParseError,
    },

    /// Store rejected the operation as a whole
    #[error("record store unavailable: {0}")]
    Unavailable(String),
}

impl AccessError {
    /// Create IO error for key
    pub fn io(key: impl Into<RecordKey>, source: std::io::Error) -> Self {
        Self::Io {
            key: key.into(),
            source,
        }
    }

    /// Create parse error for key
    pub fn parse(key: impl Into<RecordKey>, source: ParseError) -> Self {
        Self::Parse {
            key: key.into(),
            source,
        }
    }

    /// True when the record exists but its contents are malformed
    #[inline]
    #[must_use]
    pub fn is_parse(&self) -> bool {
        matches!(self, Self::Parse { .. })
    }
}
