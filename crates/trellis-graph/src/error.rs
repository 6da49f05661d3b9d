//! Error types for the relationship graph

/// Errors raised when decoding graph vocabulary
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GraphError {
    /// `type` field names no known entity type
    #[error("unknown entity type: '{0}'")]
    UnknownEntityType(String),

    /// Field name is not a relationship field
    #[error("unknown relation field: '{0}'")]
    UnknownRelation(String),

    /// Record yields no usable entity id
    #[error("record {0} has no entity id")]
    MissingId(String),
}
