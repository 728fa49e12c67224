//! Error types for grouping and reconciliation

use thiserror::Error;

use crate::core::types::NodeId;

/// Result type for reconcile operations
pub type Result<T> = std::result::Result<T, ReconcileError>;

#[derive(Debug, Error)]
pub enum ReconcileError {
    /// A required key level produced no value for a record
    #[error("record {record} has no value for key level {level}")]
    MissingKey { record: usize, level: usize },

    /// Grouper was asked to group without any key functions
    #[error("grouper has no key levels")]
    NoKeyLevels,

    /// Hierarchy would need more nodes than `NodeId` can index
    #[error("hierarchy exceeds the node id range at {0} nodes")]
    TooManyNodes(usize),

    #[error("node not found: {0}")]
    NodeNotFound(NodeId),

    /// Decoded input is neither a list nor an object with a `records` list
    #[error("input is not a list of records")]
    NotARecordList,

    #[error("TOON error: {0}")]
    Decode(#[from] toon_format::ToonError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_key_display() {
        let err = ReconcileError::MissingKey { record: 3, level: 1 };
        assert_eq!(err.to_string(), "record 3 has no value for key level 1");
    }

    #[test]
    fn node_not_found_display() {
        assert_eq!(ReconcileError::NodeNotFound(42).to_string(), "node not found: 42");
    }
}
