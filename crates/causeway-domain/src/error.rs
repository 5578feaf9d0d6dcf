//! Error taxonomy for cause resolution.

use thiserror::Error;

/// Errors produced while resolving cause chains.
#[derive(Debug, Error)]
pub enum CauseError {
    /// The caller supplied no run reference. A contract violation upstream;
    /// never raised mid-walk.
    #[error("run reference must be present")]
    MissingRun,

    /// The pipeline engine could not resolve a flow-node identifier,
    /// e.g. a stale annotation after graph compaction. Recovered locally
    /// by treating the lookup as not-found.
    #[error("failed to read flow node {node_id}: {reason}")]
    NodeLookup { node_id: String, reason: String },

    /// Serialization error from the recorded-model loader.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for cause-resolution operations.
pub type Result<T> = std::result::Result<T, CauseError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_run_display() {
        let err = CauseError::MissingRun;
        assert!(err.to_string().contains("must be present"));
    }

    #[test]
    fn test_node_lookup_display_names_node() {
        let err = CauseError::NodeLookup {
            node_id: "17".to_string(),
            reason: "node not present in execution".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("17"));
        assert!(msg.contains("not present"));
    }
}
