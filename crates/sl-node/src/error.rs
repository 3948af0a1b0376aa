//! Error types for the node runtime.

use sl_controls::ControlError;
use thiserror::Error;

/// Result type for node runtime operations.
pub type NodeResult<T> = Result<T, NodeError>;

#[derive(Debug, Error)]
pub enum NodeError {
    /// Building a component from configuration failed.
    #[error("Invalid configuration for {node}: {source}")]
    Config {
        node: &'static str,
        #[source]
        source: ControlError,
    },

    /// The node a request was addressed to has stopped.
    #[error("Node {node} is not running")]
    NodeStopped { node: String },

    /// A node task panicked or was aborted.
    #[error("Node task {node} failed: {what}")]
    Join { node: &'static str, what: String },
}
