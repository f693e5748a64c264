//! Error types for rumor-node.

use thiserror::Error;

/// Errors that can occur while serving the broadcast workload.
#[derive(Debug, Error)]
pub enum NodeError {
    /// IO error on the transport.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// An inbound payload failed to decode.
    #[error("malformed message: {0}")]
    Malformed(#[from] serde_json::Error),

    /// A topology assignment had no entry for this node.
    #[error("no entry for node {node_id} in topology")]
    NotInTopology {
        /// This node's identifier.
        node_id: String,
    },

    /// The transport was used before the init handshake assigned a node id.
    #[error("transport not initialized")]
    NotInitialized,

    /// An event was submitted after the engine shut down.
    #[error("gossip engine is no longer running")]
    EngineClosed,
}
