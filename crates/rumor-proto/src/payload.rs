//! Typed payloads for the broadcast workload.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// A broadcast value. Opaque to the protocol: only compared for equality.
pub type Value = i64;

/// Error code for a request the node could not honor as phrased
/// (e.g. a topology map with no entry for this node).
pub const MALFORMED_REQUEST: u64 = 12;

/// Every payload a node sends or receives, tagged by `type` on the wire.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Payload {
    /// Harness handshake assigning this node its identity.
    Init {
        /// This node's identifier.
        node_id: String,
        /// All node identifiers in the cluster.
        node_ids: Vec<String>,
    },
    /// Acknowledges `init`.
    InitOk,

    /// A client or peer submits a value for dissemination.
    Broadcast {
        /// The value to disseminate.
        message: Value,
    },
    /// Acknowledges `broadcast`.
    BroadcastOk,

    /// Peer-to-peer propagation of a value.
    Gossip {
        /// The propagated value.
        message: Value,
    },
    /// Acknowledges `gossip`, echoing the value so the sender can clear
    /// its pending entry.
    GossipOk {
        /// The acknowledged value.
        message: Value,
    },

    /// A client asks for every value this node has seen.
    Read,
    /// Answers `read`.
    ReadOk {
        /// All values seen so far.
        messages: Vec<Value>,
    },

    /// Assigns each node its gossip peers.
    Topology {
        /// Node id -> peer ids.
        topology: HashMap<String, Vec<String>>,
    },
    /// Acknowledges `topology`.
    TopologyOk,

    /// A request failed.
    Error {
        /// Numeric error code.
        code: u64,
        /// Human-readable description.
        text: String,
    },
}
