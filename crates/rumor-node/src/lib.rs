//! # rumor-node
//!
//! A broadcast node that disseminates values across a fixed cluster over an
//! unreliable transport.
//!
//! The crate is built around one actively concurrent component and a set of
//! thin shells:
//!
//! - [`GossipEngine`]: the core. A single-owner control loop that fans newly
//!   learned values out to peers, tracks unacknowledged sends in a
//!   pending-ack table and retries overdue ones on a timer. It is reached
//!   exclusively through two bounded inboxes via [`GossipHandle`].
//! - [`DedupStore`]: monotone set of values already seen; the admission gate.
//! - [`TopologyStore`]: this node's current peer list, replaced wholesale by
//!   topology updates.
//! - [`Server`]: translates inbound wire messages into store/engine calls and
//!   transport replies.
//! - [`Transport`]: the narrow seam to the outside world, implemented for
//!   production by [`StdioTransport`] (newline-delimited JSON).

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod config;
pub mod engine;
pub mod error;
pub mod server;
pub mod store;
pub mod transport;

pub use config::EngineConfig;
pub use engine::{AckEvent, GossipEngine, GossipEvent, GossipHandle};
pub use error::NodeError;
pub use server::Server;
pub use store::{DedupStore, TopologyStore};
pub use transport::{StdioTransport, Transport};
