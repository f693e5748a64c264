//! Inbound message dispatch: thin adapters from wire payloads to the
//! stores, the gossip engine and transport replies.

use std::collections::HashMap;
use std::sync::Arc;

use rumor_proto::{Message, Payload, Value, MALFORMED_REQUEST};
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tracing::{debug, info, warn};

use crate::config::EngineConfig;
use crate::engine::{GossipEngine, GossipHandle};
use crate::error::NodeError;
use crate::store::{DedupStore, TopologyStore};
use crate::transport::Transport;

/// Handler layer for one broadcast node.
///
/// Every inbound message gets its own task, so handlers overlap freely; the
/// stores tolerate that, and the engine is only reached through its inboxes.
#[derive(Debug)]
pub struct Server<T: Transport> {
    transport: Arc<T>,
    seen: Arc<DedupStore>,
    topology: Arc<TopologyStore>,
    gossip: GossipHandle,
}

impl<T: Transport> Server<T> {
    /// Creates the server and its gossip engine. The caller spawns
    /// [`GossipEngine::run`]; the engine shuts down once every clone of the
    /// server (and with it the gossip handle) is dropped.
    #[must_use]
    pub fn new(transport: Arc<T>, config: EngineConfig) -> (Arc<Self>, GossipEngine<T>) {
        let seen = Arc::new(DedupStore::new());
        let topology = Arc::new(TopologyStore::new());
        let (engine, gossip) =
            GossipEngine::new(Arc::clone(&transport), Arc::clone(&topology), config);

        let server = Arc::new(Self {
            transport,
            seen,
            topology,
            gossip,
        });
        (server, engine)
    }

    /// Reads newline-delimited JSON messages until EOF, spawning one handler
    /// task per message.
    ///
    /// A line that fails to decode is logged and skipped; it is the sender's
    /// job to retry a request it mangled.
    pub async fn serve<R>(self: Arc<Self>, reader: R) -> Result<(), NodeError>
    where
        R: AsyncBufRead + Unpin,
    {
        let mut lines = reader.lines();
        while let Some(line) = lines.next_line().await? {
            if line.trim().is_empty() {
                continue;
            }
            let message: Message = match serde_json::from_str(&line) {
                Ok(message) => message,
                Err(err) => {
                    warn!(%err, "dropping malformed inbound line");
                    continue;
                }
            };

            // Every later handler needs the node id the handshake assigns,
            // so init runs inline instead of racing in a spawned task.
            if matches!(message.body.payload, Payload::Init { .. }) {
                if let Err(err) = self.handle(message).await {
                    warn!(%err, "init failed");
                }
                continue;
            }

            let server = Arc::clone(&self);
            tokio::spawn(async move {
                if let Err(err) = server.handle(message).await {
                    warn!(%err, "handler failed");
                }
            });
        }
        Ok(())
    }

    /// Dispatches one inbound message.
    pub async fn handle(&self, message: Message) -> Result<(), NodeError> {
        match message.body.payload.clone() {
            Payload::Init { node_id, .. } => self.handle_init(&message, node_id),
            Payload::Broadcast { message: value } => self.handle_broadcast(&message, value).await,
            Payload::Gossip { message: value } => self.handle_gossip(&message, value).await,
            Payload::GossipOk { message: value } => self.handle_gossip_ack(&message, value).await,
            Payload::Read => self.handle_read(&message),
            Payload::Topology { topology } => self.handle_topology(&message, &topology),
            other => {
                debug!(payload = ?other, "ignoring payload");
                Ok(())
            }
        }
    }

    /// Runs a value through dedup admission and, if new, queues it for
    /// fan-out with its origin excluded.
    async fn admit(&self, origin: &str, value: Value) -> Result<(), NodeError> {
        if self.seen.observe(value) {
            self.gossip.submit_gossip(origin, value).await?;
        }
        Ok(())
    }

    fn handle_init(&self, message: &Message, node_id: String) -> Result<(), NodeError> {
        info!(node_id = %node_id, "initialized");
        self.transport.initialize(node_id);
        self.transport.reply(message, Payload::InitOk)
    }

    async fn handle_broadcast(&self, message: &Message, value: Value) -> Result<(), NodeError> {
        self.admit(&message.src, value).await?;
        self.transport.reply(message, Payload::BroadcastOk)
    }

    /// Same admission path as broadcast, but the ack always carries the
    /// value — even for an already-seen one, so the sender can clear its
    /// pending entry.
    async fn handle_gossip(&self, message: &Message, value: Value) -> Result<(), NodeError> {
        self.admit(&message.src, value).await?;
        self.transport
            .reply(message, Payload::GossipOk { message: value })
    }

    async fn handle_gossip_ack(&self, message: &Message, value: Value) -> Result<(), NodeError> {
        self.gossip.submit_ack(message.src.as_str(), value).await
    }

    fn handle_read(&self, message: &Message) -> Result<(), NodeError> {
        self.transport.reply(
            message,
            Payload::ReadOk {
                messages: self.seen.snapshot(),
            },
        )
    }

    /// Applies this node's entry of a topology assignment. A map with no
    /// entry for this node fails the request and leaves the previous peer
    /// list untouched.
    fn handle_topology(
        &self,
        message: &Message,
        topology: &HashMap<String, Vec<String>>,
    ) -> Result<(), NodeError> {
        let node_id = self.transport.node_id().ok_or(NodeError::NotInitialized)?;

        let Some(peers) = topology.get(&node_id) else {
            self.transport.reply(
                message,
                Payload::Error {
                    code: MALFORMED_REQUEST,
                    text: format!("no entry for node {node_id} in topology"),
                },
            )?;
            return Err(NodeError::NotInTopology { node_id });
        };

        info!(peers = ?peers, "topology assigned");
        self.topology.set_peers(peers.clone());
        self.transport.reply(message, Payload::TopologyOk)
    }
}
