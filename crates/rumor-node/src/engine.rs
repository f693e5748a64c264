//! The gossip dissemination and ack-tracked retry engine.
//!
//! One control loop owns all retry bookkeeping. Handlers never touch the
//! pending-ack table; they publish events through a [`GossipHandle`] into two
//! bounded inboxes. A full inbox blocks the producer — backpressure, never
//! loss, because a dropped admission event would break the dissemination
//! guarantee.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Instant;

use rumor_proto::{Payload, Value};
use tokio::sync::mpsc;
use tokio::time::{self, MissedTickBehavior};
use tracing::{debug, warn};

use crate::config::EngineConfig;
use crate::error::NodeError;
use crate::store::TopologyStore;
use crate::transport::Transport;

/// "This value was just learned and must not be gossiped back to its origin."
///
/// Produced by handlers once the dedup store admits a value, consumed once by
/// the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GossipEvent {
    /// The peer or client the value was learned from.
    pub origin: String,
    /// The newly learned value.
    pub value: Value,
}

/// A peer confirmed receipt of a gossiped value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AckEvent {
    /// The acknowledging peer.
    pub from: String,
    /// The acknowledged value.
    pub value: Value,
}

/// Producer side of the engine's inboxes. Cheap to clone; dropping every
/// clone closes the inboxes and lets the engine loop exit.
#[derive(Debug, Clone)]
pub struct GossipHandle {
    gossip_tx: mpsc::Sender<GossipEvent>,
    ack_tx: mpsc::Sender<AckEvent>,
}

impl GossipHandle {
    /// Queues a newly admitted value for fan-out.
    ///
    /// Blocks while the gossip inbox is full.
    ///
    /// # Errors
    ///
    /// Returns [`NodeError::EngineClosed`] if the engine has shut down.
    pub async fn submit_gossip(
        &self,
        origin: impl Into<String>,
        value: Value,
    ) -> Result<(), NodeError> {
        self.gossip_tx
            .send(GossipEvent {
                origin: origin.into(),
                value,
            })
            .await
            .map_err(|_| NodeError::EngineClosed)
    }

    /// Queues a peer acknowledgement.
    ///
    /// Blocks while the ack inbox is full.
    ///
    /// # Errors
    ///
    /// Returns [`NodeError::EngineClosed`] if the engine has shut down.
    pub async fn submit_ack(&self, from: impl Into<String>, value: Value) -> Result<(), NodeError> {
        self.ack_tx
            .send(AckEvent {
                from: from.into(),
                value,
            })
            .await
            .map_err(|_| NodeError::EngineClosed)
    }
}

/// Peer id -> time of the last gossip send still awaiting an ack.
type PendingAcks = HashMap<String, Instant>;

/// The single-owner control loop behind the broadcast guarantee.
///
/// Reacts to three event sources with no fixed priority: gossip events
/// (fan a value out to the current peers minus its origin), ack events
/// (clear pending entries) and a periodic tick (resend anything overdue).
#[derive(Debug)]
pub struct GossipEngine<T: Transport> {
    transport: Arc<T>,
    topology: Arc<TopologyStore>,
    config: EngineConfig,
    gossip_rx: mpsc::Receiver<GossipEvent>,
    ack_rx: mpsc::Receiver<AckEvent>,
    /// Value -> peers that have not yet acknowledged it. Mutated only from
    /// `run`; an empty peer map means the entry is removed outright.
    pending: HashMap<Value, PendingAcks>,
}

impl<T: Transport> GossipEngine<T> {
    /// Creates an engine and the handle used to feed it.
    #[must_use]
    pub fn new(
        transport: Arc<T>,
        topology: Arc<TopologyStore>,
        config: EngineConfig,
    ) -> (Self, GossipHandle) {
        let (gossip_tx, gossip_rx) = mpsc::channel(config.gossip_inbox);
        let (ack_tx, ack_rx) = mpsc::channel(config.ack_inbox);

        let engine = Self {
            transport,
            topology,
            config,
            gossip_rx,
            ack_rx,
            pending: HashMap::new(),
        };
        (engine, GossipHandle { gossip_tx, ack_tx })
    }

    /// Runs the control loop until both inboxes are closed and drained.
    ///
    /// Pending entries still unacknowledged at shutdown are discarded.
    pub async fn run(mut self) {
        let mut ticker = time::interval(self.config.tick_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let mut gossip_open = true;
        let mut ack_open = true;

        debug!("gossip engine started");
        while gossip_open || ack_open {
            tokio::select! {
                event = self.gossip_rx.recv(), if gossip_open => match event {
                    Some(event) => self.fan_out(&event),
                    None => gossip_open = false,
                },
                ack = self.ack_rx.recv(), if ack_open => match ack {
                    Some(ack) => self.record_ack(&ack),
                    None => ack_open = false,
                },
                _ = ticker.tick() => self.retry_overdue(),
            }
        }
        debug!(
            pending_values = self.pending.len(),
            "gossip engine stopped"
        );
    }

    /// Sends a value to every current peer except its origin and records the
    /// sends as pending.
    fn fan_out(&mut self, event: &GossipEvent) {
        let peers: Vec<String> = self
            .topology
            .current_peers()
            .into_iter()
            .filter(|peer| *peer != event.origin)
            .collect();

        if peers.is_empty() {
            debug!(value = event.value, "no peers to gossip to");
            return;
        }

        for peer in peers {
            self.send_gossip(&peer, event.value);
        }
    }

    /// Clears one peer's pending entry. Acks for unknown or already-cleared
    /// values arrive legitimately (late or duplicated) and are ignored.
    fn record_ack(&mut self, ack: &AckEvent) {
        let Some(acks) = self.pending.get_mut(&ack.value) else {
            debug!(value = ack.value, from = %ack.from, "ack for cleared value ignored");
            return;
        };

        if acks.remove(&ack.from).is_none() {
            debug!(value = ack.value, from = %ack.from, "duplicate ack ignored");
        }
        if acks.is_empty() {
            debug!(value = ack.value, "fully acknowledged");
            self.pending.remove(&ack.value);
        }
    }

    /// Resends every pending entry older than the retry deadline.
    ///
    /// Retries re-check the current topology: a pending peer that has been
    /// dropped from the peer list is removed instead of resent, so topology
    /// changes take effect promptly.
    fn retry_overdue(&mut self) {
        let now = Instant::now();
        let current: HashSet<String> = self.topology.current_peers().into_iter().collect();
        let retry_after = self.config.retry_after;

        let mut overdue = Vec::new();
        for (value, acks) in &mut self.pending {
            acks.retain(|peer, _| {
                let keep = current.contains(peer);
                if !keep {
                    debug!(value, peer = %peer, "dropping pending entry for departed peer");
                }
                keep
            });
            for (peer, last_sent) in acks.iter() {
                if now.duration_since(*last_sent) > retry_after {
                    overdue.push((*value, peer.clone()));
                }
            }
        }
        self.pending.retain(|_, acks| !acks.is_empty());

        for (value, peer) in overdue {
            debug!(value, peer = %peer, "retrying gossip");
            self.send_gossip(&peer, value);
        }
    }

    /// Records the pending timestamp and sends the gossip message. A send
    /// failure is logged and left to the retry sweep.
    fn send_gossip(&mut self, peer: &str, value: Value) {
        self.pending
            .entry(value)
            .or_default()
            .insert(peer.to_string(), Instant::now());

        if let Err(err) = self
            .transport
            .send(peer, Payload::Gossip { message: value })
        {
            warn!(value, peer = %peer, %err, "gossip send failed; will retry");
        }
    }
}
