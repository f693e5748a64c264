//! Transport seam between the node and the outside world.
//!
//! The engine and handlers only see the [`Transport`] trait: a best-effort
//! `send`, a request/reply correlation helper and the node's own identity.
//! Production uses [`StdioTransport`], which speaks newline-delimited JSON
//! on stdout (the maelstrom convention); stderr is left to logging.

use std::io::Write;
use std::sync::atomic::{AtomicU64, Ordering};

use once_cell::sync::OnceCell;
use parking_lot::Mutex;
use rumor_proto::{Body, Message, Payload};
use tracing::warn;

use crate::error::NodeError;

/// Outbound side of the message transport.
///
/// Sends are best-effort: a failure is non-fatal to the node, since the
/// engine's retry sweep owns recovery for gossip traffic.
pub trait Transport: Send + Sync + 'static {
    /// This node's identifier, `None` before the init handshake.
    fn node_id(&self) -> Option<String>;

    /// Assigns this node's identity. Called exactly once, before any send;
    /// later calls are ignored.
    fn initialize(&self, node_id: String);

    /// Sends a payload to `dest`.
    fn send(&self, dest: &str, payload: Payload) -> Result<(), NodeError>;

    /// Replies to a request, correlating via its `msg_id`.
    fn reply(&self, request: &Message, payload: Payload) -> Result<(), NodeError>;
}

/// JSON-lines transport over stdout.
#[derive(Debug)]
pub struct StdioTransport {
    node_id: OnceCell<String>,
    next_msg_id: AtomicU64,
    out: Mutex<std::io::Stdout>,
}

impl Default for StdioTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl StdioTransport {
    /// Creates a transport writing to this process's stdout.
    #[must_use]
    pub fn new() -> Self {
        Self {
            node_id: OnceCell::new(),
            next_msg_id: AtomicU64::new(1),
            out: Mutex::new(std::io::stdout()),
        }
    }

    fn write_message(&self, dest: &str, body: Body) -> Result<(), NodeError> {
        let src = self.node_id().ok_or(NodeError::NotInitialized)?;
        let line = serde_json::to_string(&Message::new(src, dest, body))?;

        // One locked write per message keeps lines whole under concurrent
        // handler tasks.
        let mut out = self.out.lock();
        writeln!(out, "{line}")?;
        out.flush()?;
        Ok(())
    }

    fn next_msg_id(&self) -> u64 {
        self.next_msg_id.fetch_add(1, Ordering::Relaxed)
    }
}

impl Transport for StdioTransport {
    fn node_id(&self) -> Option<String> {
        self.node_id.get().cloned()
    }

    fn initialize(&self, node_id: String) {
        if self.node_id.set(node_id).is_err() {
            warn!("duplicate init ignored; node id already assigned");
        }
    }

    fn send(&self, dest: &str, payload: Payload) -> Result<(), NodeError> {
        self.write_message(dest, Body::request(self.next_msg_id(), payload))
    }

    fn reply(&self, request: &Message, payload: Payload) -> Result<(), NodeError> {
        let body = Body {
            msg_id: Some(self.next_msg_id()),
            in_reply_to: request.body.msg_id,
            payload,
        };
        self.write_message(&request.src, body)
    }
}

#[cfg(test)]
pub(crate) mod mock {
    //! In-memory transport for engine and handler tests.

    use std::sync::atomic::AtomicBool;

    use super::*;

    /// Records every send and reply instead of touching the network.
    #[derive(Debug, Default)]
    pub struct MockTransport {
        node_id: OnceCell<String>,
        sends: Mutex<Vec<(String, Payload)>>,
        replies: Mutex<Vec<(String, Payload)>>,
        fail_sends: AtomicBool,
    }

    impl MockTransport {
        pub fn with_node_id(node_id: &str) -> Self {
            let transport = Self::default();
            transport.initialize(node_id.to_string());
            transport
        }

        /// Makes every subsequent `send` fail with an IO error.
        pub fn fail_sends(&self) {
            self.fail_sends.store(true, Ordering::SeqCst);
        }

        /// All `(dest, payload)` pairs sent so far.
        pub fn sends(&self) -> Vec<(String, Payload)> {
            self.sends.lock().clone()
        }

        /// Payloads sent to one destination.
        pub fn sends_to(&self, dest: &str) -> Vec<Payload> {
            self.sends
                .lock()
                .iter()
                .filter(|(d, _)| d == dest)
                .map(|(_, p)| p.clone())
                .collect()
        }

        /// All `(dest, payload)` replies so far.
        pub fn replies(&self) -> Vec<(String, Payload)> {
            self.replies.lock().clone()
        }
    }

    impl Transport for MockTransport {
        fn node_id(&self) -> Option<String> {
            self.node_id.get().cloned()
        }

        fn initialize(&self, node_id: String) {
            let _ = self.node_id.set(node_id);
        }

        fn send(&self, dest: &str, payload: Payload) -> Result<(), NodeError> {
            if self.fail_sends.load(Ordering::SeqCst) {
                return Err(NodeError::Io(std::io::Error::other("peer unreachable")));
            }
            self.sends.lock().push((dest.to_string(), payload));
            Ok(())
        }

        fn reply(&self, request: &Message, payload: Payload) -> Result<(), NodeError> {
            self.replies.lock().push((request.src.clone(), payload));
            Ok(())
        }
    }
}
