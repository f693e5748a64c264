//! Message envelope shared by every payload type.

use serde::{Deserialize, Serialize};

use crate::payload::Payload;

/// A single wire message between two nodes (or a client and a node).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Message {
    /// Identifier of the sender ("n1", "c3", ...).
    pub src: String,
    /// Identifier of the recipient.
    pub dest: String,
    /// The message body.
    pub body: Body,
}

impl Message {
    /// Creates a message addressed from `src` to `dest`.
    #[must_use]
    pub fn new(src: impl Into<String>, dest: impl Into<String>, body: Body) -> Self {
        Self {
            src: src.into(),
            dest: dest.into(),
            body,
        }
    }
}

/// Message body: correlation ids plus the typed payload, flattened on the
/// wire so the payload's `type` tag sits alongside `msg_id`/`in_reply_to`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Body {
    /// Sender-assigned id, unique per sender.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub msg_id: Option<u64>,
    /// The `msg_id` of the request this body answers, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub in_reply_to: Option<u64>,
    /// The typed payload.
    #[serde(flatten)]
    pub payload: Payload,
}

impl Body {
    /// Creates a request body with the given id.
    #[must_use]
    pub const fn request(msg_id: u64, payload: Payload) -> Self {
        Self {
            msg_id: Some(msg_id),
            in_reply_to: None,
            payload,
        }
    }

    /// Creates a reply body correlated to a request id.
    #[must_use]
    pub const fn reply_to(in_reply_to: u64, msg_id: u64, payload: Payload) -> Self {
        Self {
            msg_id: Some(msg_id),
            in_reply_to: Some(in_reply_to),
            payload,
        }
    }

    /// Creates a fire-and-forget body with no correlation ids.
    #[must_use]
    pub const fn bare(payload: Payload) -> Self {
        Self {
            msg_id: None,
            in_reply_to: None,
            payload,
        }
    }
}
