//! # rumor-proto
//!
//! Protocol definitions for the rumor broadcast workload.
//!
//! Nodes exchange newline-delimited JSON envelopes. Each [`Message`] carries
//! a source, a destination and a [`Body`] whose payload is an internally
//! tagged [`Payload`] variant (`"type"` field on the wire).

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod envelope;
pub mod payload;

pub use envelope::{Body, Message};
pub use payload::{Payload, Value, MALFORMED_REQUEST};
