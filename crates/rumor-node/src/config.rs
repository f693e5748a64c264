//! Configuration for the gossip engine.

use std::time::Duration;

/// Tuning knobs for [`crate::GossipEngine`].
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Capacity of the gossip-event inbox. A full inbox blocks producers
    /// (backpressure) rather than dropping events.
    pub gossip_inbox: usize,
    /// Capacity of the ack-event inbox, same blocking policy.
    pub ack_inbox: usize,
    /// Interval between retry sweeps of the pending-ack table.
    pub tick_interval: Duration,
    /// How long to wait for a peer's ack before resending.
    pub retry_after: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            gossip_inbox: 128,
            ack_inbox: 128,
            tick_interval: Duration::from_millis(50),
            retry_after: Duration::from_millis(200),
        }
    }
}

impl EngineConfig {
    /// Sets both inbox capacities.
    #[must_use]
    pub const fn with_inbox_capacity(mut self, capacity: usize) -> Self {
        self.gossip_inbox = capacity;
        self.ack_inbox = capacity;
        self
    }

    /// Sets the retry sweep interval.
    #[must_use]
    pub const fn with_tick_interval(mut self, interval: Duration) -> Self {
        self.tick_interval = interval;
        self
    }

    /// Sets the per-peer retry deadline.
    #[must_use]
    pub const fn with_retry_after(mut self, deadline: Duration) -> Self {
        self.retry_after = deadline;
        self
    }
}
