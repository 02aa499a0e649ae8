//! Cluster event stream
//!
//! Fan-out of membership events to downstream subscribers (partition
//! managers, monitoring, pid-cache invalidation). Publishing never blocks;
//! a slow subscriber observes a lag error on its receiver rather than
//! applying backpressure to the registry.

use crate::registry::LeaderInfo;
use serde::{Deserialize, Serialize};
use shoal_core::constants::EVENT_STREAM_CAPACITY_DEFAULT;
use shoal_core::member::{Member, MemberAddress};
use tokio::sync::broadcast;
use tracing::debug;

/// A membership delta: the event id supplied by the membership source plus
/// the members that joined and left relative to the previous known state
///
/// Constructed fresh per topology update, never reused.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterTopology {
    /// Monotonically increasing delta-sequence number
    pub event_id: u64,
    /// Members present now that were absent before
    pub joined: Vec<Member>,
    /// Members absent now that were present before
    pub left: Vec<Member>,
}

impl ClusterTopology {
    /// Create an empty topology delta for the given event id
    pub fn new(event_id: u64) -> Self {
        Self {
            event_id,
            joined: Vec::new(),
            left: Vec::new(),
        }
    }

    /// Check whether this delta carries no changes
    pub fn is_empty(&self) -> bool {
        self.joined.is_empty() && self.left.is_empty()
    }
}

/// Events published by the member registry
#[derive(Debug, Clone)]
pub enum ClusterEvent {
    /// The membership view changed (possibly a no-op delta; subscribers
    /// must tolerate empty joined/left lists)
    TopologyChanged(ClusterTopology),
    /// A different leader was recorded
    LeaderElected {
        new: LeaderInfo,
        old: Option<LeaderInfo>,
    },
    /// A member's endpoint is gone; cached routes to it are dead
    EndpointTerminated { address: MemberAddress },
}

/// Broadcast-backed publisher of [`ClusterEvent`]s
#[derive(Debug, Clone)]
pub struct EventStream {
    tx: broadcast::Sender<ClusterEvent>,
}

impl EventStream {
    /// Create an event stream with the given buffer capacity
    pub fn new(capacity: usize) -> Self {
        debug_assert!(capacity > 0, "capacity must be positive");
        let (tx, _rx) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Publish an event to all current subscribers
    ///
    /// Publishing with no subscribers is not an error.
    pub fn publish(&self, event: ClusterEvent) {
        debug!(?event, "publishing cluster event");
        let _ = self.tx.send(event);
    }

    /// Subscribe to events published after this call
    pub fn subscribe(&self) -> broadcast::Receiver<ClusterEvent> {
        self.tx.subscribe()
    }

    /// Number of live subscribers
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for EventStream {
    fn default() -> Self {
        Self::new(EVENT_STREAM_CAPACITY_DEFAULT)
    }
}
