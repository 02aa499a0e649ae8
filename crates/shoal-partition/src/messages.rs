//! Partition owner mailbox messages
//!
//! The owner processes these strictly one at a time in arrival order, so its
//! identity table needs no locking. The union is closed; variants the owner
//! has no work for fall through to a safe no-op.

use shoal_core::identity::ClusterIdentity;
use shoal_core::member::{ActorLocation, Member};
use shoal_core::messages::{ActivationResponse, SpawnOutcome};
use std::collections::HashMap;
use tokio::sync::oneshot;

/// Messages handled by a partition owner
#[derive(Debug)]
pub enum PartitionMessage {
    /// Owner task came up
    Started,

    /// Resolve (spawning on demand) the location of an identity
    PidRequest {
        identity: ClusterIdentity,
        reply: oneshot::Sender<ActivationResponse>,
    },

    /// Completion of an in-flight remote spawn, re-enqueued so the result
    /// is applied inside the owner's sequential processing
    SpawnComplete {
        identity: ClusterIdentity,
        outcome: SpawnOutcome,
        reply: oneshot::Sender<ActivationResponse>,
    },

    /// A watched actor terminated
    Terminated { location: ActorLocation },

    /// Ownership transfer arriving on the (presumed) new owner
    TakeOwnership {
        identity: ClusterIdentity,
        location: ActorLocation,
    },

    /// A member serving this kind joined the cluster
    MemberJoined { member: Member },

    /// A member left the cluster
    MemberLeft { member: Member },

    /// Report the current ownership table (diagnostics)
    Snapshot {
        reply: oneshot::Sender<PartitionSnapshot>,
    },

    /// Shut the owner down
    Stop,
}

/// Point-in-time view of a partition owner's table
#[derive(Debug, Clone)]
pub struct PartitionSnapshot {
    /// The owner's kind
    pub kind: String,
    /// identity → location entries currently owned locally
    pub entries: HashMap<String, ActorLocation>,
}

impl PartitionSnapshot {
    /// Number of locally owned identities
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check whether the table is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Check whether `identity` is owned locally
    pub fn owns(&self, identity: &str) -> bool {
        self.entries.contains_key(identity)
    }
}

impl PartitionMessage {
    /// Short name for log lines
    pub fn name(&self) -> &'static str {
        match self {
            Self::Started => "started",
            Self::PidRequest { .. } => "pid_request",
            Self::SpawnComplete { .. } => "spawn_complete",
            Self::Terminated { .. } => "terminated",
            Self::TakeOwnership { .. } => "take_ownership",
            Self::MemberJoined { .. } => "member_joined",
            Self::MemberLeft { .. } => "member_left",
            Self::Snapshot { .. } => "snapshot",
            Self::Stop => "stop",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_names() {
        let (tx, _rx) = oneshot::channel();
        let msg = PartitionMessage::PidRequest {
            identity: ClusterIdentity::new("greeter", "alice").unwrap(),
            reply: tx,
        };
        assert_eq!(msg.name(), "pid_request");
        assert_eq!(PartitionMessage::Stop.name(), "stop");
    }
}
