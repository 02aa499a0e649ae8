//! In-memory cluster harness
//!
//! Implements the remoting and watch seams over channels, simulating the
//! transport and the local actor runtime for tests: partition owner
//! mailboxes are registered under their well-known locations, spawns are
//! counted and can be failed on demand, and watched actors can be killed
//! to drive termination notices.

use crate::messages::PartitionMessage;
use crate::watch::{ActorWatch, OwnerMailbox};
use async_trait::async_trait;
use bytes::Bytes;
use shoal_core::error::{Error, Result};
use shoal_core::identity::ClusterIdentity;
use shoal_core::member::{ActorLocation, MemberAddress};
use shoal_core::messages::{RemoteMessage, SpawnOutcome};
use shoal_core::remoting::Remoting;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, RwLock};
use std::time::Duration;
use tracing::debug;

/// Fault injected into the next remote spawn
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpawnFault {
    /// The spawn does not complete within the timeout
    Timeout,
    /// The spawn fails definitively
    Fail,
}

/// In-memory transport and actor runtime for a simulated cluster
#[derive(Default)]
pub struct MemoryCluster {
    /// Partition owner mailboxes by well-known location
    partitions: RwLock<HashMap<ActorLocation, OwnerMailbox>>,
    /// Watchers per actor location
    watches: RwLock<HashMap<ActorLocation, Vec<OwnerMailbox>>>,
    /// Recorded event-stream broadcasts (target address, payload)
    broadcasts: Mutex<Vec<(MemberAddress, Bytes)>>,
    /// Spawn count per identity
    spawn_counts: Mutex<HashMap<ClusterIdentity, u64>>,
    /// Sequence for unique actor names across re-spawns
    spawn_sequence: AtomicU64,
    /// Fault injected into the next spawn, if any
    next_fault: Mutex<Option<SpawnFault>>,
}

impl MemoryCluster {
    /// Create an empty simulated cluster
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a partition owner's mailbox under its well-known location
    pub fn register_partition(&self, location: ActorLocation, mailbox: OwnerMailbox) {
        self.partitions
            .write()
            .expect("partitions lock poisoned")
            .insert(location, mailbox);
    }

    /// Inject a fault into the next remote spawn
    pub fn fail_next_spawn(&self, fault: SpawnFault) {
        *self.next_fault.lock().expect("fault lock poisoned") = Some(fault);
    }

    /// Terminate a simulated actor, notifying every watcher
    pub async fn kill_actor(&self, location: &ActorLocation) {
        let watchers = self
            .watches
            .write()
            .expect("watches lock poisoned")
            .remove(location)
            .unwrap_or_default();

        for mailbox in watchers {
            let _ = mailbox
                .send(PartitionMessage::Terminated {
                    location: location.clone(),
                })
                .await;
        }
    }

    /// Spawn count for one identity
    pub fn spawn_count(&self, identity: &ClusterIdentity) -> u64 {
        self.spawn_counts
            .lock()
            .expect("spawn counts lock poisoned")
            .get(identity)
            .copied()
            .unwrap_or(0)
    }

    /// Total spawns across all identities
    pub fn total_spawn_count(&self) -> u64 {
        self.spawn_counts
            .lock()
            .expect("spawn counts lock poisoned")
            .values()
            .sum()
    }

    /// Recorded event-stream broadcasts
    pub fn broadcasts(&self) -> Vec<(MemberAddress, Bytes)> {
        self.broadcasts
            .lock()
            .expect("broadcasts lock poisoned")
            .clone()
    }

    /// Number of locations currently watched
    pub fn watched_count(&self) -> usize {
        self.watches.read().expect("watches lock poisoned").len()
    }
}

#[async_trait]
impl Remoting for MemoryCluster {
    async fn send(&self, target: &ActorLocation, message: RemoteMessage) -> Result<()> {
        match message {
            RemoteMessage::TakeOwnership { identity, location } => {
                let mailbox = self
                    .partitions
                    .read()
                    .expect("partitions lock poisoned")
                    .get(target)
                    .cloned();

                let Some(mailbox) = mailbox else {
                    return Err(Error::send_failed(
                        target.to_string(),
                        "unknown partition owner",
                    ));
                };

                mailbox
                    .send(PartitionMessage::TakeOwnership { identity, location })
                    .await
                    .map_err(|_| Error::send_failed(target.to_string(), "mailbox closed"))
            }
            RemoteMessage::Event { payload } => {
                self.broadcasts
                    .lock()
                    .expect("broadcasts lock poisoned")
                    .push((target.address.clone(), payload));
                Ok(())
            }
        }
    }

    async fn spawn_remote(
        &self,
        activator: &MemberAddress,
        identity: &ClusterIdentity,
        _timeout: Duration,
    ) -> SpawnOutcome {
        // Injected faults model the transport's timeout/failure reporting.
        if let Some(fault) = self.next_fault.lock().expect("fault lock poisoned").take() {
            debug!(%identity, ?fault, "injected spawn fault");
            return match fault {
                SpawnFault::Timeout => SpawnOutcome::Timeout,
                SpawnFault::Fail => SpawnOutcome::Error("injected spawn failure".into()),
            };
        }

        let sequence = self.spawn_sequence.fetch_add(1, Ordering::SeqCst) + 1;
        *self
            .spawn_counts
            .lock()
            .expect("spawn counts lock poisoned")
            .entry(identity.clone())
            .or_insert(0) += 1;

        let actor = format!("{}#{}", identity.identity(), sequence);
        SpawnOutcome::Ok(ActorLocation::new(activator.clone(), actor))
    }
}

#[async_trait]
impl ActorWatch for MemoryCluster {
    async fn watch(&self, location: &ActorLocation, mailbox: OwnerMailbox) {
        self.watches
            .write()
            .expect("watches lock poisoned")
            .entry(location.clone())
            .or_default()
            .push(mailbox);
    }

    async fn unwatch(&self, location: &ActorLocation, mailbox: &OwnerMailbox) {
        let mut watches = self.watches.write().expect("watches lock poisoned");
        if let Some(watchers) = watches.get_mut(location) {
            watchers.retain(|w| !w.same_channel(mailbox));
            if watchers.is_empty() {
                watches.remove(location);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;

    fn location(port: u16, actor: &str) -> ActorLocation {
        ActorLocation::new(MemberAddress::new("127.0.0.1", port), actor)
    }

    #[tokio::test]
    async fn test_spawn_produces_unique_actor_names() {
        let cluster = MemoryCluster::new();
        let identity = ClusterIdentity::new("greeter", "alice").unwrap();
        let activator = MemberAddress::new("127.0.0.1", 8000);

        let a = cluster
            .spawn_remote(&activator, &identity, Duration::from_millis(100))
            .await;
        let b = cluster
            .spawn_remote(&activator, &identity, Duration::from_millis(100))
            .await;

        match (a, b) {
            (SpawnOutcome::Ok(la), SpawnOutcome::Ok(lb)) => assert_ne!(la, lb),
            other => panic!("unexpected outcomes: {:?}", other),
        }
        assert_eq!(cluster.spawn_count(&identity), 2);
    }

    #[tokio::test]
    async fn test_fault_injection_is_one_shot() {
        let cluster = MemoryCluster::new();
        let identity = ClusterIdentity::new("greeter", "alice").unwrap();
        let activator = MemberAddress::new("127.0.0.1", 8000);

        cluster.fail_next_spawn(SpawnFault::Timeout);
        let first = cluster
            .spawn_remote(&activator, &identity, Duration::from_millis(100))
            .await;
        assert_eq!(first, SpawnOutcome::Timeout);
        assert_eq!(cluster.spawn_count(&identity), 0);

        let second = cluster
            .spawn_remote(&activator, &identity, Duration::from_millis(100))
            .await;
        assert!(matches!(second, SpawnOutcome::Ok(_)));
    }

    #[tokio::test]
    async fn test_send_to_unknown_partition_fails() {
        let cluster = MemoryCluster::new();
        let identity = ClusterIdentity::new("greeter", "alice").unwrap();
        let result = cluster
            .send(
                &location(8000, "partition-greeter"),
                RemoteMessage::TakeOwnership {
                    identity,
                    location: location(8001, "alice#1"),
                },
            )
            .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_watch_unwatch_kill() {
        let cluster = MemoryCluster::new();
        let (tx, mut rx) = mpsc::channel(8);
        let target = location(8000, "alice#1");

        cluster.watch(&target, tx.clone()).await;
        assert_eq!(cluster.watched_count(), 1);

        cluster.kill_actor(&target).await;
        match rx.recv().await.unwrap() {
            PartitionMessage::Terminated { location } => assert_eq!(location, target),
            other => panic!("unexpected message: {:?}", other),
        }
        assert_eq!(cluster.watched_count(), 0);

        // Unwatch after the entry is gone is a no-op.
        cluster.unwatch(&target, &tx).await;
    }
}
