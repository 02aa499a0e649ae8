//! Partition manager
//!
//! Per-member component that hosts one partition owner per locally served
//! kind and feeds registry topology events into every owner, so ownership
//! rebalancing is driven strictly by the registry's membership view rather
//! than ad hoc polling.

use crate::messages::PartitionMessage;
use crate::owner::{PartitionConfig, PartitionOwner, PartitionOwnerHandle};
use crate::watch::ActorWatch;
use shoal_core::remoting::Remoting;
use shoal_membership::events::ClusterEvent;
use shoal_membership::registry::MemberRegistry;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Hosts and wires the partition owners of one member
pub struct PartitionManager {
    registry: Arc<MemberRegistry>,
    remoting: Arc<dyn Remoting>,
    watch: Arc<dyn ActorWatch>,
    config: PartitionConfig,
    owners: HashMap<String, PartitionOwnerHandle>,
    owner_tasks: Vec<JoinHandle<()>>,
    forwarder: Option<JoinHandle<()>>,
}

impl PartitionManager {
    /// Create a manager for the registry's local member
    pub fn new(
        registry: Arc<MemberRegistry>,
        remoting: Arc<dyn Remoting>,
        watch: Arc<dyn ActorWatch>,
        config: PartitionConfig,
    ) -> Self {
        debug_assert!(config.validate().is_ok());

        Self {
            registry,
            remoting,
            watch,
            config,
            owners: HashMap::new(),
            owner_tasks: Vec::new(),
            forwarder: None,
        }
    }

    /// Spawn the partition owner for `kind` (idempotent)
    ///
    /// Kinds must be hosted before [`start`](Self::start) so the forwarding
    /// task sees the complete owner set.
    pub fn host_kind(&mut self, kind: &str) -> PartitionOwnerHandle {
        if let Some(handle) = self.owners.get(kind) {
            return handle.clone();
        }

        let owner = PartitionOwner::new(
            kind,
            self.registry.clone(),
            self.remoting.clone(),
            self.watch.clone(),
            self.config.clone(),
        );
        let handle = owner.handle();
        self.owner_tasks.push(tokio::spawn(owner.run()));
        self.owners.insert(kind.to_string(), handle.clone());

        debug!(kind, "hosting partition owner");
        handle
    }

    /// Spawn partition owners for every kind the local member serves
    pub fn host_local_kinds(&mut self) {
        let kinds = self.registry.local_member().kinds.clone();
        for kind in kinds {
            self.host_kind(&kind);
        }
    }

    /// Handle for the owner of `kind`, if hosted
    pub fn handle(&self, kind: &str) -> Option<&PartitionOwnerHandle> {
        self.owners.get(kind)
    }

    /// Start forwarding topology events to the hosted owners
    pub fn start(&mut self) {
        debug_assert!(self.forwarder.is_none(), "manager already started");

        let mut events = self.registry.events().subscribe();
        let owners = self.owners.clone();

        self.forwarder = Some(tokio::spawn(async move {
            loop {
                match events.recv().await {
                    Ok(ClusterEvent::TopologyChanged(topology)) => {
                        // Leaves first, joins second, matching the registry's
                        // own processing order. Owners only hear about
                        // members that serve their kind.
                        for member in &topology.left {
                            for (kind, handle) in &owners {
                                if member.serves_kind(kind) {
                                    let _ = handle
                                        .notify(PartitionMessage::MemberLeft {
                                            member: member.clone(),
                                        })
                                        .await;
                                }
                            }
                        }
                        for member in &topology.joined {
                            for (kind, handle) in &owners {
                                if member.serves_kind(kind) {
                                    let _ = handle
                                        .notify(PartitionMessage::MemberJoined {
                                            member: member.clone(),
                                        })
                                        .await;
                                }
                            }
                        }
                    }
                    Ok(_) => {}
                    Err(tokio::sync::broadcast::error::RecvError::Lagged(skipped)) => {
                        warn!(skipped, "partition manager lagged behind cluster events");
                    }
                    Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
                }
            }
        }));
    }

    /// Stop the forwarding task and every hosted owner
    pub async fn stop(&mut self) {
        if let Some(forwarder) = self.forwarder.take() {
            forwarder.abort();
        }

        for handle in self.owners.values() {
            let _ = handle.stop().await;
        }
        for task in self.owner_tasks.drain(..) {
            let _ = task.await;
        }
        self.owners.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryCluster;
    use shoal_core::member::{Member, MemberId};
    use shoal_membership::strategy::round_robin_factory;

    fn member(name: &str, port: u16, kinds: &[&str]) -> Member {
        Member::new(
            MemberId::new(name).unwrap(),
            "127.0.0.1",
            port,
            kinds.iter().map(|k| k.to_string()).collect(),
        )
    }

    fn manager_for(local: Member) -> (Arc<MemberRegistry>, PartitionManager) {
        let cluster = Arc::new(MemoryCluster::new());
        let registry = Arc::new(MemberRegistry::new(
            local,
            round_robin_factory(),
            cluster.clone(),
        ));
        let manager = PartitionManager::new(
            registry.clone(),
            cluster.clone(),
            cluster,
            PartitionConfig::for_testing(),
        );
        (registry, manager)
    }

    #[tokio::test]
    async fn test_host_kind_is_idempotent() {
        let (_registry, mut manager) = manager_for(member("m1", 8001, &["greeter"]));

        let a = manager.host_kind("greeter");
        let b = manager.host_kind("greeter");
        assert_eq!(a.kind(), b.kind());
        assert_eq!(manager.owner_tasks.len(), 1);

        manager.stop().await;
    }

    #[tokio::test]
    async fn test_host_local_kinds() {
        let (_registry, mut manager) = manager_for(member("m1", 8001, &["greeter", "worker"]));

        manager.host_local_kinds();
        assert!(manager.handle("greeter").is_some());
        assert!(manager.handle("worker").is_some());
        assert!(manager.handle("mailer").is_none());

        manager.stop().await;
    }
}
