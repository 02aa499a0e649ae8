//! Partition owner
//!
//! One logical instance per kind, replicated identically on every member.
//! Owns the identity→location table for its kind on the local member and
//! implements the placement, activation, and ownership-transfer protocols.
//!
//! All operations are processed one at a time in arrival order from the
//! owner's mailbox, so the table needs no locking. A remote spawn suspends
//! only the continuation for that request: the spawn runs in a detached
//! task and its result is re-enqueued as a `SpawnComplete` message, applied
//! inside the same sequential loop.

use crate::messages::{PartitionMessage, PartitionSnapshot};
use crate::router::PartitionRouter;
use crate::watch::{ActorWatch, OwnerMailbox};
use shoal_core::constants::{
    PARTITION_MAILBOX_DEPTH_DEFAULT, PARTITION_MAILBOX_DEPTH_MAX, SPAWN_TIMEOUT_MS_DEFAULT,
    SPAWN_TIMEOUT_MS_MAX,
};
use shoal_core::error::{Error, Result};
use shoal_core::identity::ClusterIdentity;
use shoal_core::member::{ActorLocation, Member, MemberAddress};
use shoal_core::messages::{ActivationResponse, RemoteMessage, SpawnOutcome};
use shoal_core::remoting::Remoting;
use shoal_membership::registry::MemberRegistry;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};

/// Configuration for a partition owner
#[derive(Debug, Clone)]
pub struct PartitionConfig {
    /// Remote spawn timeout in milliseconds
    pub spawn_timeout_ms: u64,
    /// Mailbox capacity
    pub mailbox_capacity: usize,
}

impl Default for PartitionConfig {
    fn default() -> Self {
        Self {
            spawn_timeout_ms: SPAWN_TIMEOUT_MS_DEFAULT,
            mailbox_capacity: PARTITION_MAILBOX_DEPTH_DEFAULT,
        }
    }
}

impl PartitionConfig {
    /// Configuration with short timeouts for tests
    pub fn for_testing() -> Self {
        Self {
            spawn_timeout_ms: 500,
            mailbox_capacity: 64,
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> std::result::Result<(), String> {
        if self.spawn_timeout_ms == 0 || self.spawn_timeout_ms > SPAWN_TIMEOUT_MS_MAX {
            return Err(format!(
                "spawn timeout must be in 1..={}ms",
                SPAWN_TIMEOUT_MS_MAX
            ));
        }
        if self.mailbox_capacity == 0 || self.mailbox_capacity > PARTITION_MAILBOX_DEPTH_MAX {
            return Err(format!(
                "mailbox capacity must be in 1..={}",
                PARTITION_MAILBOX_DEPTH_MAX
            ));
        }
        Ok(())
    }
}

/// Handle for sending messages to a partition owner
#[derive(Debug, Clone)]
pub struct PartitionOwnerHandle {
    kind: String,
    tx: mpsc::Sender<PartitionMessage>,
}

impl PartitionOwnerHandle {
    /// The owner's kind
    pub fn kind(&self) -> &str {
        &self.kind
    }

    /// Sender half of the owner's mailbox (for hosting glue and watches)
    pub fn mailbox(&self) -> OwnerMailbox {
        self.tx.clone()
    }

    /// Resolve (spawning on demand) the location of `identity`
    pub async fn request_pid(&self, identity: ClusterIdentity) -> Result<ActivationResponse> {
        let (reply, rx) = oneshot::channel();
        self.notify(PartitionMessage::PidRequest { identity, reply })
            .await?;
        rx.await.map_err(|_| Error::PartitionClosed {
            kind: self.kind.clone(),
        })
    }

    /// Report the current ownership table
    pub async fn snapshot(&self) -> Result<PartitionSnapshot> {
        let (reply, rx) = oneshot::channel();
        self.notify(PartitionMessage::Snapshot { reply }).await?;
        rx.await.map_err(|_| Error::PartitionClosed {
            kind: self.kind.clone(),
        })
    }

    /// Enqueue a message for the owner
    pub async fn notify(&self, message: PartitionMessage) -> Result<()> {
        self.tx
            .send(message)
            .await
            .map_err(|_| Error::PartitionClosed {
                kind: self.kind.clone(),
            })
    }

    /// Ask the owner task to stop
    pub async fn stop(&self) -> Result<()> {
        self.notify(PartitionMessage::Stop).await
    }
}

/// The per-kind partition owner
pub struct PartitionOwner {
    kind: String,
    local_address: MemberAddress,
    registry: Arc<MemberRegistry>,
    remoting: Arc<dyn Remoting>,
    watch: Arc<dyn ActorWatch>,
    config: PartitionConfig,
    /// identity → location of actors owned locally
    lookup: HashMap<String, ActorLocation>,
    /// location → identity, for O(1) removal on termination
    reverse: HashMap<ActorLocation, String>,
    rx: mpsc::Receiver<PartitionMessage>,
    tx: mpsc::Sender<PartitionMessage>,
}

impl PartitionOwner {
    /// Create a partition owner for `kind` on the registry's local member
    pub fn new(
        kind: impl Into<String>,
        registry: Arc<MemberRegistry>,
        remoting: Arc<dyn Remoting>,
        watch: Arc<dyn ActorWatch>,
        config: PartitionConfig,
    ) -> Self {
        let kind = kind.into();
        debug_assert!(!kind.is_empty(), "kind must not be empty");
        debug_assert!(config.validate().is_ok());

        let (tx, rx) = mpsc::channel(config.mailbox_capacity);
        let local_address = registry.local_member().address();

        Self {
            kind,
            local_address,
            registry,
            remoting,
            watch,
            config,
            lookup: HashMap::new(),
            reverse: HashMap::new(),
            rx,
            tx,
        }
    }

    /// Handle for sending messages to this owner
    pub fn handle(&self) -> PartitionOwnerHandle {
        PartitionOwnerHandle {
            kind: self.kind.clone(),
            tx: self.tx.clone(),
        }
    }

    /// Process messages until the mailbox closes or `Stop` arrives
    pub async fn run(mut self) {
        debug!(kind = %self.kind, address = %self.local_address, "partition owner started");

        while let Some(message) = self.rx.recv().await {
            match message {
                PartitionMessage::Started => {
                    debug!(kind = %self.kind, "partition owner ready");
                }
                PartitionMessage::PidRequest { identity, reply } => {
                    self.handle_pid_request(identity, reply).await;
                }
                PartitionMessage::SpawnComplete {
                    identity,
                    outcome,
                    reply,
                } => {
                    self.handle_spawn_complete(identity, outcome, reply).await;
                }
                PartitionMessage::Terminated { location } => {
                    self.handle_terminated(location);
                }
                PartitionMessage::TakeOwnership { identity, location } => {
                    self.handle_take_ownership(identity, location).await;
                }
                PartitionMessage::MemberJoined { member } => {
                    self.handle_member_joined(member).await;
                }
                PartitionMessage::MemberLeft { member } => {
                    self.handle_member_left(member).await;
                }
                PartitionMessage::Snapshot { reply } => {
                    let _ = reply.send(PartitionSnapshot {
                        kind: self.kind.clone(),
                        entries: self.lookup.clone(),
                    });
                }
                PartitionMessage::Stop => break,
            }
        }

        debug!(kind = %self.kind, "partition owner stopped");
    }

    // =========================================================================
    // Activation
    // =========================================================================

    async fn handle_pid_request(
        &mut self,
        identity: ClusterIdentity,
        reply: oneshot::Sender<ActivationResponse>,
    ) {
        debug_assert_eq!(identity.kind(), self.kind);

        // Idempotent lookup: a known identity answers immediately.
        if let Some(location) = self.lookup.get(identity.identity()) {
            let _ = reply.send(ActivationResponse::ok(location.clone()));
            return;
        }

        let Some(activator) = self.registry.activator_for_kind(&self.kind).await else {
            warn!(kind = %self.kind, "no members currently available");
            let _ = reply.send(ActivationResponse::Unavailable);
            return;
        };

        // Issue the remote spawn without blocking the mailbox: the result
        // comes back as a SpawnComplete message and is applied in order.
        let remoting = Arc::clone(&self.remoting);
        let mailbox = self.tx.clone();
        let timeout = Duration::from_millis(self.config.spawn_timeout_ms);
        tokio::spawn(async move {
            debug!(%activator, %identity, "spawning remote actor");
            let outcome = remoting.spawn_remote(&activator, &identity, timeout).await;
            // If the owner is gone the reply sender is dropped with the
            // message and the caller observes a closed channel.
            let _ = mailbox
                .send(PartitionMessage::SpawnComplete {
                    identity,
                    outcome,
                    reply,
                })
                .await;
        });
    }

    async fn handle_spawn_complete(
        &mut self,
        identity: ClusterIdentity,
        outcome: SpawnOutcome,
        reply: oneshot::Sender<ActivationResponse>,
    ) {
        // Re-check the table first: a concurrent activation or an
        // ownership-transfer race may have registered the identity while the
        // spawn was in flight. The authoritative entry wins over a late
        // spawn confirmation.
        if let Some(existing) = self.lookup.get(identity.identity()) {
            let _ = reply.send(ActivationResponse::ok(existing.clone()));
            return;
        }

        match outcome {
            SpawnOutcome::Ok(location) => {
                self.register(identity.identity().to_string(), location.clone())
                    .await;
                let _ = reply.send(ActivationResponse::ok(location));
            }
            SpawnOutcome::Timeout => {
                warn!(kind = %self.kind, %identity, "remote spawn timed out");
                let _ = reply.send(ActivationResponse::Timeout);
            }
            SpawnOutcome::Error(reason) => {
                warn!(kind = %self.kind, %identity, reason, "remote spawn failed");
                let _ = reply.send(ActivationResponse::Error);
            }
        }
    }

    // =========================================================================
    // Ownership
    // =========================================================================

    async fn handle_take_ownership(&mut self, identity: ClusterIdentity, location: ActorLocation) {
        // Check again whether we are still the owner of this identity; rapid
        // churn can deliver a transfer to a stale target.
        match self.registry.owner_for(&identity).await {
            Some(address) if address != self.local_address => {
                let target = PartitionRouter::remote_partition(&address, &self.kind);
                warn!(
                    %identity,
                    owner = %target,
                    "identity is not ours, forwarding take-ownership to correct owner"
                );
                let message = RemoteMessage::TakeOwnership { identity, location };
                if let Err(error) = self.remoting.send(&target, message).await {
                    warn!(%target, %error, "take-ownership forward failed");
                }
            }
            _ => {
                debug!(kind = %self.kind, %identity, %location, "taking ownership");
                self.register(identity.identity().to_string(), location).await;
            }
        }
    }

    async fn handle_member_joined(&mut self, member: Member) {
        info!(kind = %self.kind, member = %member.address(), "member joined");
        self.transfer_ownership().await;
    }

    async fn handle_member_left(&mut self, member: Member) {
        info!(kind = %self.kind, member = %member.address(), "member left");

        // Always redistribute when a member leaves, then drop entries that
        // lived on the departed member: those actors no longer exist and
        // must not be forwarded to.
        self.transfer_ownership().await;
        self.purge_address(&member.address());
    }

    /// Re-derive the owner of every local entry and hand off those that now
    /// belong to a different active member
    async fn transfer_ownership(&mut self) {
        let entries: Vec<(String, ActorLocation)> = self
            .lookup
            .iter()
            .map(|(identity, location)| (identity.clone(), location.clone()))
            .collect();

        let mut transferred: usize = 0;
        for (identity, location) in entries {
            let cluster_identity =
                ClusterIdentity::new_unchecked(self.kind.clone(), identity.clone());
            match self.registry.owner_for(&cluster_identity).await {
                Some(address) if address != self.local_address => {
                    self.transfer_one(cluster_identity, location, address).await;
                    transferred += 1;
                }
                _ => {}
            }
        }

        if transferred > 0 {
            info!(kind = %self.kind, count = transferred, "transferred identities to other members");
        }
    }

    /// Send one identity to its new owner and drop it locally immediately
    ///
    /// No acknowledgment is awaited: a lookup in the brief gap fails and the
    /// caller re-resolves against the already-updated registry.
    async fn transfer_one(
        &mut self,
        identity: ClusterIdentity,
        location: ActorLocation,
        new_owner: MemberAddress,
    ) {
        let target = PartitionRouter::remote_partition(&new_owner, &self.kind);
        let message = RemoteMessage::TakeOwnership {
            identity: identity.clone(),
            location: location.clone(),
        };
        if let Err(error) = self.remoting.send(&target, message).await {
            warn!(%target, %error, "take-ownership send failed");
        }

        self.lookup.remove(identity.identity());
        self.reverse.remove(&location);
        self.watch.unwatch(&location, &self.tx).await;
    }

    fn purge_address(&mut self, address: &MemberAddress) {
        let dead: Vec<(String, ActorLocation)> = self
            .lookup
            .iter()
            .filter(|(_, location)| &location.address == address)
            .map(|(identity, location)| (identity.clone(), location.clone()))
            .collect();

        let purged = dead.len();
        for (identity, location) in dead {
            self.lookup.remove(&identity);
            self.reverse.remove(&location);
        }

        if purged > 0 {
            debug!(kind = %self.kind, %address, purged, "purged entries for departed member");
        }
    }

    fn handle_terminated(&mut self, location: ActorLocation) {
        // One of the actors we manage died; drop it from the table.
        if let Some(identity) = self.reverse.remove(&location) {
            self.lookup.remove(&identity);
            debug!(kind = %self.kind, identity, %location, "watched actor terminated");
        }
    }

    async fn register(&mut self, identity: String, location: ActorLocation) {
        self.lookup.insert(identity.clone(), location.clone());
        self.reverse.insert(location.clone(), identity);
        self.watch.watch(&location, self.tx.clone()).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryCluster;
    use shoal_core::member::{Member, MemberId};
    use shoal_membership::strategy::round_robin_factory;

    fn member(name: &str, port: u16) -> Member {
        Member::new(
            MemberId::new(name).unwrap(),
            "127.0.0.1",
            port,
            vec!["greeter".into()],
        )
    }

    fn identity(name: &str) -> ClusterIdentity {
        ClusterIdentity::new("greeter", name).unwrap()
    }

    async fn start_owner(
        local: Member,
    ) -> (Arc<MemberRegistry>, Arc<MemoryCluster>, PartitionOwnerHandle) {
        let cluster = Arc::new(MemoryCluster::new());
        let registry = Arc::new(MemberRegistry::new(
            local,
            round_robin_factory(),
            cluster.clone(),
        ));
        let owner = PartitionOwner::new(
            "greeter",
            registry.clone(),
            cluster.clone(),
            cluster.clone(),
            PartitionConfig::for_testing(),
        );
        let handle = owner.handle();
        cluster.register_partition(
            PartitionRouter::remote_partition(&registry.local_member().address(), "greeter"),
            handle.mailbox(),
        );
        tokio::spawn(owner.run());
        (registry, cluster, handle)
    }

    #[tokio::test]
    async fn test_unavailable_without_members() {
        let (_registry, _cluster, handle) = start_owner(member("m1", 8001)).await;

        let response = handle.request_pid(identity("alice")).await.unwrap();
        assert_eq!(response, ActivationResponse::Unavailable);
    }

    #[tokio::test]
    async fn test_spawn_and_idempotent_lookup() {
        let local = member("m1", 8001);
        let (registry, cluster, handle) = start_owner(local.clone()).await;
        registry.apply_topology(vec![local.clone()], 1).await;

        let first = handle.request_pid(identity("alice")).await.unwrap();
        let location = first.location().expect("expected OK").clone();
        assert_eq!(location.address, local.address());

        let second = handle.request_pid(identity("alice")).await.unwrap();
        assert_eq!(second.location(), Some(&location));
        assert_eq!(cluster.spawn_count(&identity("alice")), 1);
    }

    #[tokio::test]
    async fn test_spawn_timeout_registers_nothing() {
        let local = member("m1", 8001);
        let (registry, cluster, handle) = start_owner(local.clone()).await;
        registry.apply_topology(vec![local.clone()], 1).await;

        cluster.fail_next_spawn(crate::memory::SpawnFault::Timeout);
        let response = handle.request_pid(identity("alice")).await.unwrap();
        assert_eq!(response, ActivationResponse::Timeout);
        assert!(handle.snapshot().await.unwrap().is_empty());

        // The failure is not sticky: the next request succeeds.
        let response = handle.request_pid(identity("alice")).await.unwrap();
        assert!(response.is_ok());
    }

    #[tokio::test]
    async fn test_spawn_error_registers_nothing() {
        let local = member("m1", 8001);
        let (registry, cluster, handle) = start_owner(local.clone()).await;
        registry.apply_topology(vec![local.clone()], 1).await;

        cluster.fail_next_spawn(crate::memory::SpawnFault::Fail);
        let response = handle.request_pid(identity("alice")).await.unwrap();
        assert_eq!(response, ActivationResponse::Error);
        assert!(handle.snapshot().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_concurrent_requests_converge_on_one_entry() {
        let local = member("m1", 8001);
        let (registry, _cluster, handle) = start_owner(local.clone()).await;
        registry.apply_topology(vec![local.clone()], 1).await;

        let a = handle.clone();
        let b = handle.clone();
        let (ra, rb) = tokio::join!(
            a.request_pid(identity("alice")),
            b.request_pid(identity("alice"))
        );
        let la = ra.unwrap().location().unwrap().clone();
        let lb = rb.unwrap().location().unwrap().clone();

        // Both callers observe the same registered location.
        assert_eq!(la, lb);
        assert_eq!(handle.snapshot().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_terminated_removes_entry() {
        let local = member("m1", 8001);
        let (registry, cluster, handle) = start_owner(local.clone()).await;
        registry.apply_topology(vec![local.clone()], 1).await;

        let response = handle.request_pid(identity("alice")).await.unwrap();
        let location = response.location().unwrap().clone();

        cluster.kill_actor(&location).await;
        // Drain the mailbox past the termination notice.
        let snapshot = handle.snapshot().await.unwrap();
        assert!(snapshot.is_empty());

        // Re-activation spawns a fresh instance.
        let again = handle.request_pid(identity("alice")).await.unwrap();
        assert_ne!(again.location(), Some(&location));
        assert_eq!(cluster.spawn_count(&identity("alice")), 2);
    }
}
