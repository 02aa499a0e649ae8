//! Member registry
//!
//! Owns the authoritative set of active members for the cluster instance:
//! it diffs externally supplied membership snapshots into join/leave deltas,
//! maintains the monotonically growing banned set, hosts one member
//! strategy per kind, tracks the current leader, and publishes cluster
//! events. This is the only cross-cutting shared mutable state in Shoal and
//! every access goes through the bounded reader/writer lock.

use crate::cache::LocationCache;
use crate::events::{ClusterEvent, ClusterTopology, EventStream};
use crate::lock::{BoundedRwLock, LockConfig};
use crate::strategy::{MemberStrategy, StrategyFactory};
use async_trait::async_trait;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use shoal_core::constants::{CLUSTER_MEMBERS_COUNT_MAX, EVENT_STREAM_ACTOR_NAME};
use shoal_core::identity::ClusterIdentity;
use shoal_core::io::{TimeProvider, WallClockTime};
use shoal_core::member::{ActorLocation, Member, MemberAddress, MemberId};
use shoal_core::messages::RemoteMessage;
use shoal_core::remoting::Remoting;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::{debug, info};

/// Leader notification from the external membership source
///
/// Carries the banned-member set known to the leader; the registry merges
/// it unconditionally (banned sets only grow, union semantics).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaderInfo {
    /// Member id of the leader
    pub member_id: MemberId,
    /// Banned member ids known by the leader
    pub banned_members: HashSet<MemberId>,
}

impl LeaderInfo {
    /// Create leader info with an empty banned set
    pub fn new(member_id: MemberId) -> Self {
        Self {
            member_id,
            banned_members: HashSet::new(),
        }
    }

    /// Attach a banned-member set
    pub fn with_banned_members(mut self, banned: HashSet<MemberId>) -> Self {
        self.banned_members = banned;
        self
    }
}

/// Sink for pushing the banned set back to the membership source
///
/// Only invoked while this registry's local member is the recorded leader.
#[async_trait]
pub trait BannedMemberSink: Send + Sync {
    /// Publish the full banned set
    async fn push_banned_members(&self, banned: HashSet<MemberId>);
}

/// Registry configuration
#[derive(Debug, Clone, Default)]
pub struct RegistryConfig {
    /// Bounded-lock acquisition settings
    pub lock: LockConfig,
}

/// State guarded by the registry lock
struct RegistryState {
    members: HashMap<MemberId, Member>,
    banned: HashSet<MemberId>,
    strategies: HashMap<String, Box<dyn MemberStrategy>>,
    leader: Option<LeaderInfo>,
}

/// The member registry
pub struct MemberRegistry {
    /// Descriptor of the member this registry instance runs on
    local: Member,
    state: BoundedRwLock<RegistryState>,
    strategy_factory: StrategyFactory,
    events: EventStream,
    cache: Arc<LocationCache>,
    remoting: Arc<dyn Remoting>,
    banned_sink: Option<Arc<dyn BannedMemberSink>>,
}

impl MemberRegistry {
    /// Create a registry with default configuration
    pub fn new(local: Member, strategy_factory: StrategyFactory, remoting: Arc<dyn Remoting>) -> Self {
        Self::with_config(
            local,
            strategy_factory,
            remoting,
            RegistryConfig::default(),
            Arc::new(WallClockTime::new()),
        )
    }

    /// Create a registry with explicit configuration and time provider
    pub fn with_config(
        local: Member,
        strategy_factory: StrategyFactory,
        remoting: Arc<dyn Remoting>,
        config: RegistryConfig,
        time: Arc<dyn TimeProvider>,
    ) -> Self {
        let state = RegistryState {
            members: HashMap::new(),
            banned: HashSet::new(),
            strategies: HashMap::new(),
            leader: None,
        };

        Self {
            local,
            state: BoundedRwLock::new(state, "member-registry", config.lock, time),
            strategy_factory,
            events: EventStream::default(),
            cache: Arc::new(LocationCache::new()),
            remoting,
            banned_sink: None,
        }
    }

    /// Attach a sink that receives the banned set while leader
    pub fn with_banned_sink(mut self, sink: Arc<dyn BannedMemberSink>) -> Self {
        self.banned_sink = Some(sink);
        self
    }

    /// The member this registry instance runs on
    pub fn local_member(&self) -> &Member {
        &self.local
    }

    /// The registry's event stream
    pub fn events(&self) -> &EventStream {
        &self.events
    }

    /// The remote-location cache purged on topology changes
    pub fn cache(&self) -> &Arc<LocationCache> {
        &self.cache
    }

    /// Failed lock acquisition attempts since creation
    pub fn lock_contention_count(&self) -> u64 {
        self.state.contention_count()
    }

    // =========================================================================
    // Topology
    // =========================================================================

    /// Apply a full membership snapshot with its delta-sequence number
    ///
    /// Filters out banned ids, computes the symmetric difference against the
    /// current member map, processes leaves then joins, and publishes exactly
    /// one topology-changed event per call (empty deltas included).
    pub async fn apply_topology(&self, statuses: Vec<Member>, event_id: u64) {
        debug_assert!(statuses.len() <= CLUSTER_MEMBERS_COUNT_MAX);

        let mut state = self.state.write().await;

        let mut topology = ClusterTopology::new(event_id);

        let admitted: Vec<Member> = statuses
            .into_iter()
            .filter(|s| !state.banned.contains(&s.id))
            .collect();

        let admitted_ids: HashSet<MemberId> = admitted.iter().map(|m| m.id.clone()).collect();

        let left: Vec<Member> = state
            .members
            .values()
            .filter(|m| !admitted_ids.contains(&m.id))
            .cloned()
            .collect();

        for member in left {
            self.member_leave(&mut state, &member).await;
            topology.left.push(member);
        }

        let joined: Vec<Member> = admitted
            .into_iter()
            .filter(|m| !state.members.contains_key(&m.id))
            .collect();

        for member in &joined {
            self.member_join(&mut state, member.clone());
        }
        topology.joined = joined;

        info!(
            event_id,
            joined = topology.joined.len(),
            left = topology.left.len(),
            members = state.members.len(),
            "applied cluster topology"
        );

        self.events.publish(ClusterEvent::TopologyChanged(topology));
    }

    async fn member_leave(&self, state: &mut RegistryState, member: &Member) {
        for kind in &member.kinds {
            let now_empty = match state.strategies.get_mut(kind) {
                Some(strategy) => {
                    strategy.remove_member(&member.id);
                    strategy.members().is_empty()
                }
                None => continue,
            };
            if now_empty {
                state.strategies.remove(kind);
            }
        }

        // A member that leaves is banned from rejoining under the same id.
        state.banned.insert(member.id.clone());
        state.members.remove(&member.id);

        let address = member.address();
        self.cache.remove_by_address(&address);

        info!(member = %member.id, %address, "member left");
        self.events
            .publish(ClusterEvent::EndpointTerminated { address });

        if self.is_leader_in(state) {
            if let Some(sink) = &self.banned_sink {
                sink.push_banned_members(state.banned.clone()).await;
            }
        }
    }

    fn member_join(&self, state: &mut RegistryState, member: Member) {
        state.members.insert(member.id.clone(), member.clone());

        for kind in &member.kinds {
            state
                .strategies
                .entry(kind.clone())
                .or_insert_with(|| (self.strategy_factory)(kind))
                .add_member(member.clone());
        }

        // A reused address from a prior incarnation must not retain old
        // cached routing.
        self.cache.remove_by_address(&member.address());

        info!(member = %member.id, address = %member.address(), "member joined");
    }

    // =========================================================================
    // Leader
    // =========================================================================

    /// Record a leader notification
    ///
    /// The banned set is merged unconditionally. A notification naming the
    /// already-recorded leader is a no-op (polling-based discovery backends
    /// deliver duplicates); otherwise the leader record is replaced and a
    /// leader-elected event published.
    pub async fn update_leader(&self, leader: LeaderInfo) {
        let mut state = self.state.write().await;

        state
            .banned
            .extend(leader.banned_members.iter().cloned());

        if state
            .leader
            .as_ref()
            .is_some_and(|l| l.member_id == leader.member_id)
        {
            debug!(leader = %leader.member_id, "duplicate leader notification ignored");
            return;
        }

        let old = state.leader.replace(leader.clone());

        info!(leader = %leader.member_id, "leader updated");
        if leader.member_id == self.local.id {
            info!("local member is now cluster leader");
        }

        self.events.publish(ClusterEvent::LeaderElected { new: leader, old });
    }

    /// Check whether the local member is the recorded leader
    pub async fn is_leader(&self) -> bool {
        let state = self.state.read().await;
        self.is_leader_in(&state)
    }

    fn is_leader_in(&self, state: &RegistryState) -> bool {
        state
            .leader
            .as_ref()
            .is_some_and(|l| l.member_id == self.local.id)
    }

    /// The currently recorded leader, if any
    pub async fn leader(&self) -> Option<LeaderInfo> {
        self.state.read().await.leader.clone()
    }

    // =========================================================================
    // Lookup
    // =========================================================================

    /// Address chosen by `kind`'s strategy to host a new instance
    ///
    /// Empty when no strategy (no members) exists for that kind.
    pub async fn activator_for_kind(&self, kind: &str) -> Option<MemberAddress> {
        let state = self.state.read().await;
        state.strategies.get(kind).and_then(|s| s.activator())
    }

    /// Deterministic owner of `identity` under the current membership view
    pub async fn owner_for(&self, identity: &ClusterIdentity) -> Option<MemberAddress> {
        let state = self.state.read().await;
        state
            .strategies
            .get(identity.kind())
            .and_then(|s| s.owner_for(identity.identity()))
    }

    /// Snapshot of the current members
    pub async fn members(&self) -> Vec<Member> {
        self.state.read().await.members.values().cloned().collect()
    }

    /// Number of current members
    pub async fn member_count(&self) -> usize {
        self.state.read().await.members.len()
    }

    /// Snapshot of the banned member ids
    pub async fn banned_members(&self) -> HashSet<MemberId> {
        self.state.read().await.banned.clone()
    }

    // =========================================================================
    // Broadcast
    // =========================================================================

    /// Send `payload` to the well-known event-stream actor on every member
    ///
    /// Best-effort: no acknowledgment, no retry; send failures are logged
    /// and skipped.
    pub async fn broadcast(&self, payload: Bytes) {
        let addresses: Vec<MemberAddress> = {
            let state = self.state.read().await;
            state.members.values().map(|m| m.address()).collect()
        };

        for address in addresses {
            let target = ActorLocation::new(address, EVENT_STREAM_ACTOR_NAME);
            let message = RemoteMessage::Event {
                payload: payload.clone(),
            };
            if let Err(error) = self.remoting.send(&target, message).await {
                debug!(%target, %error, "broadcast send failed");
            }
        }
    }
}
