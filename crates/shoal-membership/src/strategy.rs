//! Member strategies
//!
//! One strategy instance per kind tracks which members currently host that
//! kind, selects an activator for new instances, and answers the placement
//! question for identities of that kind. Strategies are pure in-memory
//! policy objects; all mutation happens under the registry's writer lock.

use crate::placement::RendezvousHasher;
use shoal_core::member::{Member, MemberAddress, MemberId};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Per-kind member tracking and activator selection
pub trait MemberStrategy: Send + Sync {
    /// Register a member hosting this kind
    ///
    /// Re-adding a member id replaces the previous descriptor (a reused id
    /// from a new incarnation must not retain stale host/port data).
    fn add_member(&mut self, member: Member);

    /// Remove a member by id
    fn remove_member(&mut self, id: &MemberId);

    /// Members currently hosting this kind
    fn members(&self) -> &[Member];

    /// Select a member to host a new instance of this kind
    fn activator(&self) -> Option<MemberAddress>;

    /// Deterministic owner of `identity` among the current members
    fn owner_for(&self, identity: &str) -> Option<MemberAddress> {
        RendezvousHasher::owner_for(self.members(), identity)
    }
}

/// Factory producing the strategy for a kind, supplied by the embedder
pub type StrategyFactory = Arc<dyn Fn(&str) -> Box<dyn MemberStrategy> + Send + Sync>;

/// Factory producing a [`RoundRobinStrategy`] per kind
pub fn round_robin_factory() -> StrategyFactory {
    Arc::new(|_kind| Box::new(RoundRobinStrategy::new()))
}

/// Round-robin activator selection
///
/// Activations cycle across members; placement still uses rendezvous
/// hashing so ownership is stable under a fixed membership view.
#[derive(Debug, Default)]
pub struct RoundRobinStrategy {
    members: Vec<Member>,
    /// Next activator index; atomic so selection works under a read lock
    next: AtomicUsize,
}

impl RoundRobinStrategy {
    /// Create an empty strategy
    pub fn new() -> Self {
        Self::default()
    }
}

impl MemberStrategy for RoundRobinStrategy {
    fn add_member(&mut self, member: Member) {
        self.members.retain(|m| m.id != member.id);
        self.members.push(member);
    }

    fn remove_member(&mut self, id: &MemberId) {
        self.members.retain(|m| &m.id != id);
    }

    fn members(&self) -> &[Member] {
        &self.members
    }

    fn activator(&self) -> Option<MemberAddress> {
        if self.members.is_empty() {
            return None;
        }

        let index = self.next.fetch_add(1, Ordering::Relaxed) % self.members.len();
        Some(self.members[index].address())
    }
}
