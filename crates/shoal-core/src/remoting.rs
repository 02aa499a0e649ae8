//! Remoting seam
//!
//! The transport that carries messages between cluster members is an
//! external collaborator; this trait is the opaque primitive Shoal consumes.

use crate::error::Result;
use crate::identity::ClusterIdentity;
use crate::member::{ActorLocation, MemberAddress};
use crate::messages::{RemoteMessage, SpawnOutcome};
use async_trait::async_trait;
use std::time::Duration;

/// Opaque "send message to remote actor" primitive
///
/// Implementations own connection management, encoding, and delivery. A
/// `send` is fire-and-forget from the caller's perspective: an `Ok` means
/// handed to the transport, not acknowledged by the peer.
#[async_trait]
pub trait Remoting: Send + Sync {
    /// Send a message to the actor at `target`
    async fn send(&self, target: &ActorLocation, message: RemoteMessage) -> Result<()>;

    /// Ask `activator` to spawn the actor named by `identity`
    ///
    /// The transport enforces `timeout` and reports expiry as
    /// [`SpawnOutcome::Timeout`]; no cancellation signal is sent to the
    /// activator, so the remote spawn may still complete and its result is
    /// discarded by the caller's re-check logic.
    async fn spawn_remote(
        &self,
        activator: &MemberAddress,
        identity: &ClusterIdentity,
        timeout: Duration,
    ) -> SpawnOutcome;
}
