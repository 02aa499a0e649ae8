//! Partition router
//!
//! Pure resolution of a member's partition owner for a kind. The owner
//! actor lives under a deterministic well-known name, so resolution cannot
//! fail for members present in the membership view.

use shoal_core::constants::PARTITION_ACTOR_NAME_PREFIX;
use shoal_core::member::{ActorLocation, MemberAddress};

/// Resolves partition owner addresses
pub struct PartitionRouter;

impl PartitionRouter {
    /// Well-known actor name of the partition owner for `kind`
    pub fn actor_name(kind: &str) -> String {
        debug_assert!(!kind.is_empty(), "kind must not be empty");
        format!("{}{}", PARTITION_ACTOR_NAME_PREFIX, kind)
    }

    /// Location of `address`'s partition owner for `kind`
    pub fn remote_partition(address: &MemberAddress, kind: &str) -> ActorLocation {
        ActorLocation::new(address.clone(), Self::actor_name(kind))
    }
}
