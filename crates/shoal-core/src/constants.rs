//! TigerStyle constants for Shoal
//!
//! All limits are explicit, use big-endian naming (most significant first),
//! and include units in the name.

// =============================================================================
// Identity Limits
// =============================================================================

/// Maximum length of an actor identity in bytes
pub const IDENTITY_LENGTH_BYTES_MAX: usize = 256;

/// Maximum length of an actor kind name in bytes
pub const KIND_LENGTH_BYTES_MAX: usize = 128;

/// Maximum length of a member ID in bytes
pub const MEMBER_ID_LENGTH_BYTES_MAX: usize = 128;

// =============================================================================
// Cluster Limits
// =============================================================================

/// Maximum number of members in a cluster
pub const CLUSTER_MEMBERS_COUNT_MAX: usize = 1000;

/// Maximum number of kinds a single member may serve
pub const MEMBER_KINDS_COUNT_MAX: usize = 256;

// =============================================================================
// Partition Limits
// =============================================================================

/// Default remote spawn timeout in milliseconds (5 sec)
pub const SPAWN_TIMEOUT_MS_DEFAULT: u64 = 5 * 1000;

/// Maximum remote spawn timeout in milliseconds (2 min)
pub const SPAWN_TIMEOUT_MS_MAX: u64 = 2 * 60 * 1000;

/// Default partition owner mailbox capacity
pub const PARTITION_MAILBOX_DEPTH_DEFAULT: usize = 1024;

/// Maximum partition owner mailbox capacity
pub const PARTITION_MAILBOX_DEPTH_MAX: usize = 10_000;

/// Well-known actor name prefix for partition owners ("partition-{kind}")
pub const PARTITION_ACTOR_NAME_PREFIX: &str = "partition-";

// =============================================================================
// Registry Limits
// =============================================================================

/// Default lock acquisition attempt timeout in milliseconds (1 sec)
pub const LOCK_ATTEMPT_TIMEOUT_MS_DEFAULT: u64 = 1000;

/// Default backoff between failed lock acquisition attempts in milliseconds
pub const LOCK_RETRY_BACKOFF_MS_DEFAULT: u64 = 10;

/// Default capacity of the cluster event stream
pub const EVENT_STREAM_CAPACITY_DEFAULT: usize = 128;

/// Well-known actor name that receives broadcast events on every member
pub const EVENT_STREAM_ACTOR_NAME: &str = "eventstream";

// Compile-time assertions for constant validity
const _: () = {
    assert!(IDENTITY_LENGTH_BYTES_MAX >= 64);
    assert!(KIND_LENGTH_BYTES_MAX >= 32);
    assert!(CLUSTER_MEMBERS_COUNT_MAX >= 1);
    assert!(SPAWN_TIMEOUT_MS_DEFAULT <= SPAWN_TIMEOUT_MS_MAX);
    assert!(PARTITION_MAILBOX_DEPTH_DEFAULT <= PARTITION_MAILBOX_DEPTH_MAX);
    assert!(LOCK_ATTEMPT_TIMEOUT_MS_DEFAULT > 0);
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_limits_have_units_in_names() {
        // Documents the naming convention: byte limits end in _BYTES_,
        // time limits in _MS_, count limits in _COUNT_ / _DEPTH_.
        let _: usize = IDENTITY_LENGTH_BYTES_MAX;
        let _: u64 = SPAWN_TIMEOUT_MS_DEFAULT;
        let _: usize = CLUSTER_MEMBERS_COUNT_MAX;
    }

    #[test]
    fn test_partition_actor_name_prefix() {
        assert!(PARTITION_ACTOR_NAME_PREFIX.ends_with('-'));
    }
}
