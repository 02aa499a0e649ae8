//! Remote-location cache
//!
//! Client-side resolution caches identity→location so repeat lookups skip
//! the partition owner. The registry purges entries by member address on
//! both leave (the actors are gone) and join (a reused address from a prior
//! incarnation must not retain old routes).

use shoal_core::identity::ClusterIdentity;
use shoal_core::member::{ActorLocation, MemberAddress};
use std::collections::HashMap;
use std::sync::RwLock;
use tracing::debug;

/// Cross-kind cache of resolved actor locations
///
/// Lookup-heavy and synchronous; interior mutability via `std::sync::RwLock`.
#[derive(Debug, Default)]
pub struct LocationCache {
    entries: RwLock<HashMap<ClusterIdentity, ActorLocation>>,
}

impl LocationCache {
    /// Create an empty cache
    pub fn new() -> Self {
        Self::default()
    }

    /// Cache a resolved location
    pub fn insert(&self, identity: ClusterIdentity, location: ActorLocation) {
        self.entries
            .write()
            .expect("location cache lock poisoned")
            .insert(identity, location);
    }

    /// Look up a cached location
    pub fn get(&self, identity: &ClusterIdentity) -> Option<ActorLocation> {
        self.entries
            .read()
            .expect("location cache lock poisoned")
            .get(identity)
            .cloned()
    }

    /// Drop the entry for one identity
    pub fn remove(&self, identity: &ClusterIdentity) {
        self.entries
            .write()
            .expect("location cache lock poisoned")
            .remove(identity);
    }

    /// Drop every entry located at `address`
    pub fn remove_by_address(&self, address: &MemberAddress) {
        let mut entries = self.entries.write().expect("location cache lock poisoned");
        let before = entries.len();
        entries.retain(|_, location| &location.address != address);
        let purged = before - entries.len();
        if purged > 0 {
            debug!(%address, purged, "purged cached locations for address");
        }
    }

    /// Number of cached entries
    pub fn len(&self) -> usize {
        self.entries
            .read()
            .expect("location cache lock poisoned")
            .len()
    }

    /// Check whether the cache is empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identity(name: &str) -> ClusterIdentity {
        ClusterIdentity::new("greeter", name).unwrap()
    }

    fn location(port: u16, actor: &str) -> ActorLocation {
        ActorLocation::new(MemberAddress::new("127.0.0.1", port), actor)
    }

    #[test]
    fn test_insert_get_remove() {
        let cache = LocationCache::new();
        assert!(cache.is_empty());

        cache.insert(identity("alice"), location(8000, "alice#1"));
        assert_eq!(cache.get(&identity("alice")), Some(location(8000, "alice#1")));

        cache.remove(&identity("alice"));
        assert!(cache.get(&identity("alice")).is_none());
    }

    #[test]
    fn test_remove_by_address_only_purges_that_address() {
        let cache = LocationCache::new();
        cache.insert(identity("alice"), location(8000, "alice#1"));
        cache.insert(identity("bob"), location(8001, "bob#1"));

        cache.remove_by_address(&MemberAddress::new("127.0.0.1", 8000));

        assert!(cache.get(&identity("alice")).is_none());
        assert_eq!(cache.get(&identity("bob")), Some(location(8001, "bob#1")));
        assert_eq!(cache.len(), 1);
    }
}
